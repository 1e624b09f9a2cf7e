//! Inbound VK Callback API event model
//!
//! VK delivers every event as a `{type, object, group_id, secret}` envelope.
//! The envelope is decoded into a closed tagged enum so dispatch is a single
//! exhaustive match instead of string comparisons scattered around handlers.

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// Raw VK Callback API delivery envelope
///
/// `object` stays untyped here; it is interpreted per event type by
/// [`InboundEvent::from_envelope`]. Unknown fields are tolerated since VK
/// adds envelope fields across API versions.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Event type discriminator (e.g. `message_new`, `confirmation`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Event payload, shape depends on `kind`
    #[serde(default)]
    pub object: Value,

    /// Originating community id
    #[serde(default)]
    pub group_id: Option<i64>,

    /// Shared secret echoed with every delivery (if configured in VK)
    #[serde(default)]
    pub secret: Option<String>,
}

/// A recognized inbound event, classified from the envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// One-time endpoint registration handshake
    Confirmation,
    /// New message from a community member
    MessageNew(InboundMessage),
    /// A community message was replied to (informational)
    MessageReply,
    /// Typing indicator (informational)
    MessageTypingState,
    /// User joined the community (informational)
    GroupJoin,
    /// User left the community (informational)
    GroupLeave,
    /// Any other event type, carrying the raw type string
    Other(String),
}

/// Message payload extracted from a `message_new` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// VK user id of the sender
    #[serde(alias = "user_id")]
    pub from_id: i64,

    /// Message text (may be empty for sticker/attachment-only messages)
    #[serde(default, alias = "body")]
    pub text: String,
}

/// Wrapper used by VK API >= 5.103: `object: {message: {...}, client_info: {...}}`
#[derive(Debug, Deserialize)]
struct MessageWrapper {
    message: InboundMessage,
}

impl InboundEvent {
    /// Classify an envelope into an event
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` when a `message_new` payload does not carry
    /// a decodable message in either the nested (API >= 5.103) or the legacy
    /// flat layout.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        match envelope.kind.as_str() {
            "confirmation" => Ok(Self::Confirmation),
            "message_new" => decode_message(&envelope.object).map(Self::MessageNew),
            "message_reply" => Ok(Self::MessageReply),
            "message_typing_state" => Ok(Self::MessageTypingState),
            "group_join" => Ok(Self::GroupJoin),
            "group_leave" => Ok(Self::GroupLeave),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

/// Decode a `message_new` object, trying the nested layout first and
/// falling back to the legacy flat layout
fn decode_message(object: &Value) -> Result<InboundMessage> {
    if let Ok(wrapper) = serde_json::from_value::<MessageWrapper>(object.clone()) {
        return Ok(wrapper.message);
    }

    serde_json::from_value::<InboundMessage>(object.clone()).map_err(|e| {
        Error::Protocol(format!("message_new object has no decodable message: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).expect("envelope should deserialize")
    }

    #[test]
    fn classifies_confirmation() {
        let env = envelope(json!({"type": "confirmation", "group_id": 1}));
        assert_eq!(
            InboundEvent::from_envelope(&env).unwrap(),
            InboundEvent::Confirmation
        );
    }

    #[test]
    fn decodes_nested_message_layout() {
        let env = envelope(json!({
            "type": "message_new",
            "object": {
                "message": {"from_id": 42, "text": "hello", "peer_id": 42},
                "client_info": {"lang_id": 0}
            },
            "group_id": 7
        }));

        let InboundEvent::MessageNew(msg) = InboundEvent::from_envelope(&env).unwrap() else {
            panic!("expected MessageNew");
        };
        assert_eq!(msg.from_id, 42);
        assert_eq!(msg.text, "hello");
    }

    #[test]
    fn decodes_legacy_flat_message_layout() {
        let env = envelope(json!({
            "type": "message_new",
            "object": {"user_id": 9, "body": "old style"}
        }));

        let InboundEvent::MessageNew(msg) = InboundEvent::from_envelope(&env).unwrap() else {
            panic!("expected MessageNew");
        };
        assert_eq!(msg.from_id, 9);
        assert_eq!(msg.text, "old style");
    }

    #[test]
    fn message_text_defaults_to_empty() {
        let env = envelope(json!({
            "type": "message_new",
            "object": {"message": {"from_id": 3}}
        }));

        let InboundEvent::MessageNew(msg) = InboundEvent::from_envelope(&env).unwrap() else {
            panic!("expected MessageNew");
        };
        assert!(msg.text.is_empty());
    }

    #[test]
    fn malformed_message_object_is_protocol_failure() {
        let env = envelope(json!({
            "type": "message_new",
            "object": {"message": {"text": "no sender"}}
        }));

        assert!(matches!(
            InboundEvent::from_envelope(&env),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn informational_types_classify_without_payload() {
        for (kind, expected) in [
            ("message_reply", InboundEvent::MessageReply),
            ("message_typing_state", InboundEvent::MessageTypingState),
            ("group_join", InboundEvent::GroupJoin),
            ("group_leave", InboundEvent::GroupLeave),
        ] {
            let env = envelope(json!({"type": kind, "object": {}}));
            assert_eq!(InboundEvent::from_envelope(&env).unwrap(), expected);
        }
    }

    #[test]
    fn unknown_type_is_preserved() {
        let env = envelope(json!({"type": "wall_post_new", "object": {}}));
        assert_eq!(
            InboundEvent::from_envelope(&env).unwrap(),
            InboundEvent::Other("wall_post_new".to_string())
        );
    }

    #[test]
    fn envelope_tolerates_unknown_fields() {
        let env = envelope(json!({
            "type": "confirmation",
            "group_id": 1,
            "event_id": "abc123",
            "v": "5.199"
        }));
        assert_eq!(env.kind, "confirmation");
    }
}
