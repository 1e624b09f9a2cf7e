//! Webhook dispatch
//!
//! Validates the inbound envelope (confirmation handshake, shared secret,
//! source community) and routes recognized event types into the
//! reconciliation + forwarding pipeline. The webhook contract never surfaces
//! a downstream failure: every path ends in the acknowledgment token, since a
//! non-200 response would trigger VK redelivery storms with no idempotency
//! key to dedup on.

use std::sync::Arc;

use crate::chatwoot::{ChatwootApi, ChatwootClient};
use crate::config::Config;
use crate::event::{Envelope, InboundEvent, InboundMessage};
use crate::forward::{Forwarded, MessageForwarder};
use crate::identity::IdentityCache;
use crate::reconcile::{ContactReconciler, ConversationReconciler};
use crate::vk::{UserDirectory, VkClient, VkUser};
use crate::{Error, Result};

/// Literal acknowledgment body VK expects on every non-confirmation delivery
pub const ACK: &str = "ok";

/// Plain-text body returned to the webhook caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseToken {
    /// Echo of the configured confirmation token
    Confirmation(String),
    /// Generic acknowledgment
    Acknowledged,
}

impl ResponseToken {
    /// The response body to send
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Confirmation(token) => token,
            Self::Acknowledged => ACK,
        }
    }
}

/// Routes validated webhook events through the bridge pipeline
pub struct WebhookDispatcher {
    confirmation_token: String,
    secret: Option<String>,
    group_id: Option<i64>,
    inbox_id: i64,
    directory: Arc<dyn UserDirectory>,
    contacts: ContactReconciler,
    conversations: ConversationReconciler,
    forwarder: MessageForwarder,
}

impl WebhookDispatcher {
    /// Build a dispatcher with production Chatwoot and VK clients
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api: Arc<dyn ChatwootApi> =
            Arc::new(ChatwootClient::new(&config.chatwoot, config.request_timeout)?);
        let directory: Arc<dyn UserDirectory> =
            Arc::new(VkClient::new(&config.vk, config.request_timeout)?);

        Ok(Self::new(
            api,
            directory,
            config.vk.confirmation_token.clone(),
            config.vk.secret.clone(),
            config.vk.group_id,
            config.chatwoot.inbox_id,
        ))
    }

    /// Build a dispatcher over explicit components (test seam)
    #[must_use]
    pub fn new(
        api: Arc<dyn ChatwootApi>,
        directory: Arc<dyn UserDirectory>,
        confirmation_token: String,
        secret: Option<String>,
        group_id: Option<i64>,
        inbox_id: i64,
    ) -> Self {
        let cache = Arc::new(IdentityCache::new());

        Self {
            confirmation_token,
            secret,
            group_id,
            inbox_id,
            directory,
            contacts: ContactReconciler::new(api.clone(), cache, inbox_id),
            conversations: ConversationReconciler::new(api.clone()),
            forwarder: MessageForwarder::new(api),
        }
    }

    /// Identity cache owned by the contact reconciler (exposed for tests)
    #[must_use]
    pub fn identity_cache(&self) -> Arc<IdentityCache> {
        self.contacts.cache()
    }

    /// Handle one webhook delivery
    ///
    /// The inner pipeline returns `Result` so the never-fail policy is
    /// explicit here at the boundary: any error is logged and collapsed into
    /// the acknowledgment token.
    pub async fn handle(&self, envelope: &Envelope) -> ResponseToken {
        if envelope.kind == "confirmation" {
            tracing::info!(group_id = ?envelope.group_id, "confirmation handshake");
            return ResponseToken::Confirmation(self.confirmation_token.clone());
        }

        if let Err(e) = self.validate(envelope) {
            tracing::warn!(kind = %envelope.kind, error = %e, "dropping event");
            return ResponseToken::Acknowledged;
        }

        if let Err(e) = self.dispatch(envelope).await {
            tracing::error!(kind = %envelope.kind, error = %e, "event processing failed");
        }

        ResponseToken::Acknowledged
    }

    /// Shared-secret and source-community checks
    fn validate(&self, envelope: &Envelope) -> Result<()> {
        if let Some(expected) = self.secret.as_deref() {
            if envelope.secret.as_deref() != Some(expected) {
                return Err(Error::Validation("secret mismatch".to_string()));
            }
        }

        if let (Some(expected), Some(got)) = (self.group_id, envelope.group_id) {
            if expected != got {
                return Err(Error::Validation(format!(
                    "unexpected source community {got}, expected {expected}"
                )));
            }
        }

        Ok(())
    }

    /// Classify and route a validated envelope
    async fn dispatch(&self, envelope: &Envelope) -> Result<()> {
        match InboundEvent::from_envelope(envelope)? {
            InboundEvent::MessageNew(message) => {
                self.process_message(message).await;
            }
            InboundEvent::Confirmation => {
                // Unreachable: handled before validation so the handshake
                // succeeds even when no secret is configured in VK yet
            }
            InboundEvent::MessageReply
            | InboundEvent::MessageTypingState
            | InboundEvent::GroupJoin
            | InboundEvent::GroupLeave => {
                tracing::debug!(kind = %envelope.kind, "informational event");
            }
            InboundEvent::Other(kind) => {
                tracing::debug!(kind = %kind, "unhandled event type");
            }
        }

        Ok(())
    }

    /// Run the reconciliation + forwarding pipeline for one message
    async fn process_message(&self, message: InboundMessage) {
        let name = self.directory.display_name(message.from_id).await;
        let user = VkUser::new(message.from_id, name);

        let contact = self.contacts.resolve_contact(&user).await;
        let conversation = self
            .conversations
            .resolve_conversation(contact.id(), self.inbox_id, &user)
            .await;

        let outcome = self.forwarder.forward(conversation.id(), &message.text).await;

        match outcome {
            Forwarded::Delivered { message_id } => tracing::info!(
                vk_user_id = user.id,
                contact_id = contact.id(),
                conversation_id = conversation.id(),
                message_id,
                contact_synthesized = contact.is_synthesized(),
                conversation_synthesized = conversation.is_synthesized(),
                "message bridged"
            ),
            Forwarded::Skipped => tracing::debug!(
                vk_user_id = user.id,
                "message had no text to forward"
            ),
            Forwarded::Failed => tracing::warn!(
                vk_user_id = user.id,
                contact_id = contact.id(),
                conversation_id = conversation.id(),
                "message not delivered"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_body_is_protocol_literal() {
        assert_eq!(ResponseToken::Acknowledged.body(), "ok");
    }

    #[test]
    fn confirmation_body_echoes_token() {
        let token = ResponseToken::Confirmation("abc123".to_string());
        assert_eq!(token.body(), "abc123");
    }
}
