//! Message forwarding into a resolved conversation

use std::sync::Arc;

use crate::chatwoot::ChatwootApi;

/// Outcome of forwarding one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    /// Message landed; carries the Chatwoot message id
    Delivered {
        /// Id of the created message
        message_id: i64,
    },
    /// Text was empty after trimming; no network call was made
    Skipped,
    /// Remote call failed; logged, not retried
    Failed,
}

/// Posts inbound message text into a Chatwoot conversation
pub struct MessageForwarder {
    api: Arc<dyn ChatwootApi>,
}

impl MessageForwarder {
    /// Create a forwarder over a Chatwoot API
    #[must_use]
    pub fn new(api: Arc<dyn ChatwootApi>) -> Self {
        Self { api }
    }

    /// Forward trimmed message text to a conversation
    ///
    /// Failure here does not roll back contact/conversation creation; those
    /// are intentionally durable even when the message itself fails to land.
    pub async fn forward(&self, conversation_id: i64, text: &str) -> Forwarded {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!(conversation_id, "skipping empty message");
            return Forwarded::Skipped;
        }

        match self.api.create_message(conversation_id, trimmed).await {
            Ok(message) => Forwarded::Delivered {
                message_id: message.id,
            },
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "message forward failed");
                Forwarded::Failed
            }
        }
    }
}
