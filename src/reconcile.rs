//! Contact and conversation reconciliation
//!
//! Get-or-create with idempotent retries: both reconcilers search before
//! creating, and both apply the fallback identity policy on remote failure:
//! a synthesized id keeps the pipeline moving so the inbound message surfaces
//! somewhere visible instead of being dropped.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::chatwoot::{ChatwootApi, NewContact, NewConversation};
use crate::identity::{IdentityCache, Resolution, SyntheticIds};
use crate::vk::VkUser;

/// Prefix for deterministic Chatwoot contact identifiers
const IDENTIFIER_PREFIX: &str = "vk";

/// Deterministic Chatwoot identifier for a VK user id
#[must_use]
pub fn contact_identifier(user_id: i64) -> String {
    format!("{IDENTIFIER_PREFIX}_{user_id}")
}

/// Placeholder email required by the Chatwoot contact schema
#[must_use]
pub fn placeholder_email(user_id: i64) -> String {
    format!("{IDENTIFIER_PREFIX}_{user_id}@vk.invalid")
}

/// Resolves VK users to stable Chatwoot contact ids
pub struct ContactReconciler {
    api: Arc<dyn ChatwootApi>,
    cache: Arc<IdentityCache>,
    synthetic: SyntheticIds,
    inbox_id: i64,
}

impl ContactReconciler {
    /// Create a reconciler over a Chatwoot API and a shared identity cache
    #[must_use]
    pub fn new(api: Arc<dyn ChatwootApi>, cache: Arc<IdentityCache>, inbox_id: i64) -> Self {
        Self {
            api,
            cache,
            synthetic: SyntheticIds::new(),
            inbox_id,
        }
    }

    /// The identity cache backing this reconciler
    #[must_use]
    pub fn cache(&self) -> Arc<IdentityCache> {
        self.cache.clone()
    }

    /// Resolve a VK user to a Chatwoot contact id
    ///
    /// Cache hits return immediately with no network call. On a miss the
    /// reconciler searches by deterministic identifier, creates the contact
    /// if absent, and caches the result. Remote failures yield a
    /// `Synthesized` placeholder instead of an error. Concurrent first-time
    /// resolutions for the same user coalesce behind a per-key lock.
    pub async fn resolve_contact(&self, user: &VkUser) -> Resolution {
        if let Some(cached) = self.cache.get(user.id).await {
            return cached;
        }

        let lock = self.cache.key_lock(user.id).await;
        let _guard = lock.lock().await;

        // A concurrent leader may have populated the cache while we waited
        if let Some(cached) = self.cache.get(user.id).await {
            return cached;
        }

        let resolution = self.resolve_remote(user).await;
        self.cache.insert(user.id, resolution).await;
        resolution
    }

    /// Search-then-create against Chatwoot, falling back to a synthesized id
    async fn resolve_remote(&self, user: &VkUser) -> Resolution {
        let identifier = contact_identifier(user.id);

        match self.api.search_contact(&identifier).await {
            Ok(Some(existing)) => {
                tracing::debug!(
                    vk_user_id = user.id,
                    contact_id = existing.id,
                    "matched existing contact"
                );
                return Resolution::Resolved(existing.id);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(vk_user_id = user.id, error = %e, "contact search failed");
                return Resolution::Synthesized(self.synthetic.next());
            }
        }

        let new_contact = NewContact {
            inbox_id: self.inbox_id,
            name: user.display_name.clone(),
            email: placeholder_email(user.id),
            identifier,
            custom_attributes: json!({
                "vk_user_id": user.id,
                "vk_profile_url": user.profile_url,
            }),
        };

        match self.api.create_contact(&new_contact).await {
            Ok(contact) => {
                tracing::info!(
                    vk_user_id = user.id,
                    contact_id = contact.id,
                    "contact created"
                );
                Resolution::Resolved(contact.id)
            }
            Err(e) => {
                tracing::error!(vk_user_id = user.id, error = %e, "contact create failed");
                Resolution::Synthesized(self.synthetic.next())
            }
        }
    }
}

/// Resolves a contact to its open conversation within an inbox
pub struct ConversationReconciler {
    api: Arc<dyn ChatwootApi>,
    synthetic: SyntheticIds,
}

impl ConversationReconciler {
    /// Create a reconciler over a Chatwoot API
    #[must_use]
    pub fn new(api: Arc<dyn ChatwootApi>) -> Self {
        Self {
            api,
            synthetic: SyntheticIds::new(),
        }
    }

    /// Resolve the open conversation for a contact, creating one if needed
    ///
    /// When the search returns several open conversations the lowest id wins,
    /// which is stable across repeated calls regardless of server-side result
    /// ordering. Remote failures yield a `Synthesized` placeholder.
    pub async fn resolve_conversation(
        &self,
        contact_id: i64,
        inbox_id: i64,
        user: &VkUser,
    ) -> Resolution {
        match self.api.list_open_conversations(inbox_id, contact_id).await {
            Ok(conversations) => {
                if let Some(id) = conversations.iter().map(|c| c.id).min() {
                    tracing::debug!(contact_id, conversation_id = id, "matched open conversation");
                    return Resolution::Resolved(id);
                }
            }
            Err(e) => {
                tracing::error!(contact_id, error = %e, "conversation search failed");
                return Resolution::Synthesized(self.synthetic.next());
            }
        }

        let new_conversation = NewConversation {
            source_id: conversation_source_id(user.id),
            inbox_id,
            contact_id,
            status: "open".to_string(),
        };

        match self.api.create_conversation(&new_conversation).await {
            Ok(conversation) => {
                tracing::info!(
                    contact_id,
                    conversation_id = conversation.id,
                    "conversation created"
                );
                Resolution::Resolved(conversation.id)
            }
            Err(e) => {
                tracing::error!(contact_id, error = %e, "conversation create failed");
                Resolution::Synthesized(self.synthetic.next())
            }
        }
    }
}

/// Uniqueness-guaranteeing source id for a new conversation
///
/// Chatwoot dedups conversations on `source_id`, so the VK user id alone
/// would collide with the user's earlier (resolved) conversations; the
/// creation timestamp keeps each new conversation distinct.
fn conversation_source_id(user_id: i64) -> String {
    format!("{IDENTIFIER_PREFIX}_{user_id}_{}", Utc::now().timestamp_millis())
}
