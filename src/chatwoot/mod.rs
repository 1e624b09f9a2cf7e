//! Chatwoot API client
//!
//! Thin client over the Chatwoot account-scoped REST API. The [`ChatwootApi`]
//! trait is the seam the reconcilers depend on; tests substitute a recording
//! mock, production uses [`ChatwootClient`].

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

pub use types::{
    Contact, ContactCreateResponse, ContactSearchResponse, Conversation,
    ConversationListResponse, Message, NewContact, NewConversation, NewMessage,
};

use crate::config::ChatwootConfig;
use crate::{Error, Result};

/// Chatwoot operations the bridge depends on
#[async_trait]
pub trait ChatwootApi: Send + Sync {
    /// Search contacts by deterministic identifier; returns the first match
    async fn search_contact(&self, identifier: &str) -> Result<Option<Contact>>;

    /// Create a contact
    async fn create_contact(&self, contact: &NewContact) -> Result<Contact>;

    /// List open conversations for a contact within an inbox
    async fn list_open_conversations(
        &self,
        inbox_id: i64,
        contact_id: i64,
    ) -> Result<Vec<Conversation>>;

    /// Create a conversation
    async fn create_conversation(&self, conversation: &NewConversation) -> Result<Conversation>;

    /// Post an incoming message to a conversation
    async fn create_message(&self, conversation_id: i64, content: &str) -> Result<Message>;
}

/// HTTP client for a Chatwoot installation
pub struct ChatwootClient {
    base_url: String,
    account_id: i64,
    access_token: String,
    client: Client,
}

impl ChatwootClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ChatwootConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            account_id: config.account_id,
            access_token: config.access_token.clone(),
            client,
        })
    }

    /// Build an account-scoped API URL
    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/accounts/{}{path}",
            self.base_url, self.account_id
        )
    }

    /// Read a failed response into a `Remote` error with full context
    async fn remote_error(endpoint: &str, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::remote(endpoint, status, body)
    }
}

#[async_trait]
impl ChatwootApi for ChatwootClient {
    async fn search_contact(&self, identifier: &str) -> Result<Option<Contact>> {
        let endpoint = self.url("/contacts/search");

        let response = self
            .client
            .get(&endpoint)
            .header("api_access_token", &self.access_token)
            .query(&[("q", identifier)])
            .send()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        if !response.status().is_success() {
            return Err(Self::remote_error(&endpoint, response).await);
        }

        let search: ContactSearchResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        // A stale search index can return contacts whose identifier no longer
        // matches; filter on the exact identifier before trusting a hit
        Ok(search
            .payload
            .into_iter()
            .find(|c| c.identifier.as_deref() == Some(identifier)))
    }

    async fn create_contact(&self, contact: &NewContact) -> Result<Contact> {
        let endpoint = self.url("/contacts");

        let response = self
            .client
            .post(&endpoint)
            .header("api_access_token", &self.access_token)
            .json(contact)
            .send()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        if !response.status().is_success() {
            return Err(Self::remote_error(&endpoint, response).await);
        }

        let created: ContactCreateResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        tracing::debug!(
            contact_id = created.payload.contact.id,
            identifier = %contact.identifier,
            "Chatwoot contact created"
        );

        Ok(created.payload.contact)
    }

    async fn list_open_conversations(
        &self,
        inbox_id: i64,
        contact_id: i64,
    ) -> Result<Vec<Conversation>> {
        let endpoint = self.url("/conversations");

        let response = self
            .client
            .get(&endpoint)
            .header("api_access_token", &self.access_token)
            .query(&[
                ("inbox_id", inbox_id.to_string()),
                ("contact_id", contact_id.to_string()),
                ("status", "open".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        if !response.status().is_success() {
            return Err(Self::remote_error(&endpoint, response).await);
        }

        let list: ConversationListResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        Ok(list.data.payload)
    }

    async fn create_conversation(&self, conversation: &NewConversation) -> Result<Conversation> {
        let endpoint = self.url("/conversations");

        let response = self
            .client
            .post(&endpoint)
            .header("api_access_token", &self.access_token)
            .json(conversation)
            .send()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        if !response.status().is_success() {
            return Err(Self::remote_error(&endpoint, response).await);
        }

        let created: Conversation = response
            .json()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        tracing::debug!(
            conversation_id = created.id,
            source_id = %conversation.source_id,
            "Chatwoot conversation created"
        );

        Ok(created)
    }

    async fn create_message(&self, conversation_id: i64, content: &str) -> Result<Message> {
        let endpoint = self.url(&format!("/conversations/{conversation_id}/messages"));

        let request = NewMessage {
            content: content.to_string(),
            message_type: "incoming".to_string(),
        };

        let response = self
            .client
            .post(&endpoint)
            .header("api_access_token", &self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        if !response.status().is_success() {
            return Err(Self::remote_error(&endpoint, response).await);
        }

        let message: Message = response
            .json()
            .await
            .map_err(|e| Error::transport(&endpoint, &e))?;

        tracing::debug!(
            conversation_id,
            message_id = message.id,
            "Chatwoot message delivered"
        );

        Ok(message)
    }
}
