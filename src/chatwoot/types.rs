//! Chatwoot Platform API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Chatwoot contact
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    /// Contact id
    pub id: i64,
    /// Display name
    pub name: Option<String>,
    /// Deterministic identifier (`vk_<user_id>` for bridged contacts)
    pub identifier: Option<String>,
    /// Email address
    pub email: Option<String>,
}

/// `GET /contacts/search` response
#[derive(Debug, Deserialize)]
pub struct ContactSearchResponse {
    /// Matching contacts
    #[serde(default)]
    pub payload: Vec<Contact>,
}

/// `POST /contacts` response wrapper
#[derive(Debug, Deserialize)]
pub struct ContactCreateResponse {
    /// Created contact payload
    pub payload: ContactCreatePayload,
}

/// Inner payload of a contact-create response
#[derive(Debug, Deserialize)]
pub struct ContactCreatePayload {
    /// The created contact
    pub contact: Contact,
}

/// `POST /contacts` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewContact {
    /// Inbox the contact is created against
    pub inbox_id: i64,
    /// Display name
    pub name: String,
    /// Placeholder email (required by the Chatwoot schema)
    pub email: String,
    /// Deterministic identifier used for dedup searches
    pub identifier: String,
    /// Source-platform attributes (VK user id, profile URL)
    pub custom_attributes: Value,
}

/// A Chatwoot conversation
#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    /// Conversation id
    pub id: i64,
    /// Conversation status (`open`, `resolved`, ...)
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /conversations` response: `{data: {meta, payload}}`
#[derive(Debug, Deserialize)]
pub struct ConversationListResponse {
    /// Data wrapper
    pub data: ConversationListData,
}

/// Inner data of a conversation list response
#[derive(Debug, Deserialize)]
pub struct ConversationListData {
    /// Conversations in the page
    #[serde(default)]
    pub payload: Vec<Conversation>,
}

/// `POST /conversations` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    /// Uniqueness-guaranteeing source id (Chatwoot dedups on this)
    pub source_id: String,
    /// Target inbox
    pub inbox_id: i64,
    /// Owning contact
    pub contact_id: i64,
    /// Initial status
    pub status: String,
}

/// A Chatwoot message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id
    pub id: i64,
}

/// `POST /conversations/{id}/messages` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    /// Message text
    pub content: String,
    /// Direction; bridged messages are always `incoming`
    pub message_type: String,
}
