//! Deskbridge - VK community to Chatwoot helpdesk bridge
//!
//! Receives VK Callback API deliveries and mirrors community messages into a
//! Chatwoot inbox as contacts, conversations, and incoming messages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                VK Callback API                      │
//! │    confirmation │ message_new │ informational       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Webhook Dispatcher                    │
//! │  handshake │ secret check │ source check │ routing  │
//! └────────────────────┬────────────────────────────────┘
//!                      │ message_new
//! ┌────────────────────▼────────────────────────────────┐
//! │   Contact → Conversation → Message pipeline         │
//! │   identity cache │ get-or-create │ fallback ids     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Chatwoot REST API                     │
//! │   contacts │ conversations │ incoming messages      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chatwoot;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod forward;
pub mod identity;
pub mod reconcile;
pub mod vk;

pub use config::Config;
pub use dispatch::{ACK, ResponseToken, WebhookDispatcher};
pub use error::{Error, Result};
pub use event::{Envelope, InboundEvent, InboundMessage};
pub use forward::{Forwarded, MessageForwarder};
pub use identity::{IdentityCache, Resolution, SyntheticIds};
pub use reconcile::{ContactReconciler, ConversationReconciler, contact_identifier};
pub use vk::{UserDirectory, VkClient, VkUser};
