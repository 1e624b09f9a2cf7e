//! Configuration management for the deskbridge gateway
//!
//! All service credentials come from the environment. Missing required values
//! are a fatal startup error, never a runtime error.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// Default remote call timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Default VK API version for `users.get` lookups
const DEFAULT_VK_API_VERSION: &str = "5.199";

/// Deskbridge gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chatwoot API settings
    pub chatwoot: ChatwootConfig,

    /// VK Callback API settings
    pub vk: VkConfig,

    /// Timeout applied to every remote call (Chatwoot and VK)
    pub request_timeout: Duration,
}

/// Chatwoot API settings
#[derive(Debug, Clone)]
pub struct ChatwootConfig {
    /// Base URL of the Chatwoot installation (e.g. `https://desk.example.com`)
    pub base_url: String,

    /// Numeric account id the bridge operates in
    pub account_id: i64,

    /// Inbox that receives bridged conversations
    pub inbox_id: i64,

    /// API access token (sent as the `api_access_token` header)
    pub access_token: String,
}

/// VK Callback API settings
#[derive(Debug, Clone)]
pub struct VkConfig {
    /// Token echoed back for the one-time endpoint confirmation handshake
    pub confirmation_token: String,

    /// Shared secret expected in every delivery (optional)
    pub secret: Option<String>,

    /// Community id deliveries must originate from (optional)
    pub group_id: Option<i64>,

    /// Service token for `users.get` display-name lookups (optional;
    /// without it senders get a generic placeholder name)
    pub service_token: Option<String>,

    /// VK API version for `users.get` calls
    pub api_version: String,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing or malformed variable.
    pub fn from_env() -> Result<Self> {
        let chatwoot = ChatwootConfig {
            base_url: required("CHATWOOT_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            account_id: required_i64("CHATWOOT_ACCOUNT_ID")?,
            inbox_id: required_i64("CHATWOOT_INBOX_ID")?,
            access_token: required("CHATWOOT_API_TOKEN")?,
        };

        let vk = VkConfig {
            confirmation_token: required("VK_CONFIRMATION_TOKEN")?,
            secret: optional("VK_SECRET"),
            group_id: optional_i64("VK_GROUP_ID")?,
            service_token: optional("VK_SERVICE_TOKEN"),
            api_version: optional("VK_API_VERSION")
                .unwrap_or_else(|| DEFAULT_VK_API_VERSION.to_string()),
        };

        let request_timeout = match optional("BRIDGE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    Error::Config(format!(
                        "BRIDGE_REQUEST_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            chatwoot,
            vk,
            request_timeout,
        })
    }
}

/// Read a required environment variable, rejecting empty values
fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::Config(format!("{name} is required but not set")))
}

/// Read a required integer environment variable
fn required_i64(name: &str) -> Result<i64> {
    let raw = required(name)?;
    raw.parse()
        .map_err(|_| Error::Config(format!("{name} must be an integer, got {raw:?}")))
}

/// Read an optional environment variable, treating empty as unset
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read an optional integer environment variable
fn optional_i64(name: &str) -> Result<Option<i64>> {
    optional(name)
        .map(|raw| {
            raw.parse()
                .map_err(|_| Error::Config(format!("{name} must be an integer, got {raw:?}")))
        })
        .transpose()
}
