//! VK source-platform user directory
//!
//! Resolves a numeric VK user id to a display name via `users.get`. Lookups
//! are best-effort: any failure (no token, network error, API error payload)
//! yields a generic placeholder name instead of failing the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::Result;
use crate::config::VkConfig;

const VK_API_BASE: &str = "https://api.vk.com/method";

/// A user on the source platform, as seen by one inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VkUser {
    /// Numeric VK user id
    pub id: i64,
    /// Display name (resolved or placeholder)
    pub display_name: String,
    /// Public profile URL
    pub profile_url: String,
}

impl VkUser {
    /// Build a user from an id and resolved display name
    #[must_use]
    pub fn new(id: i64, display_name: String) -> Self {
        Self {
            id,
            display_name,
            profile_url: profile_url(id),
        }
    }
}

/// Public profile URL for a VK user id
#[must_use]
pub fn profile_url(user_id: i64) -> String {
    format!("https://vk.com/id{user_id}")
}

/// Generic name used when the real one cannot be resolved
#[must_use]
pub fn placeholder_name(user_id: i64) -> String {
    format!("VK user {user_id}")
}

/// Source-platform display-name lookups
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve a display name for a user id; never fails
    async fn display_name(&self, user_id: i64) -> String;
}

/// `users.get` response envelope
#[derive(Debug, Deserialize)]
struct UsersGetResponse {
    #[serde(default)]
    response: Vec<UserRecord>,
}

/// A single user record from `users.get`
#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

/// VK API client for user lookups
pub struct VkClient {
    service_token: Option<String>,
    api_version: String,
    client: Client,
}

impl VkClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &VkConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            service_token: config.service_token.clone(),
            api_version: config.api_version.clone(),
            client,
        })
    }

    /// Call `users.get` and extract a "First Last" name
    async fn fetch_name(&self, user_id: i64, token: &str) -> Option<String> {
        let endpoint = format!("{VK_API_BASE}/users.get");

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("user_ids", user_id.to_string()),
                ("access_token", token.to_string()),
                ("v", self.api_version.clone()),
            ])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(vk_user_id = user_id, status, body = %body, "users.get failed");
            return None;
        }

        let users: UsersGetResponse = response.json().await.ok()?;
        let record = users.response.first()?;

        let name = format!("{} {}", record.first_name, record.last_name)
            .trim()
            .to_string();

        if name.is_empty() { None } else { Some(name) }
    }
}

#[async_trait]
impl UserDirectory for VkClient {
    async fn display_name(&self, user_id: i64) -> String {
        let Some(token) = self.service_token.as_deref() else {
            return placeholder_name(user_id);
        };

        match self.fetch_name(user_id, token).await {
            Some(name) => name,
            None => {
                tracing::debug!(vk_user_id = user_id, "falling back to placeholder name");
                placeholder_name(user_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_url_embeds_user_id() {
        assert_eq!(profile_url(42), "https://vk.com/id42");
    }

    #[test]
    fn placeholder_name_embeds_user_id() {
        assert_eq!(placeholder_name(42), "VK user 42");
    }

    #[test]
    fn vk_user_carries_profile_url() {
        let user = VkUser::new(7, "Ada L".to_string());
        assert_eq!(user.profile_url, "https://vk.com/id7");
        assert_eq!(user.display_name, "Ada L");
    }
}
