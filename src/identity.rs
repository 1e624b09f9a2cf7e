//! Identity cache for VK user → Chatwoot contact mappings
//!
//! Process-lifetime only: entries are created on first resolution and never
//! evicted. The cache also hands out per-key locks so concurrent first-time
//! resolutions for the same VK user coalesce into one underlying creation
//! instead of racing to create duplicate contacts.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::Mutex;

/// Outcome of a contact or conversation resolution
///
/// `Resolved` carries a genuine remote id; `Synthesized` carries a
/// locally-allocated placeholder produced by the fallback identity policy
/// when the helpdesk was unreachable. Callers that only need the id can use
/// [`Resolution::id`]; the tag stays available for diagnostics and future
/// backfill logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Id returned by the remote platform
    Resolved(i64),
    /// Locally-synthesized placeholder id
    Synthesized(i64),
}

impl Resolution {
    /// The underlying id, regardless of provenance
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Resolved(id) | Self::Synthesized(id) => id,
        }
    }

    /// Whether this is a fallback placeholder
    #[must_use]
    pub const fn is_synthesized(self) -> bool {
        matches!(self, Self::Synthesized(_))
    }
}

/// Allocator for locally-unique fallback ids
///
/// Ids are negative and strictly decreasing, so they can never collide with
/// Chatwoot's positive ids and are never reused across users.
#[derive(Debug)]
pub struct SyntheticIds {
    next: AtomicI64,
}

impl SyntheticIds {
    /// Create an allocator starting at -1
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicI64::new(-1),
        }
    }

    /// Allocate the next placeholder id
    pub fn next(&self) -> i64 {
        self.next.fetch_sub(1, Ordering::Relaxed)
    }
}

impl Default for SyntheticIds {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory VK user id → contact resolution cache with per-key locks
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: Mutex<HashMap<i64, Resolution>>,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl IdentityCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached resolution
    pub async fn get(&self, user_id: i64) -> Option<Resolution> {
        self.entries.lock().await.get(&user_id).copied()
    }

    /// Record a resolution, overwriting any previous entry for the user
    pub async fn insert(&self, user_id: i64, resolution: Resolution) {
        self.entries.lock().await.insert(user_id, resolution);
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// In-flight lock for a user id
    ///
    /// Resolvers take this lock before any remote call; followers that arrive
    /// while the leader holds it will find the cache populated when they
    /// re-check after acquiring. Lock objects live for the process lifetime,
    /// matching the cache entries they guard.
    pub async fn key_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_inserted_resolution() {
        let cache = IdentityCache::new();
        cache.insert(42, Resolution::Resolved(7)).await;

        assert_eq!(cache.get(42).await, Some(Resolution::Resolved(7)));
        assert_eq!(cache.get(43).await, None);
    }

    #[tokio::test]
    async fn insert_overwrites_previous_entry() {
        let cache = IdentityCache::new();
        cache.insert(1, Resolution::Synthesized(-1)).await;
        cache.insert(1, Resolution::Resolved(10)).await;

        assert_eq!(cache.get(1).await, Some(Resolution::Resolved(10)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn key_lock_is_shared_per_user() {
        let cache = IdentityCache::new();
        let a = cache.key_lock(5).await;
        let b = cache.key_lock(5).await;
        let other = cache.key_lock(6).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn synthetic_ids_are_negative_and_distinct() {
        let ids = SyntheticIds::new();
        let first = ids.next();
        let second = ids.next();

        assert_eq!(first, -1);
        assert_eq!(second, -2);
        assert!(first > second);
    }

    #[test]
    fn resolution_id_ignores_provenance() {
        assert_eq!(Resolution::Resolved(3).id(), 3);
        assert_eq!(Resolution::Synthesized(-2).id(), -2);
        assert!(Resolution::Synthesized(-2).is_synthesized());
        assert!(!Resolution::Resolved(3).is_synthesized());
    }
}
