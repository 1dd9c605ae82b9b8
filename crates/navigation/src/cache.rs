//! TTL cache of permission decisions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use syzportal_auth::{Action, Resource};
use syzportal_core::UserId;

use crate::item::NavigationItem;

/// Default time-to-live of a cached decision (5 minutes).
pub const DEFAULT_TTL_MS: i64 = 300_000;

/// Structured cache key; components are never concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: UserId,
    pub action: Action,
    pub resource: Resource,
}

impl CacheKey {
    pub fn new(user_id: UserId, action: Action, resource: Resource) -> Self {
        Self {
            user_id,
            action,
            resource,
        }
    }

    pub fn for_item(user_id: &UserId, item: &NavigationItem) -> Self {
        Self::new(
            user_id.clone(),
            item.required_action.clone(),
            item.required_resource.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    allowed: bool,
    stored_at: DateTime<Utc>,
}

/// Shared permission cache.
///
/// Clones share the same map. Stale entries read as misses but stay in the
/// map until [`PermissionCache::clear_expired`] or [`PermissionCache::clear_all`].
#[derive(Debug, Clone)]
pub struct PermissionCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::milliseconds(DEFAULT_TTL_MS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        self.get_at(key, Utc::now())
    }

    /// Lookup as of `now`. Fresh iff `now - stored_at < ttl`.
    pub fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<bool> {
        let entries = self.read();
        let entry = entries.get(key)?;
        if now - entry.stored_at < self.ttl {
            Some(entry.allowed)
        } else {
            None
        }
    }

    pub fn set(&self, key: CacheKey, allowed: bool) {
        self.set_at(key, allowed, Utc::now());
    }

    pub fn set_at(&self, key: CacheKey, allowed: bool, now: DateTime<Utc>) {
        self.write().insert(
            key,
            CacheEntry {
                allowed,
                stored_at: now,
            },
        );
    }

    /// Drop every entry older than the TTL. Returns how many were removed.
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    pub fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.stored_at < ttl);
        before - entries.len()
    }

    pub fn clear_all(&self) {
        let mut entries = self.write();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "permission cache cleared");
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
