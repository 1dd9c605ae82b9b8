use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use syzportal_core::UserId;

use crate::item::NavigationItem;

/// Outcome of evaluating one item in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionResult {
    pub item: Arc<NavigationItem>,
    pub has_access: bool,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PermissionResult {
    pub fn pending(item: Arc<NavigationItem>) -> Self {
        Self {
            item,
            has_access: false,
            loading: true,
            error: None,
        }
    }

    pub fn settled(item: Arc<NavigationItem>, has_access: bool) -> Self {
        Self {
            item,
            has_access,
            loading: false,
            error: None,
        }
    }

    /// Fail-closed result for an item whose evaluation failed.
    pub fn failed(item: Arc<NavigationItem>, error: impl Into<String>) -> Self {
        Self {
            item,
            has_access: false,
            loading: false,
            error: Some(error.into()),
        }
    }
}

/// Snapshot published by a resolver; replaced as a whole on every commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolverState {
    pub items: Vec<PermissionResult>,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub user_id: Option<UserId>,
}

impl ResolverState {
    pub fn result(&self, id: &str) -> Option<&PermissionResult> {
        self.items.iter().find(|r| r.item.id == id)
    }

    pub fn is_item_accessible(&self, id: &str) -> bool {
        self.result(id).is_some_and(|r| r.has_access && !r.loading)
    }

    pub fn is_item_loading(&self, id: &str) -> bool {
        self.result(id).is_some_and(|r| r.loading)
    }

    pub fn item_error(&self, id: &str) -> Option<&str> {
        self.result(id).and_then(|r| r.error.as_deref())
    }

    pub fn accessible_items(&self) -> Vec<Arc<NavigationItem>> {
        self.items
            .iter()
            .filter(|r| r.has_access && !r.loading)
            .map(|r| Arc::clone(&r.item))
            .collect()
    }
}
