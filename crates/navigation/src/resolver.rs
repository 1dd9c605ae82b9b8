//! Per-catalog permission resolver.
//!
//! A pass fans out one evaluation per item, joins them, and commits the
//! whole result set with a single `watch` update. Starting a new pass
//! cancels the previous one; a superseded pass never commits.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

use syzportal_auth::EvaluationRequest;
use syzportal_client::PermissionEvaluator;
use syzportal_core::UserId;

use crate::cache::{CacheKey, PermissionCache};
use crate::item::{Catalog, NavigationItem};
use crate::types::{PermissionResult, ResolverState};

/// Batch error committed when the backend rejects the session mid-pass.
pub const SESSION_EXPIRED: &str = "session expired";

#[derive(Debug, Default)]
struct PassSlot {
    generation: u64,
    token: CancellationToken,
    user_id: Option<UserId>,
}

struct ItemOutcome {
    result: PermissionResult,
    unauthenticated: bool,
}

pub struct NavigationResolver {
    name: String,
    evaluator: Arc<dyn PermissionEvaluator>,
    cache: PermissionCache,
    items: Catalog,
    state: watch::Sender<ResolverState>,
    slot: Mutex<PassSlot>,
}

impl std::fmt::Debug for NavigationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationResolver")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl NavigationResolver {
    pub fn new(
        name: impl Into<String>,
        evaluator: Arc<dyn PermissionEvaluator>,
        cache: PermissionCache,
        items: Catalog,
    ) -> Self {
        let (state, _) = watch::channel(ResolverState::default());
        Self {
            name: name.into(),
            evaluator,
            cache,
            items,
            state,
            slot: Mutex::new(PassSlot::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &Catalog {
        &self.items
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Current committed (or loading) snapshot.
    pub fn state(&self) -> ResolverState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolverState> {
        self.state.subscribe()
    }

    /// Evaluate the catalog for `user_id`.
    ///
    /// Returns the committed state immediately when the last pass for the
    /// same user is still within the cache TTL.
    pub async fn resolve(&self, user_id: Option<UserId>) -> ResolverState {
        self.run(user_id, false).await
    }

    /// Re-run the pass for the current user, skipping the whole-pass
    /// shortcut. Per-item cache entries are still honoured.
    pub async fn refresh_permissions(&self) -> ResolverState {
        let user_id = self.lock_slot().user_id.clone();
        self.run(user_id, true).await
    }

    pub fn is_item_accessible(&self, id: &str) -> bool {
        self.state.borrow().is_item_accessible(id)
    }

    pub fn is_item_loading(&self, id: &str) -> bool {
        self.state.borrow().is_item_loading(id)
    }

    pub fn get_item_error(&self, id: &str) -> Option<String> {
        self.state.borrow().item_error(id).map(str::to_string)
    }

    pub fn accessible_items(&self) -> Vec<Arc<NavigationItem>> {
        self.state.borrow().accessible_items()
    }

    pub fn clear_cache(&self) {
        self.cache.clear_all();
    }

    /// Cancel any in-flight pass and publish the empty state.
    pub fn reset(&self) {
        let mut slot = self.lock_slot();
        Self::supersede(&mut slot);
        slot.user_id = None;
        self.state.send_replace(ResolverState::default());
    }

    /// Cancel any in-flight pass; its results are discarded.
    pub fn dispose(&self) {
        let mut slot = self.lock_slot();
        Self::supersede(&mut slot);
        tracing::debug!(resolver = %self.name, "resolver disposed");
    }

    async fn run(&self, user_id: Option<UserId>, forced: bool) -> ResolverState {
        let Some(user_id) = user_id.filter(|_| !self.items.is_empty()) else {
            self.reset();
            return self.state();
        };

        if !forced && self.is_fresh_for(&user_id) {
            tracing::debug!(resolver = %self.name, user_id = %user_id, "reusing recent pass");
            return self.state();
        }

        self.pass(user_id, forced).await
    }

    fn is_fresh_for(&self, user_id: &UserId) -> bool {
        let state = self.state.borrow();
        match state.last_updated {
            Some(at) => {
                state.user_id.as_ref() == Some(user_id)
                    && !state.loading
                    && state.error.is_none()
                    && Utc::now() - at < self.cache.ttl()
            }
            None => false,
        }
    }

    #[instrument(
        name = "navigation_pass",
        skip(self, user_id),
        fields(resolver = %self.name, pass_id = %Uuid::now_v7(), user_id = %user_id)
    )]
    async fn pass(&self, user_id: UserId, forced: bool) -> ResolverState {
        let (generation, token) = self.begin(&user_id);
        let expired = self.cache.clear_expired();
        tracing::debug!(generation, expired, items = self.items.len(), "pass started");

        let evaluations = self
            .items
            .iter()
            .map(|item| self.evaluate_item(&user_id, item));

        let outcomes = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            outcomes = join_all(evaluations) => Some(outcomes),
        };

        match outcomes {
            Some(outcomes) => self.commit(generation, &token, user_id, outcomes),
            None => {
                tracing::warn!(generation, "pass superseded before completion");
                self.state()
            }
        }
    }

    /// Supersede the previous pass and publish the loading snapshot.
    fn begin(&self, user_id: &UserId) -> (u64, CancellationToken) {
        let mut slot = self.lock_slot();
        Self::supersede(&mut slot);
        slot.user_id = Some(user_id.clone());

        let previous = self.state.borrow().last_updated;
        self.state.send_replace(ResolverState {
            items: self
                .items
                .iter()
                .map(|item| PermissionResult::pending(Arc::clone(item)))
                .collect(),
            loading: true,
            error: None,
            last_updated: previous,
            user_id: Some(user_id.clone()),
        });
        (slot.generation, slot.token.clone())
    }

    fn commit(
        &self,
        generation: u64,
        token: &CancellationToken,
        user_id: UserId,
        outcomes: Vec<ItemOutcome>,
    ) -> ResolverState {
        let slot = self.lock_slot();
        if slot.generation != generation || token.is_cancelled() {
            tracing::warn!(generation, current = slot.generation, "discarding superseded pass");
            return self.state.borrow().clone();
        }

        // Items rejected for an expired session are already failed closed.
        let session_expired = outcomes.iter().any(|o| o.unauthenticated);
        let items: Vec<PermissionResult> = outcomes.into_iter().map(|o| o.result).collect();
        let state = if session_expired {
            tracing::warn!("evaluation rejected the session; denying rejected items");
            ResolverState {
                items,
                loading: false,
                error: Some(SESSION_EXPIRED.to_string()),
                last_updated: self.state.borrow().last_updated,
                user_id: Some(user_id),
            }
        } else {
            ResolverState {
                items,
                loading: false,
                error: None,
                last_updated: Some(Utc::now()),
                user_id: Some(user_id),
            }
        };

        let granted = state.items.iter().filter(|r| r.has_access).count();
        tracing::debug!(generation, granted, total = state.items.len(), "pass committed");
        self.state.send_replace(state.clone());
        state
    }

    async fn evaluate_item(&self, user_id: &UserId, item: &Arc<NavigationItem>) -> ItemOutcome {
        let item = Arc::clone(item);
        if item.always_accessible {
            return ItemOutcome {
                result: PermissionResult::settled(item, true),
                unauthenticated: false,
            };
        }

        let key = CacheKey::for_item(user_id, &item);
        if let Some(allowed) = self.cache.get(&key) {
            tracing::debug!(item = %item.id, allowed, "cache hit");
            return ItemOutcome {
                result: PermissionResult::settled(item, allowed),
                unauthenticated: false,
            };
        }

        let request = EvaluationRequest::new(
            user_id.clone(),
            item.required_action.clone(),
            item.required_resource.clone(),
        );
        match self.evaluator.evaluate(&request).await {
            Ok(evaluation) => {
                tracing::debug!(
                    item = %item.id,
                    allowed = evaluation.allowed,
                    "cache miss evaluated"
                );
                self.cache.set(key, evaluation.allowed);
                ItemOutcome {
                    result: PermissionResult::settled(item, evaluation.allowed),
                    unauthenticated: false,
                }
            }
            Err(err) => {
                tracing::warn!(
                    item = %item.id,
                    error = %err,
                    "permission evaluation failed; denying"
                );
                ItemOutcome {
                    unauthenticated: err.is_unauthenticated(),
                    result: PermissionResult::failed(item, err.to_string()),
                }
            }
        }
    }

    fn supersede(slot: &mut PassSlot) {
        slot.token.cancel();
        slot.token = CancellationToken::new();
        slot.generation += 1;
    }

    fn lock_slot(&self) -> MutexGuard<'_, PassSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for NavigationResolver {
    fn drop(&mut self) {
        self.lock_slot().token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use syzportal_auth::{Action, Resource, ResourceKind};
    use syzportal_client::InMemoryPermissionEvaluator;

    use super::*;
    use crate::item::{navigation_items, user_menu_items};

    fn user(raw: &str) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn resolver(evaluator: Arc<InMemoryPermissionEvaluator>, items: Catalog) -> NavigationResolver {
        NavigationResolver::new("test", evaluator, PermissionCache::new(), items)
    }

    #[tokio::test]
    async fn empty_user_yields_empty_state_without_calls() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        let resolver = resolver(evaluator.clone(), navigation_items());

        let state = resolver.resolve(None).await;
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn empty_catalog_yields_empty_state_without_calls() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        let resolver = resolver(evaluator.clone(), Arc::from(Vec::new()));

        let state = resolver.resolve(Some(user("u1"))).await;
        assert_eq!(state, ResolverState::default());
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn results_follow_catalog_order() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        evaluator.grant(&user("u1"), Action::ClientRead, &Resource::all(ResourceKind::Client));
        let resolver = resolver(evaluator.clone(), navigation_items());

        let state = resolver.resolve(Some(user("u1"))).await;
        let ids: Vec<_> = state.items.iter().map(|r| r.item.id.to_string()).collect();
        assert_eq!(
            ids,
            [
                "dashboard",
                "user-management",
                "client-management",
                "delivery-challan",
                "policy-management"
            ]
        );
        assert!(!state.loading);
        assert!(state.last_updated.is_some());
        assert!(resolver.is_item_accessible("client-management"));
        assert!(!resolver.is_item_accessible("dashboard"));
        assert_eq!(resolver.accessible_items().len(), 1);
        assert_eq!(evaluator.calls(), 5);
    }

    #[tokio::test]
    async fn always_accessible_items_are_not_evaluated() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        let resolver = resolver(evaluator.clone(), user_menu_items());

        resolver.resolve(Some(user("u1"))).await;
        assert!(resolver.is_item_accessible("logout"));
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn recent_pass_is_reused_unless_forced() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        let resolver = resolver(evaluator.clone(), navigation_items());

        let first = resolver.resolve(Some(user("u1"))).await;
        let second = resolver.resolve(Some(user("u1"))).await;
        assert_eq!(first, second);
        assert_eq!(evaluator.calls(), 5);

        // Forced refresh runs a pass but every item is a per-item cache hit.
        let refreshed = resolver.refresh_permissions().await;
        assert_eq!(refreshed.items, first.items);
        assert_eq!(evaluator.calls(), 5);
    }

    #[tokio::test]
    async fn failed_items_are_denied_and_not_cached() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        evaluator.grant(&user("u1"), Action::UserCreate, &Resource::all(ResourceKind::User));
        evaluator.fail_on(Action::UserCreate);
        let resolver = resolver(evaluator.clone(), navigation_items());

        let state = resolver.resolve(Some(user("u1"))).await;
        assert!(state.error.is_none());
        assert!(!resolver.is_item_accessible("user-management"));
        assert!(resolver.get_item_error("user-management").is_some());

        evaluator.clear_failures();
        resolver.refresh_permissions().await;
        assert!(resolver.is_item_accessible("user-management"));
        assert_eq!(resolver.get_item_error("user-management"), None);
    }

    #[tokio::test]
    async fn reset_publishes_empty_state() {
        let evaluator = Arc::new(InMemoryPermissionEvaluator::new());
        let resolver = resolver(evaluator, navigation_items());
        let mut rx = resolver.subscribe();

        resolver.resolve(Some(user("u1"))).await;
        resolver.reset();
        assert_eq!(*rx.borrow(), ResolverState::default());
        assert_eq!(resolver.refresh_permissions().await, ResolverState::default());
    }
}
