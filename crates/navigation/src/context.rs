//! Navigation context: the three catalog resolvers over one shared cache,
//! plus route tracking and imperative navigation.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use syzportal_client::PermissionEvaluator;
use syzportal_core::UserId;

use crate::cache::PermissionCache;
use crate::item::{NavigationItem, navigation_items, quick_actions, user_menu_items};
use crate::resolver::NavigationResolver;
use crate::router::Navigator;
use crate::routes;
use crate::types::ResolverState;

/// Serializable view of the whole context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSnapshot {
    pub current_path: String,
    pub navigation: ResolverState,
    pub quick_actions: ResolverState,
    pub user_menu: ResolverState,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct NavigationContext {
    navigation: NavigationResolver,
    quick_actions: NavigationResolver,
    user_menu: NavigationResolver,
    cache: PermissionCache,
    navigator: Arc<dyn Navigator>,
    current_path: RwLock<String>,
}

impl std::fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationContext")
            .field("current_path", &self.current_path())
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl NavigationContext {
    pub fn new(evaluator: Arc<dyn PermissionEvaluator>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_cache(evaluator, navigator, PermissionCache::new())
    }

    pub fn with_cache(
        evaluator: Arc<dyn PermissionEvaluator>,
        navigator: Arc<dyn Navigator>,
        cache: PermissionCache,
    ) -> Self {
        let resolver = |name: &str, items| {
            NavigationResolver::new(name, Arc::clone(&evaluator), cache.clone(), items)
        };
        Self {
            navigation: resolver("navigation", navigation_items()),
            quick_actions: resolver("quick_actions", quick_actions()),
            user_menu: resolver("user_menu", user_menu_items()),
            cache: cache.clone(),
            navigator,
            current_path: RwLock::new("/".to_string()),
        }
    }

    pub fn navigation(&self) -> &NavigationResolver {
        &self.navigation
    }

    pub fn quick_actions(&self) -> &NavigationResolver {
        &self.quick_actions
    }

    pub fn user_menu(&self) -> &NavigationResolver {
        &self.user_menu
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    fn resolvers(&self) -> [&NavigationResolver; 3] {
        [&self.navigation, &self.quick_actions, &self.user_menu]
    }

    /// Resolve all catalogs for `user_id` concurrently.
    pub async fn set_user(&self, user_id: Option<UserId>) -> NavigationSnapshot {
        tokio::join!(
            self.navigation.resolve(user_id.clone()),
            self.quick_actions.resolve(user_id.clone()),
            self.user_menu.resolve(user_id),
        );
        self.snapshot()
    }

    pub async fn refresh_permissions(&self) -> NavigationSnapshot {
        tokio::join!(
            self.navigation.refresh_permissions(),
            self.quick_actions.refresh_permissions(),
            self.user_menu.refresh_permissions(),
        );
        self.snapshot()
    }

    pub fn clear_cache(&self) {
        self.cache.clear_all();
    }

    /// Drop all resolved state, e.g. on logout.
    pub fn reset(&self) {
        for resolver in self.resolvers() {
            resolver.reset();
        }
    }

    pub fn dispose(&self) {
        for resolver in self.resolvers() {
            resolver.dispose();
        }
    }

    pub fn on_route_change(&self, path: impl Into<String>) {
        let path = path.into();
        tracing::debug!(path = %path, "route changed");
        *self
            .current_path
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path;
    }

    pub fn current_path(&self) -> String {
        self.current_path
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Push `href` unless it names an in-page action (`#...`).
    ///
    /// Returns whether a navigation was issued.
    pub fn navigate_to(&self, href: &str) -> bool {
        if href.starts_with('#') {
            tracing::debug!(href, "special action; not navigating");
            return false;
        }
        self.navigator.push(href);
        true
    }

    /// Whether the item governing `route` is accessible.
    ///
    /// The governing item is the one whose `href` is the longest
    /// segment-aligned prefix of the route path. Ungoverned routes are denied.
    pub fn can_access_route(&self, route: &str) -> bool {
        let path = routes::route_path(route);
        let governing: Vec<&NavigationItem> = self
            .resolvers()
            .into_iter()
            .flat_map(|r| r.items().iter())
            .map(|item| item.as_ref())
            .filter(|item| !item.is_action() && routes::governs(&item.href, path))
            .collect();

        let Some(longest) = governing.iter().map(|item| item.href.len()).max() else {
            return false;
        };
        governing
            .iter()
            .filter(|item| item.href.len() == longest)
            .any(|item| self.is_item_accessible(item.id.as_str()))
    }

    /// Accessible in any catalog; `always_accessible` items always are.
    pub fn is_item_accessible(&self, id: &str) -> bool {
        let always = self
            .resolvers()
            .iter()
            .flat_map(|r| r.items().iter())
            .any(|item| item.id == id && item.always_accessible);
        always || self.resolvers().iter().any(|r| r.is_item_accessible(id))
    }

    pub fn is_item_loading(&self, id: &str) -> bool {
        self.resolvers().iter().any(|r| r.is_item_loading(id))
    }

    pub fn get_item_error(&self, id: &str) -> Option<String> {
        self.resolvers().iter().find_map(|r| r.get_item_error(id))
    }

    pub fn loading(&self) -> bool {
        self.resolvers().iter().any(|r| r.state().loading)
    }

    pub fn error(&self) -> Option<String> {
        self.resolvers().iter().find_map(|r| r.state().error)
    }

    /// Most recent commit across the catalogs.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.resolvers().iter().filter_map(|r| r.state().last_updated).max()
    }

    pub fn accessible_items(&self) -> Vec<Arc<NavigationItem>> {
        self.navigation.accessible_items()
    }

    pub fn accessible_quick_actions(&self) -> Vec<Arc<NavigationItem>> {
        self.quick_actions.accessible_items()
    }

    pub fn accessible_user_menu_items(&self) -> Vec<Arc<NavigationItem>> {
        self.user_menu.accessible_items()
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        let navigation = self.navigation.state();
        let quick_actions = self.quick_actions.state();
        let user_menu = self.user_menu.state();
        let states = [&navigation, &quick_actions, &user_menu];

        NavigationSnapshot {
            current_path: self.current_path(),
            loading: states.iter().any(|s| s.loading),
            error: states.iter().find_map(|s| s.error.clone()),
            last_updated: states.iter().filter_map(|s| s.last_updated).max(),
            navigation,
            quick_actions,
            user_menu,
        }
    }
}
