//! Permission-aware navigation: catalogs, decision cache, resolvers,
//! navigation context and route guard.

pub mod cache;
pub mod context;
pub mod guard;
pub mod item;
pub mod resolver;
pub mod router;
pub mod routes;
pub mod types;

pub use cache::{CacheKey, DEFAULT_TTL_MS, PermissionCache};
pub use context::{NavigationContext, NavigationSnapshot};
pub use guard::{DenialReason, GuardDecision, GuardedRoute, RouteGuard, UserTypeRequirement};
pub use item::{Catalog, ItemId, NavigationItem, navigation_items, quick_actions, user_menu_items};
pub use resolver::{NavigationResolver, SESSION_EXPIRED};
pub use router::{LoggingNavigator, NavigationEvent, Navigator, RecordingNavigator};
pub use types::{PermissionResult, ResolverState};
