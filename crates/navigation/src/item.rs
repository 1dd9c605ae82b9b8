//! Static navigation descriptors and the portal's three catalogs.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use syzportal_auth::{Action, Resource, ResourceKind};

use crate::routes;

/// Identifier of a navigation item, unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Immutable navigation entry guarded by one `(action, resource)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationItem {
    pub id: ItemId,
    pub label: String,
    pub href: String,
    pub required_action: Action,
    pub required_resource: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Never evaluated remotely; always reported accessible.
    pub always_accessible: bool,
}

impl NavigationItem {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        href: impl Into<String>,
        required_action: Action,
        required_resource: Resource,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            label: label.into(),
            href: href.into(),
            required_action,
            required_resource,
            badge: None,
            description: None,
            always_accessible: false,
        }
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn always_accessible(mut self) -> Self {
        self.always_accessible = true;
        self
    }

    /// `#`-prefixed hrefs name in-page actions (logout) rather than routes.
    pub fn is_action(&self) -> bool {
        self.href.starts_with('#')
    }
}

/// Shared, immutable catalog.
pub type Catalog = Arc<[Arc<NavigationItem>]>;

pub fn catalog<I>(items: I) -> Catalog
where
    I: IntoIterator<Item = NavigationItem>,
{
    items.into_iter().map(Arc::new).collect()
}

/// Main sidebar navigation.
pub fn navigation_items() -> Catalog {
    catalog([
        NavigationItem::new(
            "dashboard",
            "Dashboard",
            routes::DASHBOARD,
            Action::AuthMe,
            Resource::all(ResourceKind::Auth),
        )
        .with_description("Main dashboard and overview"),
        NavigationItem::new(
            "user-management",
            "User Management",
            routes::CREATE_USER,
            Action::UserCreate,
            Resource::all(ResourceKind::User),
        )
        .with_description("Create and manage users"),
        NavigationItem::new(
            "client-management",
            "Client Management",
            routes::CLIENT_DETAILS,
            Action::ClientRead,
            Resource::all(ResourceKind::Client),
        )
        .with_description("Manage client information"),
        NavigationItem::new(
            "delivery-challan",
            "Delivery Challan",
            routes::DELIVERY_CHALLAN_TRACKER,
            Action::DeliveryChallanRead,
            Resource::all(ResourceKind::DeliveryChallan),
        )
        .with_description("Track delivery challans"),
        NavigationItem::new(
            "policy-management",
            "Policy Management",
            routes::POLICY_MANAGEMENT,
            Action::PermissionsRead,
            Resource::all(ResourceKind::Permissions),
        )
        .with_description("Manage permissions and policies"),
    ])
}

/// Dashboard shortcuts; a subset of the main navigation.
pub fn quick_actions() -> Catalog {
    catalog([
        NavigationItem::new(
            "create-user",
            "Create New User",
            routes::CREATE_USER,
            Action::UserCreate,
            Resource::all(ResourceKind::User),
        ),
        NavigationItem::new(
            "manage-clients",
            "Manage Clients",
            routes::CLIENT_DETAILS,
            Action::ClientRead,
            Resource::all(ResourceKind::Client),
        ),
        NavigationItem::new(
            "delivery-tracker",
            "Delivery Challan Tracker",
            routes::DELIVERY_CHALLAN_TRACKER,
            Action::DeliveryChallanRead,
            Resource::all(ResourceKind::DeliveryChallan),
        ),
        NavigationItem::new(
            "policy-management",
            "Policy Management",
            routes::POLICY_MANAGEMENT,
            Action::PermissionsRead,
            Resource::all(ResourceKind::Permissions),
        ),
    ])
}

/// User menu; visible whenever someone is logged in.
pub fn user_menu_items() -> Catalog {
    catalog([NavigationItem::new(
        "logout",
        "Logout",
        "#",
        Action::AuthLogout,
        Resource::all(ResourceKind::Auth),
    )
    .always_accessible()])
}
