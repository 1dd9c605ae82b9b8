//! Session user as returned by `GET /api/users/me/`.

use serde::{Deserialize, Serialize};

use syzportal_core::UserId;

use crate::Role;

/// Group that marks members of the internal operations team.
pub const OPERATIONS_GROUP: &str = "4syz";

/// Landing page for operations-team users.
pub const COMPANY_DASHBOARD: &str = "/start/dashboard";

/// Landing page for client users.
pub const CLIENT_DASHBOARD: &str = "/clients/dashboard";

/// Which side of the portal a user belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Internal operations team.
    Company,
    /// Client organisation user.
    Client,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Company => "company",
            UserType::Client => "client",
        }
    }

    pub fn dashboard_route(self) -> &'static str {
        match self {
            UserType::Company => COMPANY_DASHBOARD,
            UserType::Client => CLIENT_DASHBOARD,
        }
    }
}

impl core::fmt::Display for UserType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-scoped identity.
///
/// Treated as immutable between login and logout; replace the whole value
/// instead of editing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    /// Minimal user, mostly useful for tests and fixtures.
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            user_type: None,
            role: None,
            groups: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Effective user type: the explicit field, else derived from groups.
    pub fn user_type(&self) -> UserType {
        match self.user_type {
            Some(user_type) => user_type,
            None if self.groups.iter().any(|g| g == OPERATIONS_GROUP) => UserType::Company,
            None => UserType::Client,
        }
    }

    /// First group membership, else the user type name.
    pub fn primary_group(&self) -> &str {
        match self.groups.first() {
            Some(group) => group.as_str(),
            None => self.user_type().as_str(),
        }
    }

    /// True when any of `required` names one of the user's groups, the
    /// user type, or the role.
    pub fn in_group<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().any(|g| {
            let g = g.as_ref();
            self.groups.iter().any(|own| own == g)
                || self.user_type().as_str() == g
                || self.role.as_ref().is_some_and(|r| r.as_str() == g)
        })
    }

    /// Coarse permission check used for UI affordances.
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.role.as_ref().is_some_and(Role::is_admin) {
            return true;
        }
        if self.permissions.iter().any(|p| p == permission) {
            return true;
        }
        self.role
            .as_ref()
            .is_some_and(|r| r.implied_permissions().iter().any(|p| *p == permission))
    }

    pub fn dashboard_route(&self) -> &'static str {
        self.user_type().dashboard_route()
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            full.to_string()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            self.email.clone()
        }
    }
}
