use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier assigned to a portal user (`admin`, `manager`, ...).
///
/// Roles stay opaque strings; only the coarse permission table below is
/// known on this side; fine-grained policy lives in the authorization service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const MANAGER: Role = Role(Cow::Borrowed("manager"));
    pub const USER: Role = Role(Cow::Borrowed("user"));
    pub const VIEWER: Role = Role(Cow::Borrowed("viewer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == "admin"
    }

    /// Coarse UI permissions implied by the role.
    ///
    /// `admin` is handled by callers as "everything"; unknown roles imply nothing.
    pub fn implied_permissions(&self) -> &'static [&'static str] {
        match self.as_str() {
            "manager" => &["view", "edit", "create"],
            "user" => &["view", "edit"],
            "viewer" => &["view"],
            _ => &[],
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
