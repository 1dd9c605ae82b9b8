use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Action identifier checked by the authorization service.
///
/// The known vocabulary is closed at compile time; anything else the
/// backend accepts travels as [`Action::Custom`] verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    AuthLogin,
    AuthLogout,
    AuthRefresh,
    AuthMe,
    UserCreate,
    UserRead,
    UserUpdate,
    UserDelete,
    UserList,
    ClientCreate,
    ClientRead,
    ClientUpdate,
    ClientDelete,
    ClientList,
    DeliveryChallanCreate,
    DeliveryChallanRead,
    DeliveryChallanUpdate,
    DeliveryChallanDelete,
    DeliveryChallanList,
    DeliveryChallanUpload,
    DeliveryChallanLinkInvoice,
    PermissionsCreate,
    PermissionsRead,
    PermissionsUpdate,
    PermissionsDelete,
    PermissionsList,
    PermissionsAssign,
    PermissionsUnassign,
    PermissionsEvaluate,
    Custom(String),
}

macro_rules! known_actions {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        impl Action {
            /// Every action with a fixed wire name.
            pub const KNOWN: &'static [Action] = &[$(Action::$variant),+];

            /// Wire representation (e.g. `"client:read"`).
            pub fn as_str(&self) -> &str {
                match self {
                    $(Action::$variant => $wire,)+
                    Action::Custom(raw) => raw.as_str(),
                }
            }

            /// Parse a wire name. Unknown names become [`Action::Custom`].
            pub fn parse(raw: &str) -> Self {
                match raw {
                    $($wire => Action::$variant,)+
                    other => Action::Custom(other.to_string()),
                }
            }
        }
    };
}

known_actions! {
    AuthLogin => "auth:login",
    AuthLogout => "auth:logout",
    AuthRefresh => "auth:refresh",
    AuthMe => "auth:me",
    UserCreate => "user:create",
    UserRead => "user:read",
    UserUpdate => "user:update",
    UserDelete => "user:delete",
    UserList => "user:list",
    ClientCreate => "client:create",
    ClientRead => "client:read",
    ClientUpdate => "client:update",
    ClientDelete => "client:delete",
    ClientList => "client:list",
    DeliveryChallanCreate => "delivery_challan:create",
    DeliveryChallanRead => "delivery_challan:read",
    DeliveryChallanUpdate => "delivery_challan:update",
    DeliveryChallanDelete => "delivery_challan:delete",
    DeliveryChallanList => "delivery_challan:list",
    DeliveryChallanUpload => "delivery_challan:upload",
    DeliveryChallanLinkInvoice => "delivery_challan:link_invoice",
    PermissionsCreate => "permissions:create",
    PermissionsRead => "permissions:read",
    PermissionsUpdate => "permissions:update",
    PermissionsDelete => "permissions:delete",
    PermissionsList => "permissions:list",
    PermissionsAssign => "permissions:assign",
    PermissionsUnassign => "permissions:unassign",
    PermissionsEvaluate => "permissions:evaluate",
}

impl Action {
    pub fn custom(raw: impl Into<String>) -> Self {
        Self::parse(&raw.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Action::Custom(_))
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match Self::parse(&value) {
            Action::Custom(_) => Action::Custom(value),
            known => known,
        }
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        match value {
            Action::Custom(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}
