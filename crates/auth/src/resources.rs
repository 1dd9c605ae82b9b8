use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Family of resources the portal knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Auth,
    User,
    Client,
    DeliveryChallan,
    Permissions,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Auth,
        ResourceKind::User,
        ResourceKind::Client,
        ResourceKind::DeliveryChallan,
        ResourceKind::Permissions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Auth => "auth",
            ResourceKind::User => "user",
            ResourceKind::Client => "client",
            ResourceKind::DeliveryChallan => "delivery_challan",
            ResourceKind::Permissions => "permissions",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == prefix)
    }
}

/// Object of an action.
///
/// Wildcards such as `client:*` are resolved by the authorization service;
/// on this side they are only a structured way to say "every client".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Resource {
    /// `kind:*`
    All(ResourceKind),
    /// `kind:<id>`
    Instance(ResourceKind, String),
    /// Anything outside the known vocabulary, kept verbatim.
    Custom(String),
}

impl Resource {
    pub fn all(kind: ResourceKind) -> Self {
        Self::All(kind)
    }

    pub fn instance(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::Instance(kind, id.into())
    }

    /// Parse a wire string (`"client:*"`, `"client:42"`, anything else).
    pub fn parse(raw: &str) -> Self {
        if let Some((prefix, rest)) = raw.split_once(':') {
            if let Some(kind) = ResourceKind::from_prefix(prefix) {
                return match rest {
                    "*" => Self::All(kind),
                    "" => Self::Custom(raw.to_string()),
                    id => Self::Instance(kind, id.to_string()),
                };
            }
        }
        Self::Custom(raw.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Resource::All(_)) || matches!(self, Resource::Custom(raw) if raw == "*")
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Resource::All(kind) => write!(f, "{}:*", kind.as_str()),
            Resource::Instance(kind, id) => write!(f, "{}:{}", kind.as_str(), id),
            Resource::Custom(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for Resource {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Resource> for String {
    fn from(value: Resource) -> Self {
        match value {
            Resource::Custom(raw) => raw,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wildcards_and_instances() {
        assert_eq!(Resource::parse("client:*"), Resource::All(ResourceKind::Client));
        assert_eq!(
            Resource::parse("delivery_challan:DC-17"),
            Resource::instance(ResourceKind::DeliveryChallan, "DC-17")
        );
    }

    #[test]
    fn unknown_prefix_or_missing_id_is_custom() {
        assert_eq!(Resource::parse("reports:*"), Resource::Custom("reports:*".to_string()));
        assert_eq!(Resource::parse("client:"), Resource::Custom("client:".to_string()));
        assert_eq!(Resource::parse("*"), Resource::Custom("*".to_string()));
        assert!(Resource::parse("*").is_wildcard());
    }

    #[test]
    fn display_matches_wire_form() {
        for raw in ["user:*", "client:42", "permissions:*", "free-form"] {
            assert_eq!(Resource::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn instance_ids_may_contain_colons() {
        let resource = Resource::parse("client:eu:7");
        assert_eq!(resource, Resource::instance(ResourceKind::Client, "eu:7"));
        assert_eq!(resource.to_string(), "client:eu:7");
    }
}
