//! Strongly-typed identifiers used across the portal.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of a portal user (session identity).
///
/// The backend hands out numeric ids for Django users and string ids for
/// the resource-permission service, so the id is kept as its textual form.
/// It is never empty and carries no surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Build a user id, rejecting empty or blank input.
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("UserId: must not be empty"));
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self::from(n)),
            RawId::Text(s) => Self::new(s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_ids() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = UserId::new("  user-7 ").unwrap();
        assert_eq!(id.as_str(), "user-7");
    }

    #[test]
    fn deserializes_numeric_and_string_ids() {
        let numeric: UserId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric.as_str(), "42");

        let text: UserId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(text.as_str(), "abc");

        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = UserId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
