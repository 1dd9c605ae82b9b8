//! Client configuration sourced from the environment.

use std::time::Duration;

/// Backend base URL used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variables consulted for the backend base URL, in order.
pub const API_URL_VARS: [&str; 2] = ["NEXT_PUBLIC_API_BASE_URL", "NEXT_PUBLIC_API_URL"];

/// Optional per-request timeout, in whole seconds.
pub const REQUEST_TIMEOUT_VAR: &str = "SYZPORTAL_REQUEST_TIMEOUT_SECS";

/// Connection settings for the portal backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slash (e.g. `https://portal.example.com`).
    pub base_url: String,
    /// Per-request timeout. `None` leaves it to the OS / connection defaults.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (env, file, test map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = API_URL_VARS
            .iter()
            .filter_map(|key| lookup(*key))
            .map(|raw| normalize_base_url(&raw))
            .find(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = match lookup(REQUEST_TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid {REQUEST_TIMEOUT_VAR}");
                    None
                }
            },
            None => None,
        };

        Self {
            base_url,
            request_timeout,
        }
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
