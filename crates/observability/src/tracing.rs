use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Selects the output format (`json` or `pretty`).
pub const LOG_FORMAT_VAR: &str = "SYZPORTAL_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Human-readable lines, for local runs.
    Pretty,
}

impl LogFormat {
    /// `json` / `pretty`, case-insensitive. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "text" => Some(LogFormat::Pretty),
            _ => None,
        }
    }

    /// Format named by `raw`, falling back to JSON when absent or unknown.
    pub fn or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    /// Format named by [`LOG_FORMAT_VAR`].
    pub fn from_env() -> Self {
        Self::or_default(std::env::var(LOG_FORMAT_VAR).ok().as_deref())
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing for the process. Returns `false` if a global
/// subscriber was already installed.
pub fn init(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_loosely() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn unknown_or_missing_format_falls_back_to_json() {
        assert_eq!(LogFormat::or_default(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::or_default(Some("xml")), LogFormat::Json);
        assert_eq!(LogFormat::or_default(None), LogFormat::Json);
    }

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init(LogFormat::Json);
        assert!(!init(LogFormat::Pretty));
    }
}
