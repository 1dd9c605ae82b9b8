//! Process-wide tracing setup.

pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, LOG_FORMAT_VAR, LogFormat};

/// Install the subscriber filtered by `RUST_LOG` (default `info`), in the
/// format named by `SYZPORTAL_LOG_FORMAT` (default JSON).
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
