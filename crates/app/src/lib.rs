//! `syzportal-app`: application root wiring session, permissions and navigation.

pub mod auth_store;
pub mod error;
pub mod state;

pub use auth_store::AuthStore;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Credentials the binary uses to log in when no session exists.
pub const USERNAME_VAR: &str = "SYZPORTAL_USERNAME";
pub const PASSWORD_VAR: &str = "SYZPORTAL_PASSWORD";
