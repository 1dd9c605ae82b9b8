//! HTTP client for the portal backend: session endpoints and permission evaluation.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod permissions;
pub mod session;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::ApiClient;
pub use memory::InMemoryPermissionEvaluator;
pub use permissions::{
    AssignmentRequest, HttpPermissionClient, PermissionEvaluator, ResourcePermission,
    UserResourceAssignment, UserResourcePermissions,
};
pub use session::SessionClient;
