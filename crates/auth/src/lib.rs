//! `syzportal-auth`: identity and authorization vocabulary of the portal.
//!
//! Pure types: no IO, no async. Policy evaluation happens in the remote
//! authorization service; this crate only names what is asked and what
//! comes back.

pub mod evaluation;
pub mod permissions;
pub mod resources;
pub mod roles;
pub mod session;
pub mod user;

pub use evaluation::{
    EvaluationContext, EvaluationRequest, EvaluationResponse, PermissionEvaluation,
};
pub use permissions::Action;
pub use resources::{Resource, ResourceKind};
pub use roles::Role;
pub use session::AuthState;
pub use user::{CLIENT_DASHBOARD, COMPANY_DASHBOARD, OPERATIONS_GROUP, User, UserType};
