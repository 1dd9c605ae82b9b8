//! Remote permission evaluation.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use syzportal_auth::{Action, EvaluationRequest, EvaluationResponse, PermissionEvaluation, Resource};
use syzportal_core::UserId;

use crate::error::ClientError;
use crate::http::ApiClient;

pub const EVALUATE_PATH: &str = "/api/resource-permissions/evaluate";
pub const PERMISSIONS_PATH: &str = "/api/resource-permissions";

/// One call per `(user, action, resource)` triple.
///
/// Implementations never cache; callers own caching. Any `Err` must be
/// read as "access denied".
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<PermissionEvaluation, ClientError>;
}

/// Permission grant as listed by the resource-permission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    pub id: String,
    pub resource: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
}

/// Assignment of a [`ResourcePermission`] to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResourceAssignment {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub resource_permission_id: String,
    #[serde(default)]
    pub assigned_by: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Optional metadata sent with an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub assigned_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssignmentRequest {
    pub fn by(assigned_by: impl Into<String>) -> Self {
        Self {
            assigned_by: assigned_by.into(),
            expires_at: None,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn expires_at(mut self, at: impl Into<String>) -> Self {
        self.expires_at = Some(at.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct AssignResponse {
    assignment: UserResourceAssignment,
}

#[derive(Debug, Deserialize)]
struct AssignmentList {
    #[serde(default)]
    assignments: Vec<UserResourceAssignment>,
}

#[derive(Debug, Deserialize)]
struct PermissionList {
    #[serde(default)]
    permissions: Vec<ResourcePermission>,
}

/// Grants and assignments of one user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserResourcePermissions {
    #[serde(default)]
    pub permissions: Vec<ResourcePermission>,
    #[serde(default)]
    pub assignments: Vec<UserResourceAssignment>,
}

impl UserResourcePermissions {
    /// Categories the user holds at least one grant in.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .permissions
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}

/// [`PermissionEvaluator`] backed by the portal's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPermissionClient {
    api: ApiClient,
}

impl HttpPermissionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn evaluate_permission(
        &self,
        user_id: &UserId,
        action: Action,
        resource: Resource,
    ) -> Result<PermissionEvaluation, ClientError> {
        let request = EvaluationRequest::new(user_id.clone(), action, resource);
        self.evaluate(&request).await
    }

    /// Boolean convenience: any failure answers `false`.
    pub async fn has_permission(
        &self,
        user_id: &UserId,
        action: Action,
        resource: Resource,
    ) -> bool {
        match self.evaluate_permission(user_id, action, resource).await {
            Ok(evaluation) => evaluation.allowed,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %err,
                    "permission check failed; denying"
                );
                false
            }
        }
    }

    pub async fn user_resource_permissions(
        &self,
        user_id: &UserId,
    ) -> Result<UserResourcePermissions, ClientError> {
        let path = format!("{PERMISSIONS_PATH}/user/{user_id}/permissions");
        self.api.get_json(&path).await
    }

    /// Every permission definition known to the backend.
    pub async fn resource_permissions(&self) -> Result<Vec<ResourcePermission>, ClientError> {
        let list: PermissionList = self.api.get_json(&format!("{PERMISSIONS_PATH}/")).await?;
        Ok(list.permissions)
    }

    pub async fn resource_permission(
        &self,
        permission_id: &str,
    ) -> Result<ResourcePermission, ClientError> {
        self.api
            .get_json(&format!("{PERMISSIONS_PATH}/{permission_id}"))
            .await
    }

    pub async fn user_assignments(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserResourceAssignment>, ClientError> {
        let path = format!("{PERMISSIONS_PATH}/user/{user_id}/assignments");
        let list: AssignmentList = self.api.get_json(&path).await?;
        Ok(list.assignments)
    }

    pub async fn all_assignments(&self) -> Result<Vec<UserResourceAssignment>, ClientError> {
        let path = format!("{PERMISSIONS_PATH}/assignments/all");
        let list: AssignmentList = self.api.get_json(&path).await?;
        Ok(list.assignments)
    }

    /// Grant `permission_id` to `user_id`. Cached decisions become stale.
    pub async fn assign(
        &self,
        user_id: &UserId,
        permission_id: &str,
        request: &AssignmentRequest,
    ) -> Result<UserResourceAssignment, ClientError> {
        self.api.ensure_csrf_token().await?;
        let path = format!("{PERMISSIONS_PATH}/assign/{user_id}/{permission_id}");
        let response: AssignResponse = self.api.post_json(&path, request).await?;
        tracing::info!(user_id = %user_id, permission_id, "resource permission assigned");
        Ok(response.assignment)
    }

    /// Withdraw `permission_id` from `user_id`. Cached decisions become stale.
    pub async fn unassign(&self, user_id: &UserId, permission_id: &str) -> Result<(), ClientError> {
        self.api.ensure_csrf_token().await?;
        let path = format!("{PERMISSIONS_PATH}/unassign/{user_id}/{permission_id}");
        self.api.delete(&path).await?;
        tracing::info!(user_id = %user_id, permission_id, "resource permission unassigned");
        Ok(())
    }
}

#[async_trait]
impl PermissionEvaluator for HttpPermissionClient {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<PermissionEvaluation, ClientError> {
        let response: EvaluationResponse = self
            .api
            .post_json_expecting(EVALUATE_PATH, request, StatusCode::OK)
            .await?;
        tracing::debug!(
            user_id = %request.user_id,
            action = %request.action,
            resource = %request.resource,
            allowed = response.evaluation.allowed,
            "permission evaluated"
        );
        Ok(response.evaluation)
    }
}
