//! Wire shapes of the remote permission evaluation endpoint.
//!
//! The authorization service owns these; the portal only ever reads
//! `allowed` and keeps the rest for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use syzportal_core::UserId;

use crate::{Action, Resource};

/// Auxiliary evaluation input (time-of-day, client IP, ...).
///
/// Passed through untouched; never validated on this side.
pub type EvaluationContext = Map<String, Value>;

/// Body of `POST /api/resource-permissions/evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    pub user_id: UserId,
    pub action: Action,
    pub resource: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<EvaluationContext>,
}

impl EvaluationRequest {
    pub fn new(user_id: UserId, action: Action, resource: Resource) -> Self {
        Self {
            user_id,
            action,
            resource,
            context: None,
        }
    }

    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Decision returned by the authorization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEvaluation {
    pub allowed: bool,
    #[serde(default, alias = "denied_reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, alias = "evaluated_policies")]
    pub matched_policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_statement: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    #[serde(default, alias = "required_action", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, alias = "required_resource", skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_time: Option<DateTime<Utc>>,
}

impl PermissionEvaluation {
    pub fn allow() -> Self {
        Self::decided(true, None)
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::decided(false, Some(reason.into()))
    }

    fn decided(allowed: bool, reason: Option<String>) -> Self {
        Self {
            allowed,
            reason,
            matched_policies: Vec::new(),
            matched_statement: None,
            user_id: None,
            action: None,
            resource: None,
            context: None,
            evaluation_time: None,
        }
    }

    /// Echo the evaluated triple, as the service does.
    pub fn for_request(mut self, request: &EvaluationRequest) -> Self {
        self.user_id = Some(Value::String(request.user_id.to_string()));
        self.action = Some(request.action.to_string());
        self.resource = Some(request.resource.to_string());
        self.context = request.context.clone().map(Value::Object);
        self
    }

    pub fn with_policies<I, S>(mut self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matched_policies = policies.into_iter().map(Into::into).collect();
        self
    }

    pub fn evaluated_at(mut self, at: DateTime<Utc>) -> Self {
        self.evaluation_time = Some(at);
        self
    }
}

/// Envelope around [`PermissionEvaluation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub evaluation: PermissionEvaluation,
}
