//! In-memory permission evaluator for tests/dev.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use syzportal_auth::{Action, EvaluationRequest, PermissionEvaluation, Resource};
use syzportal_core::UserId;

use crate::error::ClientError;
use crate::permissions::PermissionEvaluator;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Grant {
    user_id: UserId,
    action: Action,
    pattern: String,
}

/// Static grant table evaluated the way the backend does it.
///
/// - `kind:*` in a grant matches `kind:*` and every `kind:<id>`
/// - `*` matches every resource
/// - No grant means deny
///
/// Counts calls so tests can assert how many remote round-trips a caller made.
#[derive(Debug, Default)]
pub struct InMemoryPermissionEvaluator {
    grants: Mutex<Vec<Grant>>,
    failing: Mutex<HashSet<Action>>,
    session_expired: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryPermissionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, user_id: &UserId, action: Action, resource: &Resource) {
        let grant = Grant {
            user_id: user_id.clone(),
            action,
            pattern: resource.to_string(),
        };
        self.grants_mut().push(grant);
    }

    pub fn revoke_all(&self, user_id: &UserId) {
        self.grants_mut().retain(|g| &g.user_id != user_id);
    }

    /// Make every evaluation of `action` fail with a network error.
    pub fn fail_on(&self, action: Action) {
        self.failing_mut().insert(action);
    }

    pub fn clear_failures(&self) {
        self.failing_mut().clear();
    }

    /// While set, every evaluation fails with [`ClientError::Unauthenticated`].
    pub fn expire_session(&self, expired: bool) {
        self.session_expired.store(expired, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn grants_mut(&self) -> std::sync::MutexGuard<'_, Vec<Grant>> {
        self.grants.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn failing_mut(&self) -> std::sync::MutexGuard<'_, HashSet<Action>> {
        self.failing.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn decide(&self, request: &EvaluationRequest) -> PermissionEvaluation {
        let requested = request.resource.to_string();
        let matched = self
            .grants_mut()
            .iter()
            .find(|g| {
                g.user_id == request.user_id
                    && g.action == request.action
                    && resource_matches(&g.pattern, &requested)
            })
            .map(|g| g.pattern.clone());

        let evaluation = match matched {
            Some(pattern) => {
                PermissionEvaluation::allow().with_policies([format!("grant:{pattern}")])
            }
            None => PermissionEvaluation::deny(format!(
                "Action '{}' not allowed on resource '{}'",
                request.action, request.resource
            )),
        };
        evaluation.for_request(request).evaluated_at(Utc::now())
    }
}

/// Backend-style resource matching.
pub fn resource_matches(pattern: &str, requested: &str) -> bool {
    if pattern == "*" || pattern == requested {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) if prefix.ends_with(':') => requested.starts_with(prefix),
        _ => false,
    }
}

#[async_trait]
impl PermissionEvaluator for InMemoryPermissionEvaluator {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<PermissionEvaluation, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.session_expired.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthenticated);
        }
        if self.failing_mut().contains(&request.action) {
            return Err(ClientError::Network(format!(
                "simulated failure for {}",
                request.action
            )));
        }
        Ok(self.decide(request))
    }
}
