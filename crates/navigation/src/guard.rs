//! Route gate: blocks protected content until the session is known and
//! the user passes the group, user-type and permission checks.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use syzportal_auth::{AuthState, CLIENT_DASHBOARD, COMPANY_DASHBOARD, User, UserType};

use crate::router::Navigator;
use crate::routes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTypeRequirement {
    Company,
    Client,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    Unauthenticated,
    MissingGroup,
    WrongUserType,
    MissingPermission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session check still running; render the fallback.
    Pending,
    Denied {
        redirect: String,
        reason: DenialReason,
    },
    Granted,
}

impl GuardDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardDecision::Granted)
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            GuardDecision::Denied { redirect, .. } => Some(redirect),
            _ => None,
        }
    }
}

/// Declarative requirements of a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    required_groups: Vec<String>,
    required_permissions: Vec<String>,
    redirect_to: String,
    user_type: Option<UserTypeRequirement>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            required_groups: Vec::new(),
            required_permissions: Vec::new(),
            redirect_to: routes::LOGIN.to_string(),
            user_type: None,
        }
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any one of `groups` satisfies the check (group, user type or role name).
    pub fn require_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Any one of `permissions` satisfies the check (see [`User::has_permission`]).
    pub fn require_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Where anonymous visitors are sent. Defaults to `/login`.
    pub fn redirect_to(mut self, href: impl Into<String>) -> Self {
        self.redirect_to = href.into();
        self
    }

    pub fn user_type(mut self, requirement: UserTypeRequirement) -> Self {
        self.user_type = Some(requirement);
        self
    }

    pub fn evaluate(&self, auth: &AuthState) -> GuardDecision {
        match auth {
            AuthState::Loading => GuardDecision::Pending,
            AuthState::Anonymous => GuardDecision::Denied {
                redirect: self.redirect_to.clone(),
                reason: DenialReason::Unauthenticated,
            },
            AuthState::Authenticated(user) => self.evaluate_user(user),
        }
    }

    fn evaluate_user(&self, user: &User) -> GuardDecision {
        if !self.required_groups.is_empty() && !user.in_group(&self.required_groups) {
            return Self::deny(user, user.dashboard_route(), DenialReason::MissingGroup);
        }

        match (self.user_type, user.user_type()) {
            (Some(UserTypeRequirement::Company), UserType::Client) => {
                return Self::deny(user, CLIENT_DASHBOARD, DenialReason::WrongUserType);
            }
            (Some(UserTypeRequirement::Client), UserType::Company) => {
                return Self::deny(user, COMPANY_DASHBOARD, DenialReason::WrongUserType);
            }
            _ => {}
        }

        if !self.required_permissions.is_empty()
            && !self.required_permissions.iter().any(|p| user.has_permission(p))
        {
            return Self::deny(user, user.dashboard_route(), DenialReason::MissingPermission);
        }
        GuardDecision::Granted
    }

    fn deny(user: &User, redirect: &str, reason: DenialReason) -> GuardDecision {
        tracing::debug!(
            user = %user.username,
            group = user.primary_group(),
            ?reason,
            "route denied"
        );
        GuardDecision::Denied {
            redirect: redirect.to_string(),
            reason,
        }
    }
}

/// A [`RouteGuard`] bound to a navigator.
///
/// Issues one `replace` per distinct denial target and re-arms once the
/// decision leaves `Denied`.
pub struct GuardedRoute {
    guard: RouteGuard,
    navigator: Arc<dyn Navigator>,
    last_redirect: Mutex<Option<String>>,
}

impl GuardedRoute {
    pub fn new(guard: RouteGuard, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            guard,
            navigator,
            last_redirect: Mutex::new(None),
        }
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn check(&self, auth: &AuthState) -> GuardDecision {
        let decision = self.guard.evaluate(auth);
        let mut last = self
            .last_redirect
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match decision.redirect() {
            Some(target) if last.as_deref() != Some(target) => {
                tracing::info!(redirect = target, ?decision, "route guard redirect");
                self.navigator.replace(target);
                *last = Some(target.to_string());
            }
            Some(_) => {}
            None => *last = None,
        }
        decision
    }

    /// `children` only when granted; `fallback` while pending or denied.
    pub fn render<T>(
        &self,
        auth: &AuthState,
        children: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> T {
        if self.check(auth).is_granted() {
            children()
        } else {
            fallback()
        }
    }
}
