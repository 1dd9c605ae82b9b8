//! Application root: owns every client and store and ties their lifecycles
//! together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use syzportal_auth::{AuthState, User};
use syzportal_client::{
    ApiClient, AssignmentRequest, ClientConfig, HttpPermissionClient, PermissionEvaluator,
    SessionClient, UserResourceAssignment,
};
use syzportal_core::UserId;
use syzportal_navigation::{
    GuardDecision, GuardedRoute, NavigationContext, NavigationSnapshot, Navigator, RouteGuard,
    SESSION_EXPIRED, routes,
};

use crate::auth_store::AuthStore;
use crate::error::{AppError, AppResult};

pub struct AppState {
    api: ApiClient,
    auth: AuthStore,
    permissions: HttpPermissionClient,
    navigation: NavigationContext,
    navigator: Arc<dyn Navigator>,
    disposed: AtomicBool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("base_url", &self.api.config().base_url)
            .field("auth", &self.auth.state())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the clients, check the session, and run the first navigation pass.
    pub async fn init(config: ClientConfig, navigator: Arc<dyn Navigator>) -> AppResult<Self> {
        let api = ApiClient::new(config)?;
        let evaluator: Arc<dyn PermissionEvaluator> =
            Arc::new(HttpPermissionClient::new(api.clone()));
        let state = Self::from_parts(api, evaluator, navigator);

        let auth = state.auth.check_session().await;
        state.navigation.set_user(auth.user().map(|u| u.id.clone())).await;
        tracing::info!(
            base_url = %state.api.config().base_url,
            authenticated = auth.is_authenticated(),
            "application initialised"
        );
        Ok(state)
    }

    /// Wire the parts without touching the network.
    pub fn from_parts(
        api: ApiClient,
        evaluator: Arc<dyn PermissionEvaluator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            auth: AuthStore::new(SessionClient::new(api.clone())),
            permissions: HttpPermissionClient::new(api.clone()),
            navigation: NavigationContext::new(evaluator, Arc::clone(&navigator)),
            api,
            navigator,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn navigation(&self) -> &NavigationContext {
        &self.navigation
    }

    pub fn permissions(&self) -> &HttpPermissionClient {
        &self.permissions
    }

    /// Backend health probe.
    pub async fn backend_healthy(&self) -> bool {
        self.auth.session().health().await
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        self.navigation.snapshot()
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        self.ensure_live()?;
        let user = self.auth.login(username, password).await?;
        self.navigation.set_user(Some(user.id.clone())).await;
        Ok(user)
    }

    /// Log out, drop every cached decision, and send the browser to login.
    pub async fn logout(&self) -> AppResult<()> {
        self.ensure_live()?;
        let remote = self.auth.logout().await;
        self.navigation.clear_cache();
        self.navigation.reset();
        self.navigator.replace(routes::LOGIN);
        remote.map_err(AppError::from)
    }

    /// Re-evaluate permissions; re-check the session if the backend rejected it.
    pub async fn refresh(&self) -> AppResult<NavigationSnapshot> {
        self.ensure_live()?;
        if self.auth.user().is_none() {
            return Err(AppError::NotAuthenticated);
        }

        let snapshot = self.navigation.refresh_permissions().await;
        if snapshot.error.as_deref() != Some(SESSION_EXPIRED) {
            return Ok(snapshot);
        }

        tracing::info!("permission pass reported an expired session; re-checking");
        match self.auth.check_session().await {
            AuthState::Authenticated(user) => {
                Ok(self.navigation.set_user(Some(user.id.clone())).await)
            }
            _ => {
                self.navigation.clear_cache();
                self.navigation.reset();
                Err(AppError::NotAuthenticated)
            }
        }
    }

    /// Grant a resource permission, then drop every cached decision and
    /// re-evaluate the signed-in user's navigation.
    pub async fn assign_permission(
        &self,
        user_id: &UserId,
        permission_id: &str,
        request: &AssignmentRequest,
    ) -> AppResult<UserResourceAssignment> {
        self.ensure_live()?;
        let assignment = self.permissions.assign(user_id, permission_id, request).await?;
        self.permissions_changed().await;
        Ok(assignment)
    }

    /// Withdraw a resource permission; cache handling as in
    /// [`AppState::assign_permission`].
    pub async fn unassign_permission(
        &self,
        user_id: &UserId,
        permission_id: &str,
    ) -> AppResult<()> {
        self.ensure_live()?;
        self.permissions.unassign(user_id, permission_id).await?;
        self.permissions_changed().await;
        Ok(())
    }

    async fn permissions_changed(&self) {
        self.navigation.clear_cache();
        if self.auth.user().is_some() {
            self.navigation.refresh_permissions().await;
        }
    }

    pub fn guard(&self, guard: RouteGuard) -> GuardedRoute {
        GuardedRoute::new(guard, Arc::clone(&self.navigator))
    }

    /// Evaluate `route` against the current session.
    pub fn check(&self, route: &GuardedRoute) -> GuardDecision {
        route.check(&self.auth.state())
    }

    /// Cancel in-flight passes. Later calls fail with [`AppError::Disposed`].
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.navigation.dispose();
            tracing::info!("application disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> AppResult<()> {
        if self.is_disposed() {
            Err(AppError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.dispose();
    }
}
