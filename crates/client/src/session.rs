//! Cookie-based session endpoints.

use serde::Deserialize;
use serde_json::json;

use syzportal_auth::User;

use crate::error::ClientError;
use crate::http::ApiClient;

pub const ME_PATH: &str = "/api/users/me/";
pub const LOGIN_PATH: &str = "/api/session-login/";
pub const LOGOUT_PATH: &str = "/api/session-logout/";
pub const CHECK_USERNAME_PATH: &str = "/api/check-username/";
pub const FORGOT_PASSWORD_PATH: &str = "/api/forgot-password/";
pub const HEALTH_PATH: &str = "/api/v1/health/";

#[derive(Debug, Deserialize)]
struct UsernameCheck {
    #[serde(default)]
    exists: bool,
}

/// Session login/logout and identity lookup.
#[derive(Debug, Clone)]
pub struct SessionClient {
    api: ApiClient,
}

impl SessionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Current session user; `None` when the session is absent or expired.
    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        match self.api.get_json::<User>(ME_PATH).await {
            Ok(user) => Ok(Some(user)),
            Err(ClientError::Unauthenticated) | Err(ClientError::Api { status: 403, .. }) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Establish a session and return the logged-in user.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidRequest(
                "username and password are required".to_string(),
            ));
        }
        self.api.ensure_csrf_token().await?;

        let body = json!({ "username": username, "password": password });
        match self.api.post_unit(LOGIN_PATH, &body).await {
            Ok(()) => {}
            Err(ClientError::Unauthenticated) | Err(ClientError::Api { status: 400, .. }) => {
                return Err(ClientError::InvalidCredentials);
            }
            Err(err) => return Err(err),
        }

        let user = self.current_user().await?.ok_or(ClientError::Unauthenticated)?;
        tracing::info!(user_id = %user.id, "session established");
        Ok(user)
    }

    /// End the session. The CSRF token is forgotten either way.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Err(err) = self.api.ensure_csrf_token().await {
            tracing::warn!(error = %err, "could not refresh csrf token before logout");
        }
        let result = self.api.post_unit(LOGOUT_PATH, &json!({})).await;
        self.api.set_csrf_token(None);
        match result {
            Ok(()) | Err(ClientError::Unauthenticated) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Whether `username` is registered (first step of the login form).
    pub async fn check_username(&self, username: &str) -> Result<bool, ClientError> {
        self.api.ensure_csrf_token().await?;
        let check: UsernameCheck = self
            .api
            .post_json(CHECK_USERNAME_PATH, &json!({ "username": username }))
            .await?;
        Ok(check.exists)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ClientError> {
        if !email.contains('@') {
            return Err(ClientError::InvalidRequest(format!("not an email address: {email}")));
        }
        self.api.ensure_csrf_token().await?;
        self.api
            .post_unit(FORGOT_PASSWORD_PATH, &json!({ "email": email }))
            .await
    }

    /// True when the backend health probe answers 2xx.
    pub async fn health(&self) -> bool {
        match self.api.get_status(HEALTH_PATH).await {
            Ok(status) => status.is_success(),
            Err(err) => {
                tracing::warn!(error = %err, "backend health check failed");
                false
            }
        }
    }
}
