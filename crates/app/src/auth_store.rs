//! Session state of the running application.

use tokio::sync::watch;

use syzportal_auth::{AuthState, User};
use syzportal_client::{ClientError, SessionClient};

/// Owns the session client and publishes [`AuthState`] changes.
#[derive(Debug)]
pub struct AuthStore {
    session: SessionClient,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new(session: SessionClient) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { session, state }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Ask the backend who is logged in. Any failure reads as anonymous.
    pub async fn check_session(&self) -> AuthState {
        let next = match self.session.current_user().await {
            Ok(user) => AuthState::from_user(user),
            Err(err) => {
                tracing::warn!(error = %err, "session check failed; treating as anonymous");
                AuthState::Anonymous
            }
        };
        tracing::info!(authenticated = next.is_authenticated(), "session checked");
        self.state.send_replace(next.clone());
        next
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        match self.session.login(username, password).await {
            Ok(user) => {
                self.state.send_replace(AuthState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(err) => {
                tracing::info!(username, error = %err, "login rejected");
                self.state.send_replace(AuthState::Anonymous);
                Err(err)
            }
        }
    }

    /// End the session. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.session.logout().await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "remote logout failed; clearing local session anyway");
        }
        self.state.send_replace(AuthState::Anonymous);
        result
    }
}
