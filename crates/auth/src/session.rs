use crate::User;

/// Authentication state of the current session.
///
/// Starts in `Loading` until the single mount-time session check resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn from_user(user: Option<User>) -> Self {
        match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}
