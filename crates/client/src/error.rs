use thiserror::Error;

/// Failure talking to the portal backend.
///
/// Callers that gate access on these treat every variant as a denial.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("session is not authenticated")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthenticated => Some(401),
            _ => None,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Unauthenticated)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}
