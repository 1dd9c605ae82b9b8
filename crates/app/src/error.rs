use thiserror::Error;

use syzportal_client::ClientError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("application state has been disposed")]
    Disposed,
}

pub type AppResult<T> = Result<T, AppError>;
