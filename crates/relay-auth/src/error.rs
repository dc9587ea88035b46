use http::StatusCode;
use relay_core::HttpError;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bearer token failed verification
    #[error("token verification failed: {0}")]
    InvalidToken(String),

    /// No principal could be established for the request
    #[error("request is not authenticated")]
    Unauthenticated,
}

impl HttpError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidToken(_) => "invalid_token",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidToken(_) => "token verification failed".to_owned(),
            Self::Unauthenticated => "request is not authenticated".to_owned(),
        }
    }
}
