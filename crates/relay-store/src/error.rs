use http::StatusCode;
use relay_core::HttpError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store transport or command failure
    #[error("store backend: {0}")]
    BackendUnavailable(String),

    /// Record could not be serialized or deserialized
    #[error("serialization: {0}")]
    Serialization(String),
}

impl HttpError for StoreError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn error_type(&self) -> &str {
        match self {
            Self::BackendUnavailable(_) => "store_unavailable",
            Self::Serialization(_) => "store_serialization",
        }
    }

    fn client_message(&self) -> String {
        "backing store is unavailable".to_owned()
    }
}
