use http::StatusCode;
use relay_core::HttpError;
use relay_deploy::DeployError;
use relay_store::StoreError;
use thiserror::Error;

/// Control-plane errors
#[derive(Debug, Error)]
pub enum ControlError {
    /// Invalid payload: bad name, non-positive replica count,
    /// immutable-field change, URL/body name mismatch
    #[error("validation failure: {0}")]
    Validation(String),

    /// A record with the requested name already exists
    #[error("'{name}' already exists")]
    Conflict { name: String },

    /// No record with the requested name
    #[error("'{name}' not found")]
    NotFound { name: String },

    /// Permission evaluator denied the operation
    #[error("operation forbidden")]
    Forbidden,

    /// Resource store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Deployment subsystem failure
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl HttpError for ControlError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Store(e) => e.status_code(),
            Self::Deploy(e) => e.status_code(),
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_failure",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Forbidden => "forbidden",
            Self::Store(e) => e.error_type(),
            Self::Deploy(e) => e.error_type(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Conflict { name } => format!("'{name}' already exists"),
            Self::NotFound { name } => format!("'{name}' not found"),
            Self::Forbidden => "you do not have permission to perform this operation".to_owned(),
            Self::Store(e) => e.client_message(),
            Self::Deploy(e) => e.client_message(),
        }
    }
}
