use http::StatusCode;
use relay_core::HttpError;
use thiserror::Error;

use crate::api::OrchestratorError;

/// Deployment subsystem errors
#[derive(Debug, Error)]
pub enum DeployError {
    /// Workload does not exist on the orchestrator
    #[error("workload not found: {name}")]
    NotFound { name: String },

    /// No replica endpoints exist for the workload
    #[error("no endpoints for workload: {workload}")]
    NoEndpoints { workload: String },

    /// Orchestrator API call failed
    #[error("orchestrator: {0}")]
    Upstream(String),
}

impl From<OrchestratorError> for DeployError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::NotFound { name } => Self::NotFound { name },
            OrchestratorError::Conflict { name } => Self::Upstream(format!("conflicting workload: {name}")),
            OrchestratorError::Status { code, message } => Self::Upstream(format!("status {code}: {message}")),
            OrchestratorError::Transport(message) => Self::Upstream(message),
        }
    }
}

impl HttpError for DeployError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NoEndpoints { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::NoEndpoints { .. } => "no_endpoints",
            Self::Upstream(_) => "orchestrator_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::NotFound { name } => format!("workload not found: {name}"),
            Self::NoEndpoints { workload } => format!("no ready replicas for: {workload}"),
            Self::Upstream(_) => "orchestrator request failed".to_owned(),
        }
    }
}
