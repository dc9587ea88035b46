use http::StatusCode;
use relay_core::HttpError;
use relay_store::StoreError;
use thiserror::Error;

/// Data-plane errors
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No adapter record with the requested name
    #[error("adapter not found: {name}")]
    AdapterNotFound { name: String },

    /// Caller may not read the adapter
    #[error("access to adapter denied")]
    Forbidden,

    /// No replica is available to take a new session
    #[error("no backend available for: {workload}")]
    NoBackend { workload: String },

    /// Session id is not in the session store; the client must
    /// re-initialize
    #[error("unknown session")]
    UnknownSession,

    /// Upstream connection failed
    #[error("upstream connect failed: {0}")]
    UpstreamConnect(String),

    /// Store failure while routing
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HttpError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AdapterNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NoBackend { .. } | Self::UnknownSession => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamConnect(_) => StatusCode::BAD_GATEWAY,
            Self::Store(e) => e.status_code(),
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::AdapterNotFound { .. } => "not_found",
            Self::Forbidden => "forbidden",
            Self::NoBackend { .. } => "no_backend",
            Self::UnknownSession => "unknown_session",
            Self::UpstreamConnect(_) => "upstream_connect",
            Self::Store(e) => e.error_type(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::AdapterNotFound { name } => format!("adapter not found: {name}"),
            Self::Forbidden => "you do not have permission to use this adapter".to_owned(),
            Self::NoBackend { workload } => format!("no backend available for: {workload}"),
            Self::UnknownSession => "unknown session, re-initialize the connection".to_owned(),
            Self::UpstreamConnect(_) => "failed to reach the backend".to_owned(),
            Self::Store(e) => e.client_message(),
        }
    }
}
