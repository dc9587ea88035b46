use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use relay_deploy::{DeployError, NodeInfoProvider};
use relay_store::SessionStore;

use crate::error::ProxyError;

/// Backend chosen for one incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedBackend {
    /// No session header was present; a replica was picked fresh and
    /// the session should be bound once the upstream assigns an id
    New { target: String },
    /// The session header mapped to an already-pinned replica
    Existing { target: String },
}

impl RoutedBackend {
    /// Target URL regardless of how it was chosen
    pub fn target(&self) -> &str {
        match self {
            Self::New { target } | Self::Existing { target } => target,
        }
    }
}

/// Decides the backend for a new or existing MCP session
pub struct SessionRouter {
    sessions: Arc<dyn SessionStore>,
    nodes: Arc<NodeInfoProvider>,
    counter: AtomicUsize,
}

impl SessionRouter {
    pub fn new(sessions: Arc<dyn SessionStore>, nodes: Arc<NodeInfoProvider>) -> Self {
        Self {
            sessions,
            nodes,
            counter: AtomicUsize::new(0),
        }
    }

    /// Pick the backend for a request
    ///
    /// Existing sessions route to their pinned replica; a miss means
    /// the session expired and the client must re-initialize. New
    /// sessions round-robin over the workload's current endpoints.
    pub async fn route(&self, workload: &str, session_id: Option<&str>) -> Result<RoutedBackend, ProxyError> {
        if let Some(session_id) = session_id {
            let target = self.sessions.get(session_id).await?.ok_or(ProxyError::UnknownSession)?;
            return Ok(RoutedBackend::Existing { target });
        }

        let endpoints = self.nodes.resolve(workload).await.map_err(|e| match e {
            DeployError::NoEndpoints { workload } | DeployError::NotFound { name: workload } => {
                ProxyError::NoBackend { workload }
            }
            DeployError::Upstream(message) => ProxyError::UpstreamConnect(message),
        })?;

        let index = self.counter.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(RoutedBackend::New {
            target: endpoints[index].address.clone(),
        })
    }

    /// Pin a freshly initialized session to its backend
    ///
    /// Called once per session, when the first upstream response
    /// carries the session header. This is the only session write path.
    pub async fn bind(&self, session_id: &str, target: &str) -> Result<(), ProxyError> {
        self.sessions.set(session_id, target).await?;
        tracing::debug!(session = session_id, target, "session bound to backend");
        Ok(())
    }
}
