use std::sync::Arc;
use std::time::Duration;

use mini_moka::sync::Cache;

use crate::api::{CONTAINER_PORT, EndpointAddress, OrchestratorApi, service_name};
use crate::error::DeployError;

/// One replica of a workload, addressable over HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaEndpoint {
    pub workload: String,
    pub ordinal: u32,
    /// Scheme-qualified address (`http://host:port`)
    pub address: String,
}

/// Resolves a workload name to the current set of replica endpoints
///
/// Results are cached briefly per process; stale endpoints are
/// tolerated by the proxy, which surfaces the connect failure and the
/// session is treated as broken.
pub struct NodeInfoProvider {
    api: Arc<dyn OrchestratorApi>,
    namespace: String,
    cache: Cache<String, Arc<Vec<ReplicaEndpoint>>>,
}

impl NodeInfoProvider {
    pub fn new(api: Arc<dyn OrchestratorApi>, namespace: impl Into<String>, cache_ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1024).time_to_live(cache_ttl).build();

        Self {
            api,
            namespace: namespace.into(),
            cache,
        }
    }

    /// Endpoints of a workload, ordered by ordinal
    ///
    /// # Errors
    ///
    /// `DeployError::NoEndpoints` when the service has no addresses
    pub async fn resolve(&self, workload: &str) -> Result<Arc<Vec<ReplicaEndpoint>>, DeployError> {
        if let Some(cached) = self.cache.get(&workload.to_owned()) {
            return Ok(cached);
        }

        let service = service_name(workload);
        let addresses = self.api.list_endpoints(&service).await?;

        if addresses.is_empty() {
            return Err(DeployError::NoEndpoints {
                workload: workload.to_owned(),
            });
        }

        let mut endpoints: Vec<ReplicaEndpoint> = addresses
            .iter()
            .enumerate()
            .map(|(i, addr)| self.to_endpoint(workload, &service, addr, i as u32))
            .collect();
        endpoints.sort_by_key(|e| e.ordinal);

        let endpoints = Arc::new(endpoints);
        self.cache.insert(workload.to_owned(), Arc::clone(&endpoints));
        Ok(endpoints)
    }

    /// Build the stable per-pod address
    ///
    /// Stateful replicas carry their `<workload>-<ordinal>` hostname in
    /// the endpoint object; the headless service makes that name
    /// resolve directly. Addresses without a hostname fall back to the
    /// pod IP and positional ordinal.
    fn to_endpoint(&self, workload: &str, service: &str, addr: &EndpointAddress, position: u32) -> ReplicaEndpoint {
        let port = addr.port.unwrap_or(CONTAINER_PORT);
        match addr.hostname.as_deref() {
            Some(hostname) => ReplicaEndpoint {
                workload: workload.to_owned(),
                ordinal: parse_ordinal(hostname).unwrap_or(position),
                address: format!("http://{hostname}.{service}.{}.svc.cluster.local:{port}", self.namespace),
            },
            None => ReplicaEndpoint {
                workload: workload.to_owned(),
                ordinal: position,
                address: format!("http://{}:{port}", addr.ip),
            },
        }
    }
}

/// Ordinal suffix of a stateful pod hostname (`name-3` → 3)
fn parse_ordinal(hostname: &str) -> Option<u32> {
    hostname.rsplit_once('-').and_then(|(_, suffix)| suffix.parse().ok())
}
