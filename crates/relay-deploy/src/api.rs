//! Narrow seam over the container orchestrator
//!
//! The deployment manager and node-info provider drive this trait;
//! production wiring uses the in-cluster REST implementation and tests
//! substitute a scripted fake.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// Port adapter and tool containers listen on
pub const CONTAINER_PORT: u16 = 8000;

/// Workload flavors, reflected in the `adapter/type` pod label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    /// MCP server replica set with a headless service, routed per
    /// ordinal for session affinity
    Mcp,
    /// Tool replica set with a cluster-IP service, routed by name
    Tool,
}

impl WorkloadKind {
    /// Label value for this kind
    pub const fn label_value(self) -> &'static str {
        match self {
            Self::Mcp => "mcp",
            Self::Tool => "tool",
        }
    }
}

/// Companion service name for a workload
pub fn service_name(workload: &str) -> String {
    format!("{workload}-service")
}

/// Desired state of a stateful replica set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSetSpec {
    /// Replica-set name (equals the record name)
    pub name: String,
    /// Pod template labels
    pub labels: BTreeMap<String, String>,
    /// Fully qualified container image
    pub image: String,
    /// Container environment
    pub env: BTreeMap<String, String>,
    /// Desired replica count
    pub replicas: u32,
    /// Governing service name (per-pod DNS for stateful ordinals)
    pub service_name: String,
    /// Container port
    pub container_port: u16,
}

/// Partial update for a replica set; absent fields are left untouched.
/// Identity labels are deliberately not patchable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplicaSetPatch {
    pub replicas: Option<u32>,
    pub image: Option<String>,
    pub env: Option<BTreeMap<String, String>>,
}

impl ReplicaSetPatch {
    /// Whether the patch changes anything
    pub const fn is_empty(&self) -> bool {
        self.replicas.is_none() && self.image.is_none() && self.env.is_none()
    }
}

/// Observed state of a replica set
#[derive(Debug, Default, Clone)]
pub struct ReplicaSetView {
    pub desired_replicas: u32,
    pub ready_replicas: u32,
    pub updated_replicas: u32,
    pub available_replicas: u32,
    /// Container image, `None` when container info is missing
    pub image: Option<String>,
    pub env: BTreeMap<String, String>,
}

/// Desired state of a companion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Service name (`<workload>-service`)
    pub name: String,
    /// Pod selector labels
    pub selector: BTreeMap<String, String>,
    /// Exposed port
    pub port: u16,
    /// Container port behind the service
    pub target_port: u16,
    /// Headless (no cluster IP) so per-pod DNS names resolve
    pub headless: bool,
}

/// One address from the orchestrator's endpoint objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    pub ip: String,
    /// Pod hostname (`<workload>-<ordinal>` for stateful sets)
    pub hostname: Option<String>,
    /// Port from the endpoint subset, when published
    pub port: Option<u16>,
}

/// Errors from the orchestrator API
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Object already exists
    #[error("conflict: {name}")]
    Conflict { name: String },

    /// Object does not exist
    #[error("not found: {name}")]
    NotFound { name: String },

    /// Unexpected API status
    #[error("orchestrator returned {code}: {message}")]
    Status { code: u16, message: String },

    /// Connection or protocol failure
    #[error("orchestrator transport: {0}")]
    Transport(String),
}

/// Operations the gateway needs from the orchestrator
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    async fn create_replica_set(&self, spec: &ReplicaSetSpec) -> Result<(), OrchestratorError>;

    async fn get_replica_set(&self, name: &str) -> Result<ReplicaSetView, OrchestratorError>;

    async fn patch_replica_set(&self, name: &str, patch: &ReplicaSetPatch) -> Result<(), OrchestratorError>;

    async fn delete_replica_set(&self, name: &str) -> Result<(), OrchestratorError>;

    async fn create_service(&self, spec: &ServiceSpec) -> Result<(), OrchestratorError>;

    async fn delete_service(&self, name: &str) -> Result<(), OrchestratorError>;

    /// Addresses currently backing a service
    async fn list_endpoints(&self, service: &str) -> Result<Vec<EndpointAddress>, OrchestratorError>;

    /// Tail of a pod's log
    async fn pod_logs(&self, pod: &str, tail_lines: u32) -> Result<String, OrchestratorError>;
}
