#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod api;
mod endpoints;
mod error;
mod kube;
mod manager;

pub use api::{
    CONTAINER_PORT, EndpointAddress, OrchestratorApi, OrchestratorError, ReplicaSetPatch, ReplicaSetSpec,
    ReplicaSetView, ServiceSpec, WorkloadKind, service_name,
};
pub use endpoints::{NodeInfoProvider, ReplicaEndpoint};
pub use error::DeployError;
pub use kube::RestOrchestrator;
pub use manager::{DeploymentManager, DeploymentStatus};
