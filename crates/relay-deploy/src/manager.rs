use std::collections::BTreeMap;
use std::sync::Arc;

use relay_core::AdapterRecord;
use serde::Serialize;

use crate::api::{
    CONTAINER_PORT, OrchestratorApi, OrchestratorError, ReplicaSetPatch, ReplicaSetSpec, ReplicaSetView, ServiceSpec,
    WorkloadKind, service_name,
};
use crate::error::DeployError;

/// Maximum log lines returned per fetch
const LOG_TAIL_LINES: u32 = 1000;

/// Reconciles adapter/tool records onto orchestrator workloads
///
/// Holds no state of its own; the orchestrator is the source of truth
/// for runtime status.
pub struct DeploymentManager {
    api: Arc<dyn OrchestratorApi>,
    registry: String,
}

/// Runtime status view of a deployed record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub ready_replicas: u32,
    pub updated_replicas: u32,
    pub available_replicas: u32,
    pub image: String,
    pub replica_status: String,
}

impl DeploymentManager {
    pub fn new(api: Arc<dyn OrchestratorApi>, registry: impl Into<String>) -> Self {
        Self {
            api,
            registry: registry.into(),
        }
    }

    /// Create the replica set and companion service for a record
    ///
    /// A `Conflict` from the orchestrator means the workload already
    /// exists; creation proceeds as an upsert.
    pub async fn create(&self, record: &AdapterRecord, kind: WorkloadKind, service_port: u16) -> Result<(), DeployError> {
        let spec = self.replica_set_spec(record, kind);

        match self.api.create_replica_set(&spec).await {
            Ok(()) => {}
            Err(OrchestratorError::Conflict { name }) => {
                tracing::warn!(workload = %name, "replica set already exists, treating create as upsert");
            }
            Err(e) => return Err(e.into()),
        }

        let service = ServiceSpec {
            name: service_name(&record.name),
            selector: BTreeMap::from([("app".to_owned(), record.name.clone())]),
            port: service_port,
            target_port: CONTAINER_PORT,
            headless: kind == WorkloadKind::Mcp,
        };

        match self.api.create_service(&service).await {
            Ok(()) => {}
            Err(OrchestratorError::Conflict { name }) => {
                tracing::warn!(service = %name, "service already exists, treating create as upsert");
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            workload = %record.name,
            kind = kind.label_value(),
            replicas = record.replica_count,
            "deployment created"
        );

        Ok(())
    }

    /// Patch the replica set to match the record
    ///
    /// Only fields that differ from the observed state are included in
    /// the patch; identity labels are never touched and the workload is
    /// never recreated.
    pub async fn update(&self, record: &AdapterRecord) -> Result<(), DeployError> {
        let current = self.api.get_replica_set(&record.name).await?;
        let patch = diff(&current, record, &self.image_ref(record));

        if patch.is_empty() {
            tracing::debug!(workload = %record.name, "replica set already up to date");
            return Ok(());
        }

        self.api.patch_replica_set(&record.name, &patch).await?;

        tracing::info!(workload = %record.name, "deployment updated");
        Ok(())
    }

    /// Delete the replica set and companion service
    ///
    /// `NotFound` on either object is success.
    pub async fn delete(&self, name: &str) -> Result<(), DeployError> {
        match self.api.delete_replica_set(name).await {
            Ok(()) | Err(OrchestratorError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        match self.api.delete_service(&service_name(name)).await {
            Ok(()) | Err(OrchestratorError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(workload = %name, "deployment deleted");
        Ok(())
    }

    /// Runtime status derived from the orchestrator's view
    pub async fn status(&self, name: &str) -> Result<DeploymentStatus, DeployError> {
        let view = self.api.get_replica_set(name).await?;
        Ok(derive_status(&view))
    }

    /// Log tail of one replica; the pod name is `<name>-<ordinal>`
    pub async fn logs(&self, name: &str, ordinal: u32) -> Result<String, DeployError> {
        let pod = format!("{name}-{ordinal}");
        Ok(self.api.pod_logs(&pod, LOG_TAIL_LINES).await?)
    }

    fn replica_set_spec(&self, record: &AdapterRecord, kind: WorkloadKind) -> ReplicaSetSpec {
        ReplicaSetSpec {
            name: record.name.clone(),
            labels: pod_labels(record, kind),
            image: self.image_ref(record),
            env: record
                .environment_variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            replicas: record.replica_count,
            service_name: service_name(&record.name),
            container_port: CONTAINER_PORT,
        }
    }

    fn image_ref(&self, record: &AdapterRecord) -> String {
        if self.registry.is_empty() {
            format!("{}:{}", record.image_name, record.image_version)
        } else {
            format!("{}/{}:{}", self.registry, record.image_name, record.image_version)
        }
    }
}

/// Pod template labels for a record
fn pod_labels(record: &AdapterRecord, kind: WorkloadKind) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_owned(), record.name.clone()),
        ("adapter/type".to_owned(), kind.label_value().to_owned()),
        (
            "workload-identity/use".to_owned(),
            record.use_workload_identity.to_string(),
        ),
    ])
}

/// Patch containing only the fields where `record` differs from the
/// observed state
fn diff(current: &ReplicaSetView, record: &AdapterRecord, image: &str) -> ReplicaSetPatch {
    let mut patch = ReplicaSetPatch::default();

    if current.desired_replicas != record.replica_count {
        patch.replicas = Some(record.replica_count);
    }

    if current.image.as_deref() != Some(image) {
        patch.image = Some(image.to_owned());
    }

    let desired_env: BTreeMap<String, String> = record
        .environment_variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if current.env != desired_env {
        patch.env = Some(desired_env);
    }

    patch
}

fn derive_status(view: &ReplicaSetView) -> DeploymentStatus {
    let replica_status = if view.ready_replicas == view.desired_replicas && view.desired_replicas > 0 {
        "Healthy".to_owned()
    } else {
        format!("Degraded: {}/{} ready", view.ready_replicas, view.desired_replicas)
    };

    DeploymentStatus {
        ready_replicas: view.ready_replicas,
        updated_replicas: view.updated_replicas,
        available_replicas: view.available_replicas,
        image: view.image.clone().unwrap_or_else(|| "Unknown".to_owned()),
        replica_status,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::api::EndpointAddress;

    fn record(name: &str, replicas: u32) -> AdapterRecord {
        AdapterRecord {
            id: "0".to_owned(),
            name: name.to_owned(),
            image_name: "img".to_owned(),
            image_version: "v1".to_owned(),
            environment_variables: HashMap::from([("K".to_owned(), "old".to_owned())]),
            replica_count: replicas,
            description: String::new(),
            use_workload_identity: true,
            required_roles: Vec::new(),
            created_by: "u1".to_owned(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct FakeOrchestrator {
        view: Mutex<ReplicaSetView>,
        conflict_on_create: bool,
        calls: Mutex<Vec<String>>,
        patches: Mutex<Vec<ReplicaSetPatch>>,
    }

    #[async_trait]
    impl OrchestratorApi for FakeOrchestrator {
        async fn create_replica_set(&self, spec: &ReplicaSetSpec) -> Result<(), OrchestratorError> {
            self.calls.lock().unwrap().push(format!("create-rs:{}", spec.name));
            if self.conflict_on_create {
                return Err(OrchestratorError::Conflict { name: spec.name.clone() });
            }
            Ok(())
        }

        async fn get_replica_set(&self, _name: &str) -> Result<ReplicaSetView, OrchestratorError> {
            Ok(self.view.lock().unwrap().clone())
        }

        async fn patch_replica_set(&self, name: &str, patch: &ReplicaSetPatch) -> Result<(), OrchestratorError> {
            self.calls.lock().unwrap().push(format!("patch-rs:{name}"));
            self.patches.lock().unwrap().push(patch.clone());
            Ok(())
        }

        async fn delete_replica_set(&self, name: &str) -> Result<(), OrchestratorError> {
            self.calls.lock().unwrap().push(format!("delete-rs:{name}"));
            Err(OrchestratorError::NotFound { name: name.to_owned() })
        }

        async fn create_service(&self, spec: &ServiceSpec) -> Result<(), OrchestratorError> {
            self.calls.lock().unwrap().push(format!("create-svc:{}", spec.name));
            Ok(())
        }

        async fn delete_service(&self, name: &str) -> Result<(), OrchestratorError> {
            self.calls.lock().unwrap().push(format!("delete-svc:{name}"));
            Err(OrchestratorError::NotFound { name: name.to_owned() })
        }

        async fn list_endpoints(&self, _service: &str) -> Result<Vec<EndpointAddress>, OrchestratorError> {
            Ok(Vec::new())
        }

        async fn pod_logs(&self, pod: &str, _tail_lines: u32) -> Result<String, OrchestratorError> {
            Ok(format!("logs from {pod}"))
        }
    }

    #[tokio::test]
    async fn create_builds_replica_set_and_service() {
        let api = Arc::new(FakeOrchestrator::default());
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        manager.create(&record("a1", 2), WorkloadKind::Mcp, CONTAINER_PORT).await.unwrap();

        let calls = api.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["create-rs:a1".to_owned(), "create-svc:a1-service".to_owned()]);
    }

    #[tokio::test]
    async fn create_treats_conflict_as_upsert() {
        let api = Arc::new(FakeOrchestrator {
            conflict_on_create: true,
            ..FakeOrchestrator::default()
        });
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        manager.create(&record("a1", 1), WorkloadKind::Mcp, CONTAINER_PORT).await.unwrap();
    }

    #[tokio::test]
    async fn update_patches_only_differing_fields() {
        let api = Arc::new(FakeOrchestrator::default());
        *api.view.lock().unwrap() = ReplicaSetView {
            desired_replicas: 2,
            image: Some("registry.local/img:v1".to_owned()),
            env: BTreeMap::from([("K".to_owned(), "old".to_owned())]),
            ..ReplicaSetView::default()
        };
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        manager.update(&record("a1", 3)).await.unwrap();

        let patches = api.patches.lock().unwrap().clone();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].replicas, Some(3));
        assert!(patches[0].image.is_none());
        assert!(patches[0].env.is_none());
    }

    #[tokio::test]
    async fn update_with_no_changes_skips_patch() {
        let api = Arc::new(FakeOrchestrator::default());
        *api.view.lock().unwrap() = ReplicaSetView {
            desired_replicas: 1,
            image: Some("registry.local/img:v1".to_owned()),
            env: BTreeMap::from([("K".to_owned(), "old".to_owned())]),
            ..ReplicaSetView::default()
        };
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        manager.update(&record("a1", 1)).await.unwrap();
        assert!(api.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_workload() {
        let api = Arc::new(FakeOrchestrator::default());
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        manager.delete("gone").await.unwrap();
    }

    #[tokio::test]
    async fn logs_target_the_ordinal_pod() {
        let api = Arc::new(FakeOrchestrator::default());
        let manager = DeploymentManager::new(Arc::clone(&api) as Arc<dyn OrchestratorApi>, "registry.local");

        let logs = manager.logs("a1", 2).await.unwrap();
        assert_eq!(logs, "logs from a1-2");
    }

    #[test]
    fn status_is_healthy_when_all_ready() {
        let status = derive_status(&ReplicaSetView {
            desired_replicas: 2,
            ready_replicas: 2,
            updated_replicas: 2,
            available_replicas: 2,
            image: Some("img:v1".to_owned()),
            env: BTreeMap::new(),
        });
        assert_eq!(status.replica_status, "Healthy");
        assert_eq!(status.image, "img:v1");
    }

    #[test]
    fn status_is_degraded_when_replicas_missing() {
        let status = derive_status(&ReplicaSetView {
            desired_replicas: 3,
            ready_replicas: 1,
            ..ReplicaSetView::default()
        });
        assert_eq!(status.replica_status, "Degraded: 1/3 ready");
    }

    #[test]
    fn status_is_degraded_when_zero_desired() {
        let status = derive_status(&ReplicaSetView::default());
        assert_eq!(status.replica_status, "Degraded: 0/0 ready");
        assert_eq!(status.image, "Unknown");
    }

    #[test]
    fn pod_labels_carry_identity() {
        let labels = pod_labels(&record("a1", 1), WorkloadKind::Tool);
        assert_eq!(labels.get("app").unwrap(), "a1");
        assert_eq!(labels.get("adapter/type").unwrap(), "tool");
        assert_eq!(labels.get("workload-identity/use").unwrap(), "true");
    }
}
