use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use relay_auth::{PermissionEvaluator, Protected};
use relay_core::{
    AdapterData, AdapterRecord, Operation, Principal, ToolData, ToolRecord, normalize_roles, valid_resource_name,
};
use relay_deploy::{CONTAINER_PORT, DeploymentManager, DeploymentStatus, WorkloadKind};
use relay_store::{Named, ResourceStore};
use uuid::Uuid;

use crate::error::ControlError;

/// Record kinds the control plane manages
///
/// Adapters and tools share one service implementation; this trait
/// carries the differences: payload shape, workload kind, service
/// port, and record construction.
pub trait ManagedResource: Named + Protected + Clone + Send + Sync + 'static {
    /// Client payload for create/update
    type Data: Send + 'static;

    /// Workload kind passed to the deployment manager
    const KIND: WorkloadKind;

    /// Kind name used in log fields and messages
    const DISPLAY: &'static str;

    /// Name carried in the payload
    fn data_name(data: &Self::Data) -> &str;

    /// Build a fresh record from a payload
    fn build(data: Self::Data, id: String, created_by: String, now: DateTime<Utc>) -> Result<Self, ControlError>;

    /// Merge a payload onto this record, keeping the immutable fields
    /// (`name`, `createdBy`, `createdAt`)
    fn apply_update(&self, data: Self::Data, now: DateTime<Utc>) -> Result<Self, ControlError>;

    /// Adapter view handed to the deployment manager
    fn adapter(&self) -> &AdapterRecord;

    /// Port the companion service exposes
    fn service_port(&self) -> u16;
}

impl ManagedResource for AdapterRecord {
    type Data = AdapterData;

    const KIND: WorkloadKind = WorkloadKind::Mcp;
    const DISPLAY: &'static str = "adapter";

    fn data_name(data: &Self::Data) -> &str {
        &data.name
    }

    fn build(data: Self::Data, id: String, created_by: String, now: DateTime<Utc>) -> Result<Self, ControlError> {
        validate_replicas(data.replica_count)?;

        Ok(Self {
            id,
            name: data.name,
            image_name: data.image_name,
            image_version: data.image_version,
            environment_variables: data.environment_variables,
            replica_count: data.replica_count,
            description: data.description,
            use_workload_identity: data.use_workload_identity,
            required_roles: normalize_roles(&data.required_roles),
            created_by,
            created_at: now,
            last_updated_at: now,
        })
    }

    fn apply_update(&self, data: Self::Data, now: DateTime<Utc>) -> Result<Self, ControlError> {
        validate_replicas(data.replica_count)?;

        Ok(Self {
            id: self.id.clone(),
            name: self.name.clone(),
            image_name: data.image_name,
            image_version: data.image_version,
            environment_variables: data.environment_variables,
            replica_count: data.replica_count,
            description: data.description,
            use_workload_identity: data.use_workload_identity,
            required_roles: normalize_roles(&data.required_roles),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            last_updated_at: now,
        })
    }

    fn adapter(&self) -> &AdapterRecord {
        self
    }

    fn service_port(&self) -> u16 {
        CONTAINER_PORT
    }
}

impl ManagedResource for ToolRecord {
    type Data = ToolData;

    const KIND: WorkloadKind = WorkloadKind::Tool;
    const DISPLAY: &'static str = "tool";

    fn data_name(data: &Self::Data) -> &str {
        &data.adapter.name
    }

    fn build(data: Self::Data, id: String, created_by: String, now: DateTime<Utc>) -> Result<Self, ControlError> {
        validate_tool_name(&data.adapter.name, &data.tool_definition.tool.name)?;

        Ok(Self {
            adapter: AdapterRecord::build(data.adapter, id, created_by, now)?,
            tool_definition: data.tool_definition,
        })
    }

    fn apply_update(&self, data: Self::Data, now: DateTime<Utc>) -> Result<Self, ControlError> {
        validate_tool_name(&self.adapter.name, &data.tool_definition.tool.name)?;

        Ok(Self {
            adapter: self.adapter.apply_update(data.adapter, now)?,
            tool_definition: data.tool_definition,
        })
    }

    fn adapter(&self) -> &AdapterRecord {
        &self.adapter
    }

    fn service_port(&self) -> u16 {
        self.tool_definition.port
    }
}

fn validate_replicas(count: u32) -> Result<(), ControlError> {
    if count == 0 {
        return Err(ControlError::Validation("replicaCount must be positive".to_owned()));
    }
    Ok(())
}

fn validate_tool_name(record_name: &str, tool_name: &str) -> Result<(), ControlError> {
    if record_name != tool_name {
        return Err(ControlError::Validation(format!(
            "toolDefinition.tool.name '{tool_name}' must equal the record name '{record_name}'"
        )));
    }
    Ok(())
}

/// CRUD over one record kind with validation, authorization, and
/// deployment orchestration
pub struct ResourceService<R: ManagedResource> {
    store: Arc<dyn ResourceStore<R>>,
    deploy: Arc<DeploymentManager>,
    permissions: PermissionEvaluator,
}

impl<R: ManagedResource> ResourceService<R> {
    pub fn new(store: Arc<dyn ResourceStore<R>>, deploy: Arc<DeploymentManager>) -> Self {
        Self {
            store,
            deploy,
            permissions: PermissionEvaluator,
        }
    }

    /// Create a record and its workload
    ///
    /// The deployment is requested before the record is persisted: a
    /// persisted record always corresponds to an attempted deployment,
    /// and a failed deployment leaves no record behind.
    pub async fn create(&self, principal: &Principal, data: R::Data) -> Result<R, ControlError> {
        let name = R::data_name(&data).to_owned();
        if !valid_resource_name(&name) {
            return Err(ControlError::Validation(format!(
                "name '{name}' must match ^[a-z0-9-]+$"
            )));
        }

        if self.store.try_get(&name).await?.is_some() {
            return Err(ControlError::Conflict { name });
        }

        let record = R::build(data, Uuid::new_v4().to_string(), principal.user_id.clone(), Utc::now())?;

        self.deploy
            .create(record.adapter(), R::KIND, record.service_port())
            .await?;
        self.store.upsert(record.clone()).await?;

        tracing::info!(kind = R::DISPLAY, name = %name, created_by = %principal.user_id, "resource created");
        Ok(record)
    }

    /// Fetch a record the principal may read
    pub async fn get(&self, principal: &Principal, name: &str) -> Result<R, ControlError> {
        let record = self
            .store
            .try_get(name)
            .await?
            .ok_or_else(|| ControlError::NotFound { name: name.to_owned() })?;

        if !self.permissions.allows(principal, &record, Operation::Read) {
            return Err(ControlError::Forbidden);
        }

        Ok(record)
    }

    /// Update a record, redeploying only when a deployment-relevant
    /// field changed
    ///
    /// `url_name` is the name from the request path; the payload name
    /// must match it (the name is immutable).
    pub async fn update(&self, principal: &Principal, url_name: &str, data: R::Data) -> Result<R, ControlError> {
        if R::data_name(&data) != url_name {
            return Err(ControlError::Validation(format!(
                "name '{}' in the body must equal '{url_name}' from the URL",
                R::data_name(&data)
            )));
        }

        let existing = self
            .store
            .try_get(url_name)
            .await?
            .ok_or_else(|| ControlError::NotFound {
                name: url_name.to_owned(),
            })?;

        if !self.permissions.allows(principal, &existing, Operation::Write) {
            return Err(ControlError::Forbidden);
        }

        let updated = existing.apply_update(data, Utc::now())?;

        let dirty = deployment_dirty(existing.adapter(), updated.adapter());
        if dirty {
            self.deploy.update(updated.adapter()).await?;
        }

        self.store.upsert(updated.clone()).await?;

        tracing::info!(kind = R::DISPLAY, name = %url_name, redeployed = dirty, "resource updated");
        Ok(updated)
    }

    /// Delete a record and its workload
    ///
    /// The record is removed from the store first so a partially
    /// deleted state presents as already gone; workload removal after
    /// that point is best effort.
    pub async fn delete(&self, principal: &Principal, name: &str) -> Result<(), ControlError> {
        let existing = self
            .store
            .try_get(name)
            .await?
            .ok_or_else(|| ControlError::Validation(format!("'{name}' does not exist")))?;

        if !self.permissions.allows(principal, &existing, Operation::Write) {
            return Err(ControlError::Forbidden);
        }

        self.store.delete(name).await?;

        if let Err(e) = self.deploy.delete(name).await {
            tracing::warn!(kind = R::DISPLAY, name = %name, error = %e, "workload removal failed after record delete");
        }

        tracing::info!(kind = R::DISPLAY, name = %name, "resource deleted");
        Ok(())
    }

    /// All records the principal may read, in store order
    pub async fn list(&self, principal: &Principal) -> Result<Vec<R>, ControlError> {
        let all = self.store.list().await?;
        let total = all.len();

        let visible = self.permissions.filter(principal, all, Operation::Read);
        if visible.len() < total {
            tracing::debug!(
                kind = R::DISPLAY,
                filtered = total - visible.len(),
                "records hidden from caller"
            );
        }

        Ok(visible)
    }

    /// Runtime status of the record's workload
    pub async fn status(&self, principal: &Principal, name: &str) -> Result<DeploymentStatus, ControlError> {
        self.get(principal, name).await?;
        Ok(self.deploy.status(name).await?)
    }

    /// Log tail of one replica
    pub async fn logs(&self, principal: &Principal, name: &str, ordinal: u32) -> Result<String, ControlError> {
        self.get(principal, name).await?;
        Ok(self.deploy.logs(name, ordinal).await?)
    }
}

/// Whether an update requires touching the orchestrator
///
/// Environments are compared as sorted key-value sequences, so
/// insertion order never triggers a redeploy.
pub fn deployment_dirty(old: &AdapterRecord, new: &AdapterRecord) -> bool {
    old.replica_count != new.replica_count
        || old.image_name != new.image_name
        || old.image_version != new.image_version
        || sorted_env(&old.environment_variables) != sorted_env(&new.environment_variables)
}

fn sorted_env(env: &HashMap<String, String>) -> Vec<(&str, &str)> {
    let mut pairs: Vec<_> = env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    pairs.sort_unstable();
    pairs
}
