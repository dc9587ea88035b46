#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod memory;
mod redis;
mod resource;
mod session;

use std::sync::Arc;

use relay_config::{StoreConfig, StoreKind};

pub use error::StoreError;
pub use memory::{MemoryResourceStore, MemorySessionStore};
pub use redis::{RedisResourceStore, RedisSessionStore};
pub use resource::{Named, ResourceStore};
pub use session::SessionStore;

/// Build the configured resource-store backend for one record kind
///
/// `kind` namespaces the keys of shared backends (`adapter` / `tool`).
pub fn build_resource_store<R>(config: &StoreConfig, kind: &'static str) -> Result<Arc<dyn ResourceStore<R>>, StoreError>
where
    R: Named + Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
{
    match config.kind {
        StoreKind::InMemory => Ok(Arc::new(MemoryResourceStore::new())),
        StoreKind::DistributedCache => Ok(Arc::new(RedisResourceStore::new(config, kind)?)),
        StoreKind::DocumentDb => Err(StoreError::BackendUnavailable(
            "document-db backend is not available in this build".to_owned(),
        )),
    }
}

/// Build the configured session-store backend
pub fn build_session_store(config: &StoreConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    match config.kind {
        StoreKind::InMemory => Ok(Arc::new(MemorySessionStore::new())),
        StoreKind::DistributedCache => Ok(Arc::new(RedisSessionStore::new(config)?)),
        StoreKind::DocumentDb => Err(StoreError::BackendUnavailable(
            "document-db backend is not available in this build".to_owned(),
        )),
    }
}
