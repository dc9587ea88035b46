use async_trait::async_trait;
use relay_core::{AdapterRecord, ToolRecord};

use crate::error::StoreError;

/// Records addressable by their unique name
pub trait Named {
    /// Unique name within the record's kind
    fn name(&self) -> &str;
}

impl Named for AdapterRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ToolRecord {
    fn name(&self) -> &str {
        &self.adapter.name
    }
}

/// Durable mapping `name → record`
///
/// The store exclusively owns persisted records; all other components
/// hold read-only views and re-read to observe mutations. Changes by
/// any gateway replica become visible to all within one consistency
/// window of the backing store.
#[async_trait]
pub trait ResourceStore<R>: Send + Sync {
    /// Fetch a record by name, `None` when absent
    async fn try_get(&self, name: &str) -> Result<Option<R>, StoreError>;

    /// Insert or replace a record; idempotent
    async fn upsert(&self, record: R) -> Result<(), StoreError>;

    /// Delete a record by name; absent is success
    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    /// All records of this kind
    async fn list(&self) -> Result<Vec<R>, StoreError>;
}
