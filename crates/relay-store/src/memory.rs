use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::resource::{Named, ResourceStore};
use crate::session::SessionStore;

/// Process-local resource store for development and tests
#[derive(Debug, Default)]
pub struct MemoryResourceStore<R> {
    records: DashMap<String, R>,
}

impl<R> MemoryResourceStore<R> {
    pub fn new() -> Self {
        Self { records: DashMap::new() }
    }
}

#[async_trait]
impl<R> ResourceStore<R> for MemoryResourceStore<R>
where
    R: Named + Clone + Send + Sync + 'static,
{
    async fn try_get(&self, name: &str) -> Result<Option<R>, StoreError> {
        Ok(self.records.get(name).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, record: R) -> Result<(), StoreError> {
        self.records.insert(record.name().to_owned(), record);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.records.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.records.iter().map(|entry| entry.value().clone()).collect())
    }
}

/// Process-local session store for development and tests
///
/// Entries never expire; the distributed backend owns TTL semantics.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.sessions.get(session_id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, session_id: &str, target: &str) -> Result<(), StoreError> {
        self.sessions.insert(session_id.to_owned(), target.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relay_core::AdapterRecord;

    use super::*;

    fn record(name: &str) -> AdapterRecord {
        AdapterRecord {
            id: "0".to_owned(),
            name: name.to_owned(),
            image_name: "img".to_owned(),
            image_version: "v1".to_owned(),
            environment_variables: std::collections::HashMap::new(),
            replica_count: 1,
            description: String::new(),
            use_workload_identity: false,
            required_roles: Vec::new(),
            created_by: "u1".to_owned(),
            created_at: chrono::Utc::now(),
            last_updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = MemoryResourceStore::new();
        store.upsert(record("a1")).await.unwrap();

        let fetched = store.try_get("a1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "a1");
        assert!(store.try_get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = MemoryResourceStore::new();
        store.upsert(record("a1")).await.unwrap();
        store.upsert(record("a1")).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_absent_is_success() {
        let store: MemoryResourceStore<AdapterRecord> = MemoryResourceStore::new();
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn session_set_then_get() {
        let store = MemorySessionStore::new();
        store.set("s-1", "http://a1-0:8000").await.unwrap();

        assert_eq!(store.get("s-1").await.unwrap().unwrap(), "http://a1-0:8000");
        assert!(store.get("s-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_set_is_last_writer_wins() {
        let store = MemorySessionStore::new();
        store.set("s-1", "http://a1-0:8000").await.unwrap();
        store.set("s-1", "http://a1-1:8000").await.unwrap();

        assert_eq!(store.get("s-1").await.unwrap().unwrap(), "http://a1-1:8000");
    }
}
