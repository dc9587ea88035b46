//! Redis-backed store implementations
//!
//! Records are stored as JSON under `{prefix}:{kind}:{name}` with a
//! name index at `{prefix}:{kind}:index`. The index can briefly lead
//! the records (a delete between SMEMBERS and MGET); such entries are
//! dropped from list results.

use std::marker::PhantomData;

use async_trait::async_trait;
use redis::AsyncCommands;
use relay_config::StoreConfig;
use secrecy::ExposeSecret;

use crate::error::StoreError;
use crate::resource::{Named, ResourceStore};
use crate::session::SessionStore;

/// Resource store backed by a Redis-compatible cache
pub struct RedisResourceStore<R> {
    client: redis::Client,
    key_prefix: String,
    kind: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> RedisResourceStore<R> {
    /// Create a store for one record kind
    pub fn new(config: &StoreConfig, kind: &'static str) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_ref()
            .ok_or_else(|| StoreError::BackendUnavailable("distributed-cache URL is not configured".to_owned()))?;

        let client = redis::Client::open(url.expose_secret())
            .map_err(|e| StoreError::BackendUnavailable(format!("invalid URL: {e}")))?;

        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
            kind,
            _record: PhantomData,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("connection failed: {e}")))
    }

    fn record_key(&self, name: &str) -> String {
        format!("{}:{}:{name}", self.key_prefix, self.kind)
    }

    fn index_key(&self) -> String {
        format!("{}:{}:index", self.key_prefix, self.kind)
    }
}

#[async_trait]
impl<R> ResourceStore<R> for RedisResourceStore<R>
where
    R: Named + Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
{
    async fn try_get(&self, name: &str) -> Result<Option<R>, StoreError> {
        let mut conn = self.connection().await?;

        let raw: Option<String> = conn
            .get(self.record_key(name))
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("GET failed: {e}")))?;

        raw.map(|data| serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()
    }

    async fn upsert(&self, record: R) -> Result<(), StoreError> {
        let name = record.name().to_owned();
        let data = serde_json::to_string(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut conn = self.connection().await?;
        let () = conn
            .set(self.record_key(&name), data)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("SET failed: {e}")))?;
        let () = conn
            .sadd(self.index_key(), &name)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("SADD failed: {e}")))?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        let () = conn
            .srem(self.index_key(), name)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("SREM failed: {e}")))?;
        let () = conn
            .del(self.record_key(name))
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("DEL failed: {e}")))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        let mut conn = self.connection().await?;

        let names: Vec<String> = conn
            .smembers(self.index_key())
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("SMEMBERS failed: {e}")))?;

        if names.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = names.iter().map(|n| self.record_key(n)).collect();
        let raw: Vec<Option<String>> = conn
            .mget(&keys)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("MGET failed: {e}")))?;

        let mut records = Vec::with_capacity(raw.len());
        for (name, data) in names.iter().zip(raw) {
            // Index entries with no record were deleted mid-listing
            let Some(data) = data else {
                tracing::debug!(kind = self.kind, name, "dropping stale index entry");
                continue;
            };
            let record = serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string()))?;
            records.push(record);
        }

        Ok(records)
    }
}

/// Session store backed by a Redis-compatible cache
///
/// Entries are written with a TTL sized to outlive a long MCP session.
pub struct RedisSessionStore {
    client: redis::Client,
    key_prefix: String,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_ref()
            .ok_or_else(|| StoreError::BackendUnavailable("distributed-cache URL is not configured".to_owned()))?;

        let client = redis::Client::open(url.expose_secret())
            .map_err(|e| StoreError::BackendUnavailable(format!("invalid URL: {e}")))?;

        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.session_ttl_seconds,
        })
    }

    fn session_key(&self, session_id: &str) -> String {
        format!("{}:session:{session_id}", self.key_prefix)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("connection failed: {e}")))?;

        conn.get(self.session_key(session_id))
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("GET failed: {e}")))
    }

    async fn set(&self, session_id: &str, target: &str) -> Result<(), StoreError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("connection failed: {e}")))?;

        let () = conn
            .set_ex(self.session_key(session_id), target, self.ttl_seconds)
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("SETEX failed: {e}")))?;

        Ok(())
    }
}
