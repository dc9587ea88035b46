use async_trait::async_trait;

use crate::error::StoreError;

/// Durable mapping `session-id → backend target URL`
///
/// Entries are written once when a session is initialized and never
/// mutated; they expire with the backend's TTL. Last writer wins, and
/// session ids are assumed globally unique.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend target for a session, `None` when unknown or expired
    async fn get(&self, session_id: &str) -> Result<Option<String>, StoreError>;

    /// Record the backend target for a session
    async fn set(&self, session_id: &str, target: &str) -> Result<(), StoreError>;
}
