use std::sync::Arc;
use std::time::Duration;

use mini_moka::sync::Cache;
use relay_core::ToolRecord;
use relay_store::{ResourceStore, StoreError};

/// Single cache slot key; the cache holds one raw tool list
const SLOT: u8 = 0;

/// Short-TTL cache of the raw tool-record list
///
/// Permission filtering happens per request on top of the cached list,
/// so a cached entry is safe to share between callers. A stale hit is
/// acceptable; the TTL bounds how long a deleted tool stays listed.
pub struct ToolListCache {
    cache: Cache<u8, Arc<Vec<ToolRecord>>>,
}

impl ToolListCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { cache }
    }

    /// The raw tool list, loading from the store on a cache miss
    pub async fn get_or_load(&self, store: &dyn ResourceStore<ToolRecord>) -> Result<Arc<Vec<ToolRecord>>, StoreError> {
        if let Some(cached) = self.cache.get(&SLOT) {
            return Ok(cached);
        }

        let records = Arc::new(store.list().await?);
        self.cache.insert(SLOT, Arc::clone(&records));
        Ok(records)
    }
}
