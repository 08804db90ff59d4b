use async_trait::async_trait;
use bunker::domain::StoredResponse;
use bunker::ports::{CachePartition, CacheStorage};
use moka::future::Cache;
use shared::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One named partition backed by a moka future cache.
pub struct MokaPartition {
    entries: Cache<String, StoredResponse>,
}

impl MokaPartition {
    fn new(max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = max_entries {
            builder = builder.max_capacity(max);
        }
        Self {
            entries: builder.build(),
        }
    }
}

#[async_trait]
impl CachePartition for MokaPartition {
    async fn put(&self, key: String, response: StoredResponse) -> Result<()> {
        self.entries.insert(key, response).await;
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>> {
        Ok(self.entries.get(key).await)
    }
}

/// In-memory cache storage: a registry of lazily created moka partitions.
/// Loses everything on restart; the sled backend is the persistent one.
pub struct MokaStorage {
    partitions: RwLock<HashMap<String, Arc<MokaPartition>>>,
    max_entries_per_partition: Option<u64>,
}

impl MokaStorage {
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            max_entries_per_partition: None,
        }
    }

    pub fn bounded(max_entries_per_partition: u64) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            max_entries_per_partition: Some(max_entries_per_partition),
        }
    }
}

impl Default for MokaStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MokaStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MokaPartition::new(self.max_entries_per_partition)))
            .clone();
        Ok(partition)
    }

    async fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn delete_partition(&self, name: &str) -> Result<bool> {
        Ok(self.partitions.write().await.remove(name).is_some())
    }
}
