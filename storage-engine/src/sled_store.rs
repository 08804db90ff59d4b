use async_trait::async_trait;
use bunker::domain::StoredResponse;
use bunker::ports::{CachePartition, CacheStorage};
use shared::{Error, Result};
use std::path::Path;
use std::sync::Arc;

// sled's own default tree; never surfaced as a partition.
const DEFAULT_TREE: &[u8] = b"__sled__default";

/// One named partition backed by a sled tree. Entries are serde_json-encoded
/// `StoredResponse` values and survive process restarts.
pub struct SledPartition {
    tree: sled::Tree,
}

#[async_trait]
impl CachePartition for SledPartition {
    async fn put(&self, key: String, response: StoredResponse) -> Result<()> {
        let value = serde_json::to_vec(&response)
            .map_err(|e| Error::Storage(format!("Failed to serialize response: {}", e)))?;

        self.tree
            .insert(key.as_bytes(), value)
            .map_err(|e| Error::Storage(format!("Failed to write entry: {}", e)))?;

        self.tree
            .flush()
            .map_err(|e| Error::Storage(format!("Failed to flush partition: {}", e)))?;

        Ok(())
    }

    async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>> {
        let value = self
            .tree
            .get(key.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to read entry: {}", e)))?;

        match value {
            Some(bytes) => {
                let response: StoredResponse = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Storage(format!("Failed to deserialize response: {}", e)))?;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }
}

/// Persistent cache storage: one sled tree per partition, trees created
/// lazily on first open and dropped wholesale by the activation sweep.
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    /// Open (or create) the backing database. Creates the parent directory
    /// if it doesn't exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open sled database: {}", e)))?;

        Ok(Self { db })
    }
}

#[async_trait]
impl CacheStorage for SledStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>> {
        let tree = self
            .db
            .open_tree(name.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to open partition '{}': {}", name, e)))?;
        Ok(Arc::new(SledPartition { tree }))
    }

    async fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self
            .db
            .tree_names()
            .into_iter()
            .filter(|name| name.as_ref() != DEFAULT_TREE)
            .filter_map(|name| String::from_utf8(name.to_vec()).ok())
            .collect())
    }

    async fn delete_partition(&self, name: &str) -> Result<bool> {
        self.db
            .drop_tree(name.as_bytes())
            .map_err(|e| Error::Storage(format!("Failed to delete partition '{}': {}", name, e)))
    }
}
