use crate::domain::{FetchRequest, FetchResponse, StoredResponse};
use async_trait::async_trait;
use shared::Result;
use std::sync::Arc;

// Ports are the pluggable extension points for the external collaborators:
// the cache storage substrate and the network stack.

/// Port for one named cache partition.
#[async_trait]
pub trait CachePartition: Send + Sync + 'static {
    /// Insert or overwrite the entry for `key`. A write is atomic from the
    /// caller's perspective.
    async fn put(&self, key: String, response: StoredResponse) -> Result<()>;

    /// Look up a previously captured response.
    async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>>;
}

/// Port for the origin-scoped cache storage substrate. Partitions are created
/// lazily on first open and persist until deleted wholesale.
#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>>;

    async fn partition_names(&self) -> Result<Vec<String>>;

    /// Delete a whole partition. Returns whether it existed.
    async fn delete_partition(&self, name: &str) -> Result<bool>;
}

/// Port for the network stack.
#[async_trait]
pub trait NetworkFetch: Send + Sync + 'static {
    /// Forward a request to the network. Errors mean the network was
    /// unreachable or the transfer failed; HTTP error statuses are responses,
    /// not errors.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}
