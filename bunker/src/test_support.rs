//! In-memory doubles for the storage and network ports, shared by the unit
//! tests across the planes.

use crate::domain::{FetchRequest, FetchResponse, StoredResponse};
use crate::ports::{CachePartition, CacheStorage, NetworkFetch};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use shared::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryPartition {
    entries: RwLock<HashMap<String, StoredResponse>>,
}

#[async_trait]
impl CachePartition for MemoryPartition {
    async fn put(&self, key: String, response: StoredResponse) -> Result<()> {
        self.entries.write().await.insert(key, response);
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    partitions: RwLock<HashMap<String, Arc<MemoryPartition>>>,
    fail_delete: RwLock<HashSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `delete_partition` fail for this name, for best-effort sweep tests.
    pub async fn fail_delete_of(&self, name: &str) {
        self.fail_delete.write().await.insert(name.to_string());
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CachePartition>> {
        let mut partitions = self.partitions.write().await;
        let partition = partitions
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryPartition::default()))
            .clone();
        Ok(partition)
    }

    async fn partition_names(&self) -> Result<Vec<String>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn delete_partition(&self, name: &str) -> Result<bool> {
        if self.fail_delete.read().await.contains(name) {
            return Err(Error::Storage(format!("refusing to delete '{}'", name)));
        }
        Ok(self.partitions.write().await.remove(name).is_some())
    }
}

/// Scripted network double: serves registered URLs, answers 404 otherwise,
/// and can be switched "offline" so every fetch fails.
#[derive(Default)]
pub struct StubFetcher {
    responses: RwLock<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn serve(&self, url: &str, body: &str) {
        self.serve_with(url, body, "text/html").await;
    }

    pub async fn serve_with(&self, url: &str, body: &str, content_type: &str) {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(CONTENT_TYPE, value);
        }
        self.responses.write().await.insert(
            url.to_string(),
            FetchResponse::new(StatusCode::OK, headers, body.to_string()),
        );
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkFetch for StubFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        match self.responses.read().await.get(request.url.as_str()) {
            Some(response) => Ok(response.clone()),
            None => Ok(FetchResponse::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                "",
            )),
        }
    }
}

/// Poll a partition until a background write lands.
pub async fn wait_for_entry(partition: Arc<dyn CachePartition>, key: &str) -> StoredResponse {
    for _ in 0..100 {
        if let Some(stored) = partition.lookup(key).await.unwrap() {
            return stored;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("entry '{}' never appeared in cache", key);
}
