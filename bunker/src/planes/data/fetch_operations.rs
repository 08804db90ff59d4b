use crate::domain::{FetchRequest, FetchResponse, Generation, RequestClass, StoredResponse};
use crate::events::{now_timestamp, CacheEvent, WriteCompletedEvent, WriteFailedEvent};
use crate::planes::data::operation::FetchOperations;
use crate::planes::data::router::{RoutingTable, Strategy};
use crate::ports::{CacheStorage, NetworkFetch};
use async_trait::async_trait;
use shared::{Error, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

/// Application service that routes intercepted requests through the policy
/// table. This is the fetch-handler entry point while the worker is active.
#[derive(Clone)]
pub struct FetchService {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn NetworkFetch>,
    generation: Generation,
    origin: Url,
    offline_url: Url,
    same_origin_only: bool,
    table: RoutingTable,
    event_broadcaster: Option<broadcast::Sender<CacheEvent>>,
}

impl FetchService {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn NetworkFetch>,
        generation: Generation,
        origin: Url,
        offline_url: Url,
        same_origin_only: bool,
    ) -> Self {
        Self {
            storage,
            fetcher,
            generation,
            origin,
            offline_url,
            same_origin_only,
            table: RoutingTable::standard(),
            event_broadcaster: None,
        }
    }

    pub fn with_event_broadcaster(mut self, broadcaster: broadcast::Sender<CacheEvent>) -> Self {
        self.event_broadcaster = Some(broadcaster);
        self
    }

    pub fn with_routing_table(mut self, table: RoutingTable) -> Self {
        self.table = table;
        self
    }

    fn offline_key(&self) -> String {
        format!("GET {}", self.offline_url)
    }

    async fn lookup(&self, key: &str) -> Result<Option<FetchResponse>> {
        let partition = self.storage.open(&self.generation.partition_name()).await?;
        Ok(partition
            .lookup(key)
            .await?
            .map(StoredResponse::into_response))
    }

    /// The last line of defense: the offline page seeded at install time.
    async fn offline_fallback(&self) -> Result<FetchResponse> {
        match self.lookup(&self.offline_key()).await? {
            Some(response) => Ok(response),
            None => Err(Error::Unreachable),
        }
    }

    /// Spawn a detached write of a captured response. The response path never
    /// awaits this task; a failed write is logged and broadcast, nothing more.
    fn spawn_cache_write(&self, key: String, stored: StoredResponse) {
        let storage = self.storage.clone();
        let partition_name = self.generation.partition_name();
        let broadcaster = self.event_broadcaster.clone();
        let body_size = stored.body.len();

        tokio::spawn(async move {
            let outcome = match storage.open(&partition_name).await {
                Ok(partition) => partition.put(key.clone(), stored).await,
                Err(e) => Err(e),
            };

            let event = match outcome {
                Ok(()) => {
                    debug!("Cached '{}' in partition '{}'", key, partition_name);
                    CacheEvent::WriteCompleted(WriteCompletedEvent {
                        partition: partition_name,
                        key,
                        body_size,
                        timestamp: now_timestamp(),
                    })
                }
                Err(e) => {
                    warn!(
                        "Background cache write of '{}' into '{}' failed: {}",
                        key, partition_name, e
                    );
                    CacheEvent::WriteFailed(WriteFailedEvent {
                        partition: partition_name,
                        key,
                        reason: e.to_string(),
                        timestamp: now_timestamp(),
                    })
                }
            };

            if let Some(broadcaster) = broadcaster {
                if broadcaster.send(event).is_err() {
                    debug!("No subscribers for cache write event");
                }
            }
        });
    }

    /// Non-idempotent branch: forward, and when the network is gone answer
    /// with the offline page instead of surfacing the error. Mutating
    /// requests are never cached.
    async fn network_with_offline_fallback(&self, request: &FetchRequest) -> Result<FetchResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                debug!("Network failed for {} ({}), serving offline page", request.url, e);
                self.offline_fallback().await
            }
        }
    }

    /// Navigation branch: prefer the freshest page, degrade to whatever was
    /// last cached, then to the offline page.
    async fn network_first(&self, request: &FetchRequest) -> Result<FetchResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.spawn_cache_write(request.cache_key(), response.to_stored());
                Ok(response)
            }
            Err(e) => {
                debug!("Network failed for {} ({}), trying cache", request.url, e);
                match self.lookup(&request.cache_key()).await? {
                    Some(cached) => Ok(cached),
                    None => self.offline_fallback().await,
                }
            }
        }
    }

    /// Resource branch: a hit never touches the network; a miss populates the
    /// cache unless the body turned out to be plain text. When both cache and
    /// network come up empty the handler yields no content at all.
    async fn cache_first(&self, request: &FetchRequest) -> Result<Option<FetchResponse>> {
        if let Some(cached) = self.lookup(&request.cache_key()).await? {
            return Ok(Some(cached));
        }
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if !response.is_plain_text() {
                    self.spawn_cache_write(request.cache_key(), response.to_stored());
                }
                Ok(Some(response))
            }
            Err(e) => {
                debug!("Cache miss and network failed for {}: {}", request.url, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl FetchOperations for FetchService {
    async fn handle_fetch(&self, request: FetchRequest) -> Result<Option<FetchResponse>> {
        let class = RequestClass::classify(&request, &self.origin, self.same_origin_only);
        let Some(strategy) = self.table.strategy_for(class) else {
            debug!("No route for {} ({:?}), leaving to the host", request.url, class);
            return Ok(None);
        };

        match strategy {
            Strategy::NetworkWithOfflineFallback => {
                self.network_with_offline_fallback(&request).await.map(Some)
            }
            Strategy::NetworkFirst => self.network_first(&request).await.map(Some),
            Strategy::Bypass => self.fetcher.fetch(&request).await.map(Some),
            Strategy::CacheFirst => self.cache_first(&request).await,
        }
    }
}
