use crate::domain::response::{InstallReport, SweepReport};
use crate::domain::{FetchRequest, FetchResponse, Generation};
use crate::events::CacheEvent;
use crate::planes::control::{LifecycleOperations, LifecycleService};
use crate::planes::data::{FetchOperations, FetchService};
use crate::ports::{CacheStorage, NetworkFetch};
use shared::{Error, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

/// Worker lifecycle states. Transitions are driven by the host; the handler
/// futures gate them, so a state only advances once its handler resolved Ok.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Install handler may run.
    Installing,
    /// Seeds are cached; waiting on the host to activate.
    Installed,
    /// Activation sweep in flight.
    Activating,
    /// Controlling requests; fetch interception allowed.
    Active,
    /// Install failed; the host keeps the previous version.
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Active)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Active => write!(f, "active"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

/// The offline cache proxy: one worker per origin, assembled from the storage
/// and network ports plus the generation constants. The host calls `install`,
/// then `activate`, then routes every intercepted request through
/// `handle_fetch`.
pub struct Worker {
    state: RwLock<WorkerState>,
    lifecycle: LifecycleService,
    fetch: FetchService,
}

impl Worker {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn NetworkFetch>,
        generation: Generation,
        origin: Url,
        offline_url: Url,
        seeds: Vec<Url>,
        same_origin_only: bool,
    ) -> Self {
        let lifecycle = LifecycleService::new(
            storage.clone(),
            fetcher.clone(),
            generation.clone(),
            seeds,
        );
        let fetch = FetchService::new(
            storage,
            fetcher,
            generation,
            origin,
            offline_url,
            same_origin_only,
        );
        Self {
            state: RwLock::new(WorkerState::Installing),
            lifecycle,
            fetch,
        }
    }

    pub fn with_event_broadcaster(self, broadcaster: broadcast::Sender<CacheEvent>) -> Self {
        let Worker {
            state,
            lifecycle,
            fetch,
        } = self;
        Self {
            state,
            lifecycle,
            fetch: fetch.with_event_broadcaster(broadcaster),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn generation(&self) -> &Generation {
        self.lifecycle.generation()
    }

    async fn expect_state(&self, expected: WorkerState) -> Result<()> {
        let state = *self.state.read().await;
        if state != expected {
            return Err(Error::InvalidState {
                expected: expected.to_string(),
                actual: state.to_string(),
            });
        }
        Ok(())
    }

    /// Run the install handler. On failure the worker becomes redundant and
    /// never activates.
    pub async fn install(&self) -> Result<InstallReport> {
        self.expect_state(WorkerState::Installing).await?;
        match self.lifecycle.install().await {
            Ok(report) => {
                *self.state.write().await = WorkerState::Installed;
                Ok(report)
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    /// Run the activation sweep and start intercepting fetches.
    pub async fn activate(&self) -> Result<SweepReport> {
        self.expect_state(WorkerState::Installed).await?;
        *self.state.write().await = WorkerState::Activating;
        let report = self.lifecycle.activate().await?;
        *self.state.write().await = WorkerState::Active;
        info!(
            "Worker active on generation '{}'",
            self.generation().partition_name()
        );
        Ok(report)
    }

    /// Route one intercepted request. Refused unless the worker is active.
    pub async fn handle_fetch(&self, request: FetchRequest) -> Result<Option<FetchResponse>> {
        let state = *self.state.read().await;
        if !state.can_intercept_fetch() {
            return Err(Error::InvalidState {
                expected: WorkerState::Active.to_string(),
                actual: state.to_string(),
            });
        }
        self.fetch.handle_fetch(request).await
    }
}
