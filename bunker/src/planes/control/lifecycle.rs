use crate::domain::response::{InstallReport, SweepReport};
use crate::domain::{FetchRequest, Generation};
use crate::planes::control::operation::LifecycleOperations;
use crate::ports::{CacheStorage, NetworkFetch};
use async_trait::async_trait;
use shared::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Runs the install seeding and the activation sweep against the storage and
/// network ports.
#[derive(Clone)]
pub struct LifecycleService {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn NetworkFetch>,
    generation: Generation,
    seeds: Vec<Url>,
}

impl LifecycleService {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn NetworkFetch>,
        generation: Generation,
        seeds: Vec<Url>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            generation,
            seeds,
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }
}

#[async_trait]
impl LifecycleOperations for LifecycleService {
    async fn install(&self) -> Result<InstallReport> {
        let partition_name = self.generation.partition_name();
        let partition = self.storage.open(&partition_name).await?;

        let mut seeded = Vec::with_capacity(self.seeds.len());
        for seed in &self.seeds {
            let request = FetchRequest::get(seed.clone());
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| Error::InstallFailed(format!("seed fetch {} failed: {}", seed, e)))?;
            if !response.status.is_success() {
                return Err(Error::InstallFailed(format!(
                    "seed {} answered status {}",
                    seed, response.status
                )));
            }

            let key = request.cache_key();
            partition
                .put(key.clone(), response.to_stored())
                .await
                .map_err(|e| Error::InstallFailed(format!("seed write {} failed: {}", seed, e)))?;
            seeded.push(key);
        }

        info!(
            "Installed generation '{}' with {} seed(s)",
            partition_name,
            seeded.len()
        );
        Ok(InstallReport::new(partition_name, seeded))
    }

    async fn activate(&self) -> Result<SweepReport> {
        let names = self.storage.partition_names().await?;

        let mut deleted = Vec::new();
        let mut retained = Vec::new();
        for name in names {
            if !self.generation.owns(&name) || self.generation.is_current(&name) {
                retained.push(name);
                continue;
            }
            // Best effort: a partition that refuses to die should not block
            // the sweep of the others.
            match self.storage.delete_partition(&name).await {
                Ok(true) => {
                    info!("Swept stale partition '{}'", name);
                    deleted.push(name);
                }
                Ok(false) => retained.push(name),
                Err(e) => {
                    warn!("Failed to delete stale partition '{}': {}", name, e);
                    retained.push(name);
                }
            }
        }

        Ok(SweepReport::new(deleted, retained))
    }
}
