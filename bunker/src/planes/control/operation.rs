use crate::domain::response::{InstallReport, SweepReport};
use async_trait::async_trait;
use shared::Result;

/// Lifecycle handlers the host runs during its `install`/`activate`
/// transitions. The transition is gated on the returned future: the host does
/// not move the worker to the next state until the handler resolves.
#[async_trait]
pub trait LifecycleOperations: Send + Sync + 'static {
    /// Seed the current generation's partition. Failure fails the whole
    /// install; the host keeps the previous version active.
    async fn install(&self) -> Result<InstallReport>;

    /// Sweep stale partitions from older generations. Idempotent.
    async fn activate(&self) -> Result<SweepReport>;
}
