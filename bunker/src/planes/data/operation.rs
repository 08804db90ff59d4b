use crate::domain::{FetchRequest, FetchResponse};
use async_trait::async_trait;
use shared::Result;

/// The per-request interception handler.
#[async_trait]
pub trait FetchOperations: Send + Sync + 'static {
    /// Route one intercepted request. `Ok(None)` means the handler yields no
    /// response and the host's default network behavior applies.
    async fn handle_fetch(&self, request: FetchRequest) -> Result<Option<FetchResponse>>;
}
