use crate::error::Result;
use async_trait::async_trait;

/// Deferred loading that runs once every manager has been constructed.
#[async_trait]
pub trait PostInitializationHandler {
    async fn on_state_ready(&self) -> Result<()>;
}
