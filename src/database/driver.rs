use crate::dump::{ConnectionTarget, EngineKind};
use crate::error::Result;
use async_trait::async_trait;

/// Preflight check run before a dump process is spawned.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn check(&self, engine: EngineKind, target: &ConnectionTarget) -> Result<()>;
}
