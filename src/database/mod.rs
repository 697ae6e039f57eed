mod driver;
mod mysql;
mod postgres;

pub use driver::ConnectivityProbe;

use crate::dump::{ConnectionTarget, EngineKind};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Opens one real connection with the engine's native driver and runs `SELECT 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlProbe;

#[async_trait]
impl ConnectivityProbe for SqlProbe {
    async fn check(&self, engine: EngineKind, target: &ConnectionTarget) -> Result<()> {
        debug!("Probing {} through the {} driver", engine, engine.tag());
        match engine {
            EngineKind::MariaDb => mysql::check_connectivity(target).await,
            EngineKind::Postgres => postgres::check_connectivity(target).await,
        }
    }
}
