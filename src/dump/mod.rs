pub mod args;
pub mod executor;
pub mod mariadb;
pub mod pipeline;
pub mod postgres;
pub mod request;
pub mod validator;

pub use mariadb::MariaDbDump;
pub use pipeline::run_backup;
pub use postgres::{PgDump, PgDumpRequest};
pub use request::{ConnectionParams, ConnectionTarget, DumpRequest};

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Postgres,
    MariaDb,
}

impl EngineKind {
    pub fn default_port(&self) -> u16 {
        match self {
            EngineKind::Postgres => 5432,
            EngineKind::MariaDb => 3306,
        }
    }

    /// Driver tag handed to the connectivity probe.
    pub fn tag(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::MariaDb => "mysql",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Postgres => write!(f, "PostgreSQL"),
            EngineKind::MariaDb => write!(f, "MariaDB"),
        }
    }
}

/// Steps of a single backup run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildArgs,
    Precheck,
    Execute,
    ResolveOutputPath,
    WriteStorage,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::BuildArgs => write!(f, "build arguments"),
            Stage::Precheck => write!(f, "connectivity precheck"),
            Stage::Execute => write!(f, "execute dump"),
            Stage::ResolveOutputPath => write!(f, "resolve output path"),
            Stage::WriteStorage => write!(f, "write storage"),
        }
    }
}

/// Values fixed once per run and shared by argument building and output naming.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub backup_path: String,
    pub started_at: DateTime<Utc>,
}

impl BuildContext {
    pub fn new(backup_path: impl Into<String>) -> Self {
        Self {
            backup_path: backup_path.into(),
            started_at: Utc::now(),
        }
    }
}

pub trait DumpEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    fn program(&self) -> &Path;

    fn request(&self) -> &DumpRequest;

    /// Checks the request without changing it. Safe to call repeatedly.
    fn validate(&self) -> Result<()>;

    /// Validates, applies defaults and returns the complete argument list, or an error.
    fn build_args(&self, ctx: &BuildContext) -> Result<Vec<String>>;

    /// Extension appended to output names that do not carry one.
    fn extension(&self) -> Result<String>;

    /// Environment entries set on the child process only.
    fn env_overlay(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// True when the dump binary writes its output itself instead of to stdout.
    fn writes_own_output(&self) -> bool {
        false
    }

    fn target(&self) -> ConnectionTarget {
        self.request()
            .connection
            .resolve(self.kind().default_port())
    }

    fn out_name(&self, ctx: &BuildContext) -> Result<String> {
        let request = self.request();
        Ok(final_out_name(
            request.storage.out_name(),
            &request.connection.database,
            &self.extension()?,
            ctx.started_at,
        ))
    }
}

pub fn final_out_name(
    configured: Option<&str>,
    database: &str,
    extension: &str,
    at: DateTime<Utc>,
) -> String {
    match configured {
        Some(name) if extension.is_empty() || Path::new(name).extension().is_some() => {
            name.to_string()
        }
        Some(name) => format!("{}{}", name, extension),
        None => format!("{}_{}{}", database, at.format("%Y%m%d_%H%M%S"), extension),
    }
}
