use crate::dump::{ConnectionParams, DumpRequest, EngineKind, PgDumpRequest};
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    MariaDb,
}

impl DatabaseEngine {
    pub fn kind(&self) -> EngineKind {
        match self {
            DatabaseEngine::Postgres => EngineKind::Postgres,
            DatabaseEngine::MariaDb => EngineKind::MariaDb,
        }
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub engine: DatabaseEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl DatabaseConfig {
    pub fn connection(&self, database: &str) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: database.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupJob {
    pub name: String,
    pub connection: String,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub compress: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_name: Option<String>,
    /// Overrides the top-level `[storage]` section for this job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
}

impl BackupJob {
    fn dump_request(&self, db_config: &DatabaseConfig, default_storage: &StorageConfig) -> DumpRequest {
        let mut storage = self.storage.clone().unwrap_or_else(|| default_storage.clone());
        if self.out_name.is_some() {
            storage.out_name = self.out_name.clone();
        }

        DumpRequest {
            connection: db_config.connection(&self.database),
            additional_args: self.additional_args.clone(),
            storage,
        }
    }

    pub fn mariadb_request(&self, db_config: &DatabaseConfig, default_storage: &StorageConfig) -> DumpRequest {
        self.dump_request(db_config, default_storage)
    }

    pub fn pg_request(&self, db_config: &DatabaseConfig, default_storage: &StorageConfig) -> PgDumpRequest {
        PgDumpRequest {
            base: self.dump_request(db_config, default_storage),
            format: self.format.clone(),
            compress: self.compress,
            compression_algorithm: self.compression_algorithm.clone(),
            compression_level: self.compression_level,
        }
    }
}

/// Paths to the dump binaries when they are not on `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinaryPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pg_dump: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mariadb_dump: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connections: Vec<DatabaseConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub binaries: BinaryPaths,
    #[serde(default)]
    pub jobs: Vec<BackupJob>,
}

impl AppConfig {
    pub fn connection(&self, name: &str) -> Option<&DatabaseConfig> {
        self.connections.iter().find(|c| c.name == name)
    }

    pub fn job(&self, name: &str) -> Option<&BackupJob> {
        self.jobs.iter().find(|j| j.name == name)
    }
}
