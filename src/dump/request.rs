use crate::error::{BackupError, Result};
use crate::storage::StorageConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Connection settings as supplied by the caller. Host and port may be left unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Connection settings after defaults have been applied.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl std::fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionParams {
    pub fn validate_required(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(BackupError::Validation("username is required".to_string()));
        }
        if self.database.is_empty() {
            return Err(BackupError::Validation("database is required".to_string()));
        }
        Ok(())
    }

    pub fn resolve(&self, default_port: u16) -> ConnectionTarget {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_HOST);

        ConnectionTarget {
            host: host.to_string(),
            port: self.port.unwrap_or(default_port),
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

/// Fields every dump engine shares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpRequest {
    pub connection: ConnectionParams,
    pub additional_args: Option<String>,
    pub storage: StorageConfig,
}

impl DumpRequest {
    #[cfg(test)]
    pub fn new(username: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            connection: ConnectionParams {
                username: username.into(),
                database: database.into(),
                ..ConnectionParams::default()
            },
            ..Self::default()
        }
    }
}
