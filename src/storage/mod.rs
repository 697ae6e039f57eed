mod local;
mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

use crate::error::{BackupError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Local,
    S3,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Local => write!(f, "local"),
            StorageType::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

/// Where and under which name a backup lands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl StorageConfig {
    #[cfg(test)]
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            storage_type: StorageType::Local,
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_local(&self) -> bool {
        self.storage_type == StorageType::Local
    }

    /// Configured output name, with blank values treated as unset.
    pub fn out_name(&self) -> Option<&str> {
        self.out_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Resolves the configured path into the base location backups are written under.
    /// Must not create anything.
    fn backup_path(&self, path: &str) -> Result<String>;

    fn full_path(&self, backup_path: &str, name: &str) -> String {
        join_resource(backup_path, name)
    }

    async fn write_backup(&self, data: &[u8], full_path: &str) -> Result<()>;

    /// Deletes one previously written backup. Used to roll back partial uploads.
    async fn remove_backup(&self, full_path: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

pub async fn create_storage(config: &StorageConfig) -> Result<Box<dyn Storage>> {
    match config.storage_type {
        StorageType::Local => Ok(Box::new(LocalStorage::new())),
        StorageType::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                BackupError::Storage("storage type 's3' requires an [s3] section".to_string())
            })?;
            Ok(Box::new(S3Storage::new(s3_config).await))
        }
    }
}

/// Turns an output name into a key-safe identifier for remote backends.
pub fn format_resource_value(name: &str) -> String {
    name.trim()
        .trim_matches('/')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn join_resource(base: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}
