use super::Storage;
use crate::error::{BackupError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Writes backups to the local file system.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn backup_path(&self, path: &str) -> Result<String> {
        let path = path.trim();
        let path = if path.is_empty() { DEFAULT_BACKUP_DIR } else { path };
        Ok(expand_home(path).display().to_string())
    }

    fn full_path(&self, backup_path: &str, name: &str) -> String {
        Path::new(backup_path).join(name).display().to_string()
    }

    async fn write_backup(&self, data: &[u8], full_path: &str) -> Result<()> {
        let path = Path::new(full_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    BackupError::Storage(format!(
                        "failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(path, data)
            .await
            .map_err(|e| BackupError::Storage(format!("failed to write {}: {}", full_path, e)))?;
        debug!("Wrote {} bytes to {}", data.len(), full_path);
        Ok(())
    }

    async fn remove_backup(&self, full_path: &str) -> Result<()> {
        tokio::fs::remove_file(full_path)
            .await
            .map_err(|e| BackupError::Storage(format!("failed to remove {}: {}", full_path, e)))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_defaults_when_empty() {
        let storage = LocalStorage::new();
        assert_eq!(storage.backup_path("").unwrap(), DEFAULT_BACKUP_DIR);
        assert_eq!(storage.backup_path("/var/backups").unwrap(), "/var/backups");
    }

    #[test]
    fn test_backup_path_expands_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let storage = LocalStorage::new();
        let resolved = storage.backup_path("~/dumps").unwrap();
        assert_eq!(resolved, home.join("dumps").display().to_string());
    }

    #[test]
    fn test_backup_path_does_not_create_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("not-yet");
        let storage = LocalStorage::new();

        storage.backup_path(target.to_str().unwrap()).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_full_path_joins() {
        let storage = LocalStorage::new();
        assert_eq!(storage.full_path("/var/backups", "db.dump"), "/var/backups/db.dump");
    }

    #[tokio::test]
    async fn test_write_backup_creates_parents() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("app.sql");
        let storage = LocalStorage::new();

        storage
            .write_backup(b"-- dump", target.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"-- dump");
    }

    #[tokio::test]
    async fn test_remove_backup() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.sql");
        let target = target.to_str().unwrap();
        let storage = LocalStorage::new();

        storage.write_backup(b"-- dump", target).await.unwrap();
        storage.remove_backup(target).await.unwrap();
        assert!(!dir.path().join("app.sql").exists());
        assert!(storage.remove_backup(target).await.is_err());
    }

    #[tokio::test]
    async fn test_write_backup_into_file_parent_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let target = blocker.join("app.sql");

        let err = LocalStorage::new()
            .write_backup(b"-- dump", target.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Storage(_)));
    }
}
