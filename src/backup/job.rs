use crate::config::{AppConfig, BackupJob, DatabaseEngine};
use crate::database::{ConnectivityProbe, SqlProbe};
use crate::dump::{run_backup, DumpEngine, MariaDbDump, PgDump};
use crate::error::{BackupError, Result};
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct BackupResult {
    pub job_name: String,

    pub database: String,

    pub success: bool,

    pub file_path: Option<String>,

    pub file_size: Option<u64>,

    pub sha256: Option<String>,

    pub duration_secs: u64,

    pub error: Option<String>,
}

/// Builds the engine a job runs with, honoring binary overrides from the config.
pub fn engine_for_job(config: &AppConfig, job: &BackupJob) -> Result<Box<dyn DumpEngine>> {
    let db_config = config.connection(&job.connection).ok_or_else(|| {
        BackupError::Config(format!(
            "connection '{}' not found for job '{}'",
            job.connection, job.name
        ))
    })?;

    let engine: Box<dyn DumpEngine> = match db_config.engine {
        DatabaseEngine::Postgres => {
            let mut engine = PgDump::new(job.pg_request(db_config, &config.storage));
            if let Some(program) = &config.binaries.pg_dump {
                engine = engine.with_program(program);
            }
            Box::new(engine)
        }
        DatabaseEngine::MariaDb => {
            let mut engine = MariaDbDump::new(job.mariadb_request(db_config, &config.storage));
            if let Some(program) = &config.binaries.mariadb_dump {
                engine = engine.with_program(program);
            }
            Box::new(engine)
        }
    };
    Ok(engine)
}

pub async fn execute_job(config: &AppConfig, job: &BackupJob) -> BackupResult {
    execute_job_with(config, job, &SqlProbe).await
}

pub async fn execute_job_with(
    config: &AppConfig,
    job: &BackupJob,
    probe: &dyn ConnectivityProbe,
) -> BackupResult {
    let start = Instant::now();
    info!("Running backup job '{}' for database {}", job.name, job.database);

    let outcome = match engine_for_job(config, job) {
        Ok(engine) => run_backup(engine.as_ref(), probe).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(report) => {
            info!(
                "Backup job '{}' completed: {:.2} MB in {} sec",
                job.name,
                report.size as f64 / 1024.0 / 1024.0,
                report.duration_secs
            );
            BackupResult {
                job_name: job.name.clone(),
                database: job.database.clone(),
                success: true,
                file_path: Some(report.path),
                file_size: Some(report.size),
                sha256: report.sha256,
                duration_secs: report.duration_secs,
                error: None,
            }
        }
        Err(e) => {
            match e.stage() {
                Some(stage) => {
                    error!("Backup job '{}' failed during {}: {}", job.name, stage, e.root())
                }
                None => error!("Backup job '{}' failed: {}", job.name, e),
            }
            BackupResult {
                job_name: job.name.clone(),
                database: job.database.clone(),
                success: false,
                file_path: None,
                file_size: None,
                sha256: None,
                duration_secs: start.elapsed().as_secs(),
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn execute_all_jobs(config: &AppConfig) -> Vec<BackupResult> {
    execute_all_jobs_with(config, &SqlProbe).await
}

pub async fn execute_all_jobs_with(
    config: &AppConfig,
    probe: &dyn ConnectivityProbe,
) -> Vec<BackupResult> {
    if config.jobs.is_empty() {
        warn!("No backup jobs configured");
    }

    let mut results = Vec::new();
    for job in &config.jobs {
        results.push(execute_job_with(config, job, probe).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::dump::{ConnectionTarget, EngineKind};
    use crate::storage::StorageConfig;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct AlwaysUp;

    #[async_trait]
    impl ConnectivityProbe for AlwaysUp {
        async fn check(&self, _engine: EngineKind, _target: &ConnectionTarget) -> Result<()> {
            Ok(())
        }
    }

    fn job(name: &str, connection: &str) -> BackupJob {
        BackupJob {
            name: name.to_string(),
            connection: connection.to_string(),
            database: "app".to_string(),
            format: None,
            compress: false,
            compression_algorithm: None,
            compression_level: None,
            additional_args: None,
            out_name: Some(name.to_string()),
            storage: None,
        }
    }

    fn config(backup_dir: &str) -> AppConfig {
        AppConfig {
            connections: vec![
                DatabaseConfig {
                    name: "pg".to_string(),
                    engine: DatabaseEngine::Postgres,
                    host: None,
                    port: None,
                    username: "postgres".to_string(),
                    password: String::new(),
                },
                DatabaseConfig {
                    name: "maria".to_string(),
                    engine: DatabaseEngine::MariaDb,
                    host: None,
                    port: None,
                    username: "root".to_string(),
                    password: String::new(),
                },
            ],
            storage: StorageConfig::local(backup_dir),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_engine_for_job_picks_engine() {
        let config = config("backups");

        let engine = engine_for_job(&config, &job("a", "pg")).unwrap();
        assert_eq!(engine.kind(), EngineKind::Postgres);
        assert_eq!(engine.program().to_str(), Some("pg_dump"));

        let engine = engine_for_job(&config, &job("b", "maria")).unwrap();
        assert_eq!(engine.kind(), EngineKind::MariaDb);
        assert_eq!(engine.program().to_str(), Some("mariadb-dump"));
    }

    #[test]
    fn test_engine_for_job_unknown_connection() {
        let err = engine_for_job(&config("backups"), &job("a", "missing")).err().unwrap();
        assert!(matches!(err, BackupError::Config(_)));
    }

    #[tokio::test]
    async fn test_failed_job_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path().to_str().unwrap());
        config.binaries.pg_dump = Some("/nonexistent/pg_dump".into());
        config.jobs = vec![job("broken", "missing"), job("unreachable-binary", "pg")];

        let results = execute_all_jobs_with(&config, &AlwaysUp).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
        assert!(results[0].error.as_deref().unwrap().contains("connection 'missing' not found"));
        assert!(results[1].error.as_deref().unwrap().starts_with("execute dump failed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_job_reports_artifact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let script = dir.path().join("fake-mariadb-dump");
        std::fs::write(&script, "#!/bin/sh\necho 'CREATE TABLE t (id int);'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let backup_dir = dir.path().join("out");
        let mut config = config(backup_dir.to_str().unwrap());
        config.binaries.mariadb_dump = Some(script);

        let result = execute_job_with(&config, &job("shop", "maria"), &AlwaysUp).await;

        assert!(result.success, "{:?}", result.error);
        let path = result.file_path.unwrap();
        assert_eq!(path, backup_dir.join("shop.sql").display().to_string());
        assert!(std::path::Path::new(&path).exists());
        assert_eq!(result.file_size, Some(25));
    }
}
