use super::executor::{self, DumpCommand};
use super::{BuildContext, DumpEngine, Stage};
use crate::database::ConnectivityProbe;
use crate::error::{BackupError, Result};
use crate::storage::{create_storage, format_resource_value, Storage};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BackupReport {
    pub path: String,
    pub size: u64,
    /// Digest of the stdout payload. `None` when the dump binary wrote its output itself.
    pub sha256: Option<String>,
    pub duration_secs: u64,
}

/// Opens the storage backend named by the request and runs [`run_backup_with`].
pub async fn run_backup(engine: &dyn DumpEngine, probe: &dyn ConnectivityProbe) -> Result<BackupReport> {
    let storage = create_storage(&engine.request().storage)
        .await
        .map_err(|e| e.at(Stage::ResolveOutputPath))?;
    run_backup_with(engine, probe, storage.as_ref()).await
}

pub async fn run_backup_with(
    engine: &dyn DumpEngine,
    probe: &dyn ConnectivityProbe,
    storage: &dyn Storage,
) -> Result<BackupReport> {
    let start = Instant::now();
    let request = engine.request();
    info!(
        "Starting {} backup of database {} to {} storage",
        engine.kind(),
        request.connection.database,
        storage.name()
    );

    // The directory-format output flag needs the backup path before arguments exist.
    let backup_path = storage
        .backup_path(&request.storage.path)
        .map_err(|e| e.at(Stage::ResolveOutputPath))?;
    let ctx = BuildContext::new(backup_path);

    debug!("{}", Stage::BuildArgs);
    let args = engine.build_args(&ctx).map_err(|e| e.at(Stage::BuildArgs))?;

    let target = engine.target();
    debug!("{}: {}:{}", Stage::Precheck, target.host, target.port);
    probe
        .check(engine.kind(), &target)
        .await
        .map_err(|e| e.at(Stage::Precheck))?;

    let self_written = engine.writes_own_output();
    let staging = if self_written && !request.storage.is_local() {
        Some(TempDir::new().map_err(|e| BackupError::from(e).at(Stage::Execute))?)
    } else {
        None
    };
    // Output directory the binary writes into, and whether it predates this run.
    let own_output = if self_written && staging.is_none() {
        tokio::fs::create_dir_all(&ctx.backup_path)
            .await
            .map_err(|e| BackupError::from(e).at(Stage::Execute))?;
        let out_name = engine
            .out_name(&ctx)
            .map_err(|e| e.at(Stage::ResolveOutputPath))?;
        let dir = Path::new(&ctx.backup_path).join(out_name);
        let existed = tokio::fs::metadata(&dir).await.is_ok();
        Some((dir, existed))
    } else {
        None
    };

    debug!("{}: {}", Stage::Execute, engine.program().display());
    let env = engine.env_overlay();
    let executed = executor::execute(&DumpCommand {
        program: engine.program(),
        args: &args,
        env: &env,
        current_dir: staging.as_ref().map(TempDir::path),
    })
    .await;
    let output = match executed {
        Ok(output) => output,
        Err(e) => {
            if let Some((dir, false)) = &own_output {
                discard_partial_output(dir).await;
            }
            return Err(e.at(Stage::Execute));
        }
    };
    debug!("{} exited with {}", engine.program().display(), output.status);
    if !output.stderr.trim().is_empty() {
        debug!("{} stderr: {}", engine.program().display(), output.stderr.trim_end());
    }

    let out_name = engine
        .out_name(&ctx)
        .map_err(|e| e.at(Stage::ResolveOutputPath))?;

    let (full_path, size, sha256) = match &staging {
        None if !self_written => {
            let full_path = storage.full_path(&ctx.backup_path, &out_name);
            debug!("{}: {}", Stage::WriteStorage, full_path);
            storage
                .write_backup(&output.stdout, &full_path)
                .await
                .map_err(|e| e.at(Stage::WriteStorage))?;
            let digest = format!("{:x}", Sha256::digest(&output.stdout));
            (full_path, output.stdout.len() as u64, Some(digest))
        }
        None => {
            let full_path = storage.full_path(&ctx.backup_path, &out_name);
            let size = directory_size(Path::new(&full_path))
                .await
                .map_err(|e| e.at(Stage::WriteStorage))?;
            (full_path, size, None)
        }
        Some(staging) => {
            let resource = format_resource_value(&out_name);
            let full_path = storage.full_path(&ctx.backup_path, &resource);
            let size = upload_directory(storage, &staging.path().join(&resource), &full_path)
                .await
                .map_err(|e| e.at(Stage::WriteStorage))?;
            (full_path, size, None)
        }
    };

    let duration_secs = start.elapsed().as_secs();
    info!("Backup file created at {}", full_path);

    Ok(BackupReport {
        path: full_path,
        size,
        sha256,
        duration_secs,
    })
}

async fn staged_files(dir: &Path) -> Result<Vec<(String, std::path::PathBuf)>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        BackupError::Storage(format!("failed to read dump output {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

async fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for (_, path) in staged_files(dir).await? {
        total += tokio::fs::metadata(&path).await?.len();
    }
    Ok(total)
}

async fn discard_partial_output(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!("Removed partial dump output {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial dump output {}: {}", dir.display(), e),
    }
}

/// Uploads every staged file under `full_path`. On failure the files already
/// uploaded by this call are removed again.
async fn upload_directory(storage: &dyn Storage, dir: &Path, full_path: &str) -> Result<u64> {
    let mut total = 0;
    let mut uploaded = Vec::new();
    for (name, path) in staged_files(dir).await? {
        let target = storage.full_path(full_path, &name);
        let written = match tokio::fs::read(&path).await {
            Ok(data) => storage
                .write_backup(&data, &target)
                .await
                .map(|_| data.len() as u64),
            Err(e) => Err(e.into()),
        };
        match written {
            Ok(size) => {
                total += size;
                uploaded.push(target);
            }
            Err(e) => {
                for done in &uploaded {
                    if let Err(cleanup) = storage.remove_backup(done).await {
                        warn!("Failed to remove partial upload {}: {}", done, cleanup);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(total)
}
