use crate::error::{BackupError, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tracing::debug;

/// One invocation of a dump binary.
#[derive(Debug)]
pub struct DumpCommand<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    /// Set on the child only; the parent environment is left untouched.
    pub env: &'a [(String, String)],
    pub current_dir: Option<&'a Path>,
}

#[derive(Debug)]
pub struct DumpOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub status: ExitStatus,
}

pub async fn execute(command: &DumpCommand<'_>) -> Result<DumpOutput> {
    let program_name = command.program.display().to_string();

    let resolved = which::which(command.program).map_err(|e| BackupError::Execution {
        program: program_name.clone(),
        reason: format!("executable not found: {}", e),
        stderr: String::new(),
    })?;
    debug!("Running {} with {} arguments", resolved.display(), command.args.len());

    let mut cmd = tokio::process::Command::new(&resolved);
    cmd.args(command.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    for (key, value) in command.env {
        cmd.env(key, value);
    }
    if let Some(dir) = command.current_dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().await.map_err(|e| BackupError::Execution {
        program: program_name.clone(),
        reason: e.to_string(),
        stderr: String::new(),
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(BackupError::Execution {
            program: program_name,
            reason: output.status.to_string(),
            stderr,
        });
    }

    Ok(DumpOutput {
        stdout: output.stdout,
        stderr,
        status: output.status,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr_separately() {
        let args = sh("printf 'payload'; printf 'notice' >&2");
        let output = execute(&DumpCommand {
            program: Path::new("sh"),
            args: &args,
            env: &[],
            current_dir: None,
        })
        .await
        .unwrap();

        assert_eq!(output.stdout, b"payload");
        assert_eq!(output.stderr, "notice");
        assert!(output.status.success());
    }

    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let args = sh("echo 'access denied' >&2; exit 3");
        let err = execute(&DumpCommand {
            program: Path::new("sh"),
            args: &args,
            env: &[],
            current_dir: None,
        })
        .await
        .unwrap_err();

        match err {
            BackupError::Execution { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr.trim(), "access denied");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_env_overlay_scoped_to_child() {
        let args = sh("printf '%s' \"$DBDUMP_TEST_SECRET\"");
        let env = vec![("DBDUMP_TEST_SECRET".to_string(), "hunter2".to_string())];
        let output = execute(&DumpCommand {
            program: Path::new("sh"),
            args: &args,
            env: &env,
            current_dir: None,
        })
        .await
        .unwrap();

        assert_eq!(output.stdout, b"hunter2");
        assert!(std::env::var("DBDUMP_TEST_SECRET").is_err());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = execute(&DumpCommand {
            program: Path::new("dbdump-no-such-binary"),
            args: &[],
            env: &[],
            current_dir: None,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, BackupError::Execution { .. }));
    }
}
