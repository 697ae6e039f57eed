use std::fmt;
use std::io;

use crate::dump::Stage;

#[derive(Debug)]
pub enum BackupError {
    Validation(String),
    Connectivity(String),
    Execution {
        program: String,
        reason: String,
        stderr: String,
    },
    Storage(String),
    Config(String),
    Io(io::Error),
    Serialization(String),
    Stage(Stage, Box<BackupError>),
}

impl BackupError {
    /// Wraps `self` with the pipeline stage it surfaced in.
    pub fn at(self, stage: Stage) -> Self {
        BackupError::Stage(stage, Box::new(self))
    }

    /// Innermost error, with every stage wrapper peeled off.
    pub fn root(&self) -> &BackupError {
        match self {
            BackupError::Stage(_, inner) => inner.root(),
            other => other,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            BackupError::Stage(stage, _) => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::Validation(msg) => write!(f, "Validation error: {}", msg),
            BackupError::Connectivity(msg) => write!(f, "Connectivity error: {}", msg),
            BackupError::Execution {
                program,
                reason,
                stderr,
            } => {
                write!(f, "failed to execute {} command - {}", program, reason)?;
                if !stderr.trim().is_empty() {
                    write!(f, ", {}", stderr.trim_end())?;
                }
                Ok(())
            }
            BackupError::Storage(msg) => write!(f, "Storage error: {}", msg),
            BackupError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BackupError::Io(err) => write!(f, "IO error: {}", err),
            BackupError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            BackupError::Stage(stage, inner) => write!(f, "{} failed: {}", stage, inner),
        }
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackupError::Io(err) => Some(err),
            BackupError::Stage(_, inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for BackupError {
    fn from(err: io::Error) -> Self {
        BackupError::Io(err)
    }
}

impl From<toml::de::Error> for BackupError {
    fn from(err: toml::de::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for BackupError {
    fn from(err: toml::ser::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

impl From<mysql_async::Error> for BackupError {
    fn from(err: mysql_async::Error) -> Self {
        BackupError::Connectivity(err.to_string())
    }
}

impl From<sqlx::Error> for BackupError {
    fn from(err: sqlx::Error) -> Self {
        BackupError::Connectivity(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_stage() {
        let err = BackupError::Validation("username is required".to_string()).at(Stage::BuildArgs);

        assert_eq!(err.stage(), Some(Stage::BuildArgs));
        assert!(matches!(err.root(), BackupError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "build arguments failed: Validation error: username is required"
        );
    }

    #[test]
    fn test_execution_error_includes_stderr() {
        let err = BackupError::Execution {
            program: "pg_dump".to_string(),
            reason: "exit status: 1".to_string(),
            stderr: "pg_dump: error: connection refused\n".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "failed to execute pg_dump command - exit status: 1, pg_dump: error: connection refused"
        );
    }
}
