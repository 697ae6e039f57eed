use super::args::{flag, parse_additional_args, remove_args_duplicate};
use super::request::{ConnectionTarget, DumpRequest};
use super::validator::{
    validate_compression_algorithm, validate_compression_level, validate_pg_out_format,
    CompressionAlgorithm, PgOutFormat,
};
use super::{BuildContext, DumpEngine, EngineKind};
use crate::error::Result;
use crate::storage::format_resource_value;
use std::path::{Path, PathBuf};

pub const PG_DUMP: &str = "pg_dump";
pub const DEFAULT_FORMAT: &str = "p";
pub const DEFAULT_COMPRESSION_ALGORITHM: &str = "gzip";
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgDumpRequest {
    pub base: DumpRequest,
    pub format: Option<String>,
    pub compress: bool,
    pub compression_algorithm: Option<String>,
    pub compression_level: Option<i32>,
}

impl PgDumpRequest {
    #[cfg(test)]
    pub fn new(username: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base: DumpRequest::new(username, database),
            ..Self::default()
        }
    }

    /// Naming an algorithm counts as asking for compression.
    pub fn compression_enabled(&self) -> bool {
        self.compress || given(&self.compression_algorithm).is_some()
    }
}

/// The raw value, unless it is missing or blank. Validation sees it untrimmed.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Fully validated and defaulted view of a [`PgDumpRequest`].
#[derive(Debug)]
struct PgSettings {
    target: ConnectionTarget,
    format: PgOutFormat,
    compression: Option<(CompressionAlgorithm, i32)>,
}

pub struct PgDump {
    request: PgDumpRequest,
    program: PathBuf,
}

impl PgDump {
    pub fn new(request: PgDumpRequest) -> Self {
        Self {
            request,
            program: PathBuf::from(PG_DUMP),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn settings(&self) -> Result<PgSettings> {
        self.request.base.connection.validate_required()?;

        let format =
            validate_pg_out_format(given(&self.request.format).unwrap_or(DEFAULT_FORMAT))?;

        let compression = if self.request.compression_enabled() {
            let algorithm = validate_compression_algorithm(
                given(&self.request.compression_algorithm)
                    .unwrap_or(DEFAULT_COMPRESSION_ALGORITHM),
            )?;
            let level = validate_compression_level(
                self.request
                    .compression_level
                    .unwrap_or(DEFAULT_COMPRESSION_LEVEL),
            )?;
            // pg_dump only accepts level 0 with "none".
            let level = if algorithm == CompressionAlgorithm::None { 0 } else { level };
            Some((algorithm, level))
        } else {
            None
        };

        Ok(PgSettings {
            target: self.target(),
            format,
            compression,
        })
    }
}

impl DumpEngine for PgDump {
    fn kind(&self) -> EngineKind {
        EngineKind::Postgres
    }

    fn program(&self) -> &Path {
        &self.program
    }

    fn request(&self) -> &DumpRequest {
        &self.request.base
    }

    fn validate(&self) -> Result<()> {
        self.settings().map(|_| ())
    }

    fn build_args(&self, ctx: &BuildContext) -> Result<Vec<String>> {
        let settings = self.settings()?;
        let target = &settings.target;

        let mut args = vec![
            flag("host", &target.host),
            flag("port", target.port),
            flag("username", &target.username),
            flag("dbname", &target.database),
            flag("format", settings.format.code()),
        ];

        if let Some((algorithm, level)) = settings.compression {
            args.push(flag("compress", format!("{}:{}", algorithm, level)));
        }

        if settings.format == PgOutFormat::Directory {
            let out_name = self.out_name(ctx)?;
            let file = if self.request.base.storage.is_local() {
                Path::new(&ctx.backup_path).join(&out_name).display().to_string()
            } else {
                format_resource_value(&out_name)
            };
            args.push(flag("file", file));
        }

        if let Some(extra) = given(&self.request.base.additional_args) {
            args.extend(parse_additional_args(extra));
        }

        Ok(remove_args_duplicate(args))
    }

    fn extension(&self) -> Result<String> {
        let settings = self.settings()?;
        let mut extension = settings.format.extension().to_string();
        if settings.format == PgOutFormat::Plain {
            if let Some((algorithm, _)) = settings.compression {
                extension.push_str(algorithm.extension());
            }
        }
        Ok(extension)
    }

    fn env_overlay(&self) -> Vec<(String, String)> {
        let password = &self.request.base.connection.password;
        if password.is_empty() {
            Vec::new()
        } else {
            vec![("PGPASSWORD".to_string(), password.clone())]
        }
    }

    fn writes_own_output(&self) -> bool {
        matches!(
            given(&self.request.format).unwrap_or(DEFAULT_FORMAT),
            "d"
        )
    }
}
