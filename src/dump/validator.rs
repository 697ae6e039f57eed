//! Fixed enumerations accepted by `pg_dump` and the checks that guard them.

use crate::error::{BackupError, Result};
use std::str::FromStr;

pub const MIN_COMPRESSION_LEVEL: i32 = 0;
pub const MAX_COMPRESSION_LEVEL: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgOutFormat {
    Custom,
    Directory,
    Tar,
    Plain,
}

impl PgOutFormat {
    pub fn code(&self) -> &'static str {
        match self {
            PgOutFormat::Custom => "c",
            PgOutFormat::Directory => "d",
            PgOutFormat::Tar => "t",
            PgOutFormat::Plain => "p",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PgOutFormat::Custom => ".dump",
            PgOutFormat::Directory => "",
            PgOutFormat::Tar => ".tar",
            PgOutFormat::Plain => ".sql",
        }
    }
}

impl FromStr for PgOutFormat {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c" => Ok(PgOutFormat::Custom),
            "d" => Ok(PgOutFormat::Directory),
            "t" => Ok(PgOutFormat::Tar),
            "p" => Ok(PgOutFormat::Plain),
            other => Err(BackupError::Validation(format!("unsupported format: {}", other))),
        }
    }
}

impl std::fmt::Display for PgOutFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PgOutFormat::Custom => write!(f, "custom"),
            PgOutFormat::Directory => write!(f, "directory"),
            PgOutFormat::Tar => write!(f, "tar"),
            PgOutFormat::Plain => write!(f, "plain"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    Gzip,
    Lz4,
    None,
    Zstd,
}

impl CompressionAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Lz4 => "lz4",
            CompressionAlgorithm::None => "none",
            CompressionAlgorithm::Zstd => "zstd",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            CompressionAlgorithm::Gzip => ".gz",
            CompressionAlgorithm::Lz4 => ".lz4",
            CompressionAlgorithm::None => "",
            CompressionAlgorithm::Zstd => ".zst",
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gzip" => Ok(CompressionAlgorithm::Gzip),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" => Ok(CompressionAlgorithm::None),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            other => Err(BackupError::Validation(format!(
                "unsupported compression algorithm: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn validate_pg_out_format(format: &str) -> Result<PgOutFormat> {
    format.parse()
}

pub fn validate_compression_algorithm(algorithm: &str) -> Result<CompressionAlgorithm> {
    algorithm.parse()
}

pub fn validate_compression_level(level: i32) -> Result<i32> {
    if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&level) {
        return Err(BackupError::Validation(format!(
            "invalid compression level: {}",
            level
        )));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_formats() {
        assert_eq!(validate_pg_out_format("c").unwrap(), PgOutFormat::Custom);
        assert_eq!(validate_pg_out_format("d").unwrap(), PgOutFormat::Directory);
        assert_eq!(validate_pg_out_format("t").unwrap(), PgOutFormat::Tar);
        assert_eq!(validate_pg_out_format("p").unwrap(), PgOutFormat::Plain);
    }

    #[test]
    fn test_invalid_format_names_value() {
        for value in ["x", "plain", "P", ""] {
            let err = validate_pg_out_format(value).unwrap_err();
            assert!(matches!(err, BackupError::Validation(_)));
            assert_eq!(err.to_string(), format!("Validation error: unsupported format: {}", value));
        }
    }

    #[test]
    fn test_compression_algorithms() {
        for name in ["gzip", "lz4", "none", "zstd"] {
            assert_eq!(validate_compression_algorithm(name).unwrap().as_str(), name);
        }
        let err = validate_compression_algorithm("brotli").unwrap_err();
        assert!(err.to_string().contains("unsupported compression algorithm: brotli"));
        assert!(validate_compression_algorithm("GZIP").is_err());
    }

    #[test]
    fn test_compression_level_bounds() {
        assert_eq!(validate_compression_level(0).unwrap(), 0);
        assert_eq!(validate_compression_level(9).unwrap(), 9);
        assert!(validate_compression_level(-1).is_err());
        assert!(validate_compression_level(10).is_err());
    }
}
