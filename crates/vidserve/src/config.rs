//! Process configuration from environment variables
//!
//! Values are read after `.env` has been loaded, so either source works.
//! The mount list lives in a separate JSON file because it is structured.

use mediatree::TopLevelMount;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MOUNTS_FILE: &str = "mounts.json";
pub const DEFAULT_PROGRESS_FILE: &str = "storage/progress.json";

/// Configuration errors, all fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read mounts file {}: {source}", path.display())]
    MountsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mounts file {} is malformed: {source}", path.display())]
    MountsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid mount point {0:?}: must be a single non-empty path segment")]
    InvalidMountPoint(String),
    #[error("duplicate mount point {0:?}")]
    DuplicateMountPoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address to bind to
    pub host: String,
    pub port: u16,
    /// JSON file listing the mounts, in display order
    pub mounts_file: PathBuf,
    /// Recursion bound for the tree builder
    pub max_depth: usize,
    /// Playback progress record
    pub progress_file: PathBuf,
    pub log_format: LogFormat,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("VIDSERVE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("VIDSERVE_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "VIDSERVE_PORT",
                value,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let max_depth = match lookup("VIDSERVE_MAX_DEPTH") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "VIDSERVE_MAX_DEPTH",
                value,
                expected: "a non-negative integer",
            })?,
            None => mediatree::DEFAULT_MAX_DEPTH,
        };

        let log_format = match lookup("VIDSERVE_LOG_FORMAT") {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "text" | "" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "VIDSERVE_LOG_FORMAT",
                        value,
                        expected: "\"text\" or \"json\"",
                    })
                }
            },
            None => LogFormat::Text,
        };

        Ok(Self {
            host,
            port,
            mounts_file: lookup("VIDSERVE_MOUNTS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNTS_FILE)),
            max_depth,
            progress_file: lookup("VIDSERVE_PROGRESS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRESS_FILE)),
            log_format,
        })
    }
}

/// Load and validate the mount list
pub fn load_mounts(path: &Path) -> Result<Vec<TopLevelMount>, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::MountsIo {
        path: path.to_path_buf(),
        source,
    })?;

    let mounts: Vec<TopLevelMount> =
        serde_json::from_str(&data).map_err(|source| ConfigError::MountsFormat {
            path: path.to_path_buf(),
            source,
        })?;

    validate_mounts(&mounts)?;
    Ok(mounts)
}

/// Every mount point must be one distinct path segment
pub fn validate_mounts(mounts: &[TopLevelMount]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for mount in mounts {
        let point = mount.mount_point.as_str();
        if point.is_empty() || point.contains('/') || point == "." || point == ".." {
            return Err(ConfigError::InvalidMountPoint(mount.mount_point.clone()));
        }
        if !seen.insert(point) {
            return Err(ConfigError::DuplicateMountPoint(mount.mount_point.clone()));
        }
    }
    Ok(())
}
