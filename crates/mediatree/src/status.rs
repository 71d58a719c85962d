//! Mount accessibility diagnostics

use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// `EIO`, typically raised by a drive that went away under its mount point
const EIO: i32 = 5;

/// Accessibility of a mount's system path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum MountStatus {
    Accessible,
    NotFound,
    NotDirectory,
    NoPermission,
    IoError,
    Error(String),
}

impl MountStatus {
    pub fn is_accessible(&self) -> bool {
        matches!(self, MountStatus::Accessible)
    }

    /// Short machine-readable code, e.g. `not_found`
    pub fn code(&self) -> &'static str {
        match self {
            MountStatus::Accessible => "accessible",
            MountStatus::NotFound => "not_found",
            MountStatus::NotDirectory => "not_directory",
            MountStatus::NoPermission => "no_permission",
            MountStatus::IoError => "io_error",
            MountStatus::Error(_) => "error",
        }
    }
}

impl fmt::Display for MountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountStatus::Accessible => write!(f, "accessible"),
            MountStatus::NotFound => write!(f, "Directory does not exist"),
            MountStatus::NotDirectory => write!(f, "Path is not a directory"),
            MountStatus::NoPermission => write!(f, "Permission denied"),
            MountStatus::IoError => write!(f, "I/O error (possibly unmounted)"),
            MountStatus::Error(msg) => write!(f, "{}", msg),
        }
    }
}

/// Classify whether a mount path can be indexed
///
/// The path must exist, be a directory and be listable.
pub fn check_mount_status(path: &Path) -> MountStatus {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => return classify(err),
    };

    if !metadata.is_dir() {
        return MountStatus::NotDirectory;
    }

    match std::fs::read_dir(path) {
        Ok(_) => MountStatus::Accessible,
        Err(err) => classify(err),
    }
}

fn classify(err: std::io::Error) -> MountStatus {
    match err.kind() {
        ErrorKind::NotFound => MountStatus::NotFound,
        ErrorKind::PermissionDenied => MountStatus::NoPermission,
        ErrorKind::NotADirectory => MountStatus::NotDirectory,
        _ if cfg!(unix) && err.raw_os_error() == Some(EIO) => MountStatus::IoError,
        _ => MountStatus::Error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_accessible_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(check_mount_status(dir.path()), MountStatus::Accessible);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(check_mount_status(&dir.path().join("missing")), MountStatus::NotFound);
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("video.mp4");
        std::fs::write(&file, b"data").unwrap();
        assert_eq!(check_mount_status(&file), MountStatus::NotDirectory);
        assert_eq!(check_mount_status(&file.join("below")), MountStatus::NotDirectory);
    }

    #[cfg(unix)]
    #[test]
    fn test_eio_is_io_error() {
        let status = classify(std::io::Error::from_raw_os_error(5));
        assert_eq!(status, MountStatus::IoError);
        assert_eq!(status.code(), "io_error");
        assert_eq!(status.to_string(), "I/O error (possibly unmounted)");

        let other = classify(std::io::Error::new(ErrorKind::Other, "boom"));
        assert_eq!(other, MountStatus::Error("boom".to_string()));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(MountStatus::NotFound).unwrap();
        assert_eq!(json["status"], "not_found");

        let json = serde_json::to_value(MountStatus::IoError).unwrap();
        assert_eq!(json["status"], "io_error");

        let json = serde_json::to_value(MountStatus::Error("boom".to_string())).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
    }
}
