use std::path::PathBuf;

/// Failure while scanning a single filesystem entry
///
/// Scan errors never abort a build: they are logged and the entry is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Listing a directory failed
    #[error("failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading metadata of an entry failed
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The entry name cannot be used in a content path
    #[error("entry name is not valid UTF-8: {}", path.display())]
    InvalidName { path: PathBuf },
}
