use std::path::PathBuf;

/// Failure reading or writing the progress record
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("progress record {} I/O error: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("progress record {} is malformed: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid playback position: {0}")]
    InvalidPosition(f64),
}
