//! HTTP server for browsing and streaming the media tree
//!
//! This crate exposes the indexed mounts over HTTP: directory listings,
//! player metadata, playback progress and file streaming with proper range
//! request support for video seeking.

mod error;
mod listing;
mod server;
mod state;
mod stream;

pub use error::AppError;
pub use listing::{DirectoryEntry, DirectoryListing, FileEntry, ListingEntry, MountInfo, ProgressView, VideoInfo};
pub use server::FileServerApi;
pub use state::ServerState;
pub use stream::{content_type_for, parse_range, RangeError};

/// Result type alias for file server operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
