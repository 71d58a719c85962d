//! Playback progress persistence
//!
//! Keeps the last playback position of every video, keyed by content path,
//! in a single JSON record that is rewritten in full on every change.

mod error;
mod store;

pub use error::StoreError;
pub use store::{ProgressEntry, ProgressStore};
