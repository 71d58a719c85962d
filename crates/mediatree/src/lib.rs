//! In-memory index of configured video directories
//!
//! This crate walks the configured mounts once, keeps the result as an
//! immutable tree of directories and video files, and resolves logical
//! content paths (e.g. `/computer/Sub/b.mkv`) back to tree nodes.

pub mod error;
pub mod mount;
pub mod resolve;
pub mod status;
pub mod tree;

pub use error::ScanError;
pub use mount::TopLevelMount;
pub use resolve::{find_directory, find_item_by_path};
pub use status::{check_mount_status, MountStatus};
pub use tree::{build_tree, is_video_file, Directory, TreeNode, VideoFile, DEFAULT_MAX_DEPTH};
