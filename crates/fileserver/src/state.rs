//! Shared application context handed to every handler

use mediatree::{Directory, TopLevelMount, TreeNode};
use progress::ProgressStore;
use std::sync::Arc;

/// Server state holding the media tree and the progress store
///
/// Built once at startup. The tree is read-only, the store synchronizes
/// its own mutations.
#[derive(Clone)]
pub struct ServerState {
    /// Root of the indexed mounts
    tree: Arc<Directory>,
    /// Playback positions keyed by content path
    progress: Arc<ProgressStore>,
    /// Mount configuration the tree was built from
    mounts: Arc<[TopLevelMount]>,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    /// * `tree` - Root directory returned by `mediatree::build_tree`
    /// * `progress` - Opened progress store
    /// * `mounts` - Mount configuration, used for diagnostics
    pub fn new(tree: Directory, progress: ProgressStore, mounts: Vec<TopLevelMount>) -> Self {
        Self {
            tree: Arc::new(tree),
            progress: Arc::new(progress),
            mounts: mounts.into(),
        }
    }

    /// Get the tree root
    pub fn tree(&self) -> &Directory {
        &self.tree
    }

    /// Get the progress store
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    /// Get a shared handle to the progress store, for blocking tasks
    pub fn progress_handle(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Get the configured mounts
    pub fn mounts(&self) -> &[TopLevelMount] {
        &self.mounts
    }

    /// Get a shared handle to the mounts, for blocking tasks
    pub fn mounts_handle(&self) -> Arc<[TopLevelMount]> {
        Arc::clone(&self.mounts)
    }

    /// Look up a node by content path
    pub fn find(&self, content_path: &str) -> Option<&TreeNode> {
        mediatree::find_item_by_path(&self.tree, content_path)
    }

    /// Look up a directory by content path, the root included
    pub fn find_directory(&self, content_path: &str) -> Option<&Directory> {
        mediatree::find_directory(&self.tree, content_path)
    }

    /// Indexed video count of the mount rooted at `/{mount_point}`, if it was indexed
    pub fn mount_video_count(&self, mount_point: &str) -> Option<usize> {
        self.find_directory(&format!("/{}", mount_point))
            .map(|dir| dir.video_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_state(dir: &TempDir) -> ServerState {
        std::fs::create_dir_all(dir.path().join("media/Sub")).unwrap();
        std::fs::write(dir.path().join("media/a.mp4"), b"0123456789").unwrap();
        std::fs::write(dir.path().join("media/Sub/b.mkv"), b"x").unwrap();

        let mounts = vec![TopLevelMount::new(
            "Computer",
            dir.path().join("media"),
            "computer",
            "Computer video collection",
        )];
        let tree = mediatree::build_tree(&mounts, mediatree::DEFAULT_MAX_DEPTH);
        let progress = ProgressStore::open(dir.path().join("progress.json"));
        ServerState::new(tree, progress, mounts)
    }

    #[test]
    fn test_find() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);

        let node = state.find("/computer/a.mp4").unwrap();
        assert_eq!(node.as_file().unwrap().size, 10);
        assert!(state.find("/computer/missing.mp4").is_none());
    }

    #[test]
    fn test_find_directory_includes_root() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);

        assert_eq!(state.find_directory("/").unwrap().video_count, 2);
        assert_eq!(state.find_directory("/computer/Sub").unwrap().video_count, 1);
        assert!(state.find_directory("/computer/a.mp4").is_none());
    }

    #[test]
    fn test_mount_video_count() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);

        assert_eq!(state.mount_video_count("computer"), Some(2));
        assert_eq!(state.mount_video_count("external"), None);
    }

    #[test]
    fn test_mounts_handle_shares_config() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);

        let handle = state.mounts_handle();
        assert_eq!(handle.len(), 1);
        assert!(std::ptr::eq(handle.as_ptr(), state.mounts().as_ptr()));
    }

    #[test]
    fn test_clones_share_progress() {
        let dir = TempDir::new().unwrap();
        let state = create_test_state(&dir);
        let clone = state.clone();

        state.progress().set("/computer/a.mp4", 4.0).unwrap();
        assert_eq!(clone.progress().get("/computer/a.mp4"), 4.0);
        assert_eq!(clone.progress().path(), dir.path().join("progress.json").as_path());
    }
}
