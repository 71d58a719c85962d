//! Directory scanner and tree builder

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::mount::TopLevelMount;

/// Default recursion bound for [`build_tree`]
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Extensions (lowercase, without dot) that are indexed as videos
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"];

const ROOT_NAME: &str = "Root";

/// A node of the media tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Directory(Directory),
    File(VideoFile),
}

/// A directory and everything indexed below it
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub file_name: String,
    pub display_name: String,
    pub system_path: PathBuf,
    pub content_path: String,
    pub children: Vec<TreeNode>,
    /// Number of video files anywhere below this directory
    pub video_count: usize,
}

/// An indexed video file
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub file_name: String,
    pub display_name: String,
    pub system_path: PathBuf,
    pub content_path: String,
    /// Size in bytes at scan time
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl TreeNode {
    pub fn file_name(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.file_name,
            TreeNode::File(file) => &file.file_name,
        }
    }

    pub fn content_path(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.content_path,
            TreeNode::File(file) => &file.content_path,
        }
    }

    /// Videos contributed to the parent's count
    pub fn video_count(&self) -> usize {
        match self {
            TreeNode::Directory(dir) => dir.video_count,
            TreeNode::File(_) => 1,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&VideoFile> {
        match self {
            TreeNode::Directory(_) => None,
            TreeNode::File(file) => Some(file),
        }
    }
}

impl Directory {
    /// Create a directory from already finalized children
    ///
    /// The video count is derived from the children; their order is kept.
    pub fn new(
        file_name: String,
        display_name: String,
        system_path: PathBuf,
        content_path: String,
        children: Vec<TreeNode>,
    ) -> Self {
        let video_count = children.iter().map(TreeNode::video_count).sum();
        Self {
            file_name,
            display_name,
            system_path,
            content_path,
            children,
            video_count,
        }
    }
}

/// Check whether a file name carries one of the indexed video extensions
pub fn is_video_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Build the media tree for all mounts
///
/// The returned root has one child per mount whose directory could be
/// listed, in configuration order. Mounts that cannot be read are left out.
///
/// # Arguments
/// * `mounts` - Configured top-level directories
/// * `max_depth` - Directories at this depth or deeper are omitted (mount roots are depth 0)
pub fn build_tree(mounts: &[TopLevelMount], max_depth: usize) -> Directory {
    let children = mounts
        .iter()
        .filter_map(|mount| {
            let tree = build_directory(
                &mount.system_path,
                mount.content_path(),
                Some(mount.display_name.as_str()),
                max_depth,
                0,
            );
            match tree {
                Some(dir) => {
                    tracing::info!(
                        "Indexed {} ({}): {} videos",
                        mount.display_name,
                        mount.system_path.display(),
                        dir.video_count
                    );
                    Some(TreeNode::Directory(dir))
                }
                None => {
                    tracing::warn!(
                        "Mount {} ({}) produced no tree",
                        mount.display_name,
                        mount.system_path.display()
                    );
                    None
                }
            }
        })
        .collect();

    Directory::new(
        ROOT_NAME.to_string(),
        ROOT_NAME.to_string(),
        PathBuf::from("/"),
        "/".to_string(),
        children,
    )
}

fn build_directory(
    dir_path: &Path,
    content_path: String,
    display_name: Option<&str>,
    max_depth: usize,
    depth: usize,
) -> Option<Directory> {
    if depth >= max_depth {
        return None;
    }

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(source) => {
            let err = ScanError::List {
                path: dir_path.to_path_buf(),
                source,
            };
            tracing::warn!("Skipping directory: {}", err);
            return None;
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        match scan_entry(entry, dir_path, &content_path, max_depth, depth) {
            Ok(Some(node)) => children.push(node),
            Ok(None) => {}
            Err(err) => tracing::warn!("Skipping entry: {}", err),
        }
    }
    sort_children(&mut children);

    let file_name = dir_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir_path.display().to_string());
    let display_name = display_name.map(str::to_string).unwrap_or_else(|| file_name.clone());

    Some(Directory::new(
        file_name,
        display_name,
        dir_path.to_path_buf(),
        content_path,
        children,
    ))
}

fn scan_entry(
    entry: std::io::Result<fs::DirEntry>,
    dir_path: &Path,
    base: &str,
    max_depth: usize,
    depth: usize,
) -> Result<Option<TreeNode>, ScanError> {
    let entry = entry.map_err(|source| ScanError::List {
        path: dir_path.to_path_buf(),
        source,
    })?;
    let path = entry.path();
    let name = entry
        .file_name()
        .into_string()
        .map_err(|_| ScanError::InvalidName { path: path.clone() })?;

    // Follows symlinks; the depth bound stops cycles
    let metadata = fs::metadata(&path).map_err(|source| ScanError::Stat {
        path: path.clone(),
        source,
    })?;
    let content_path = join_content_path(base, &name);

    if metadata.is_dir() {
        let subtree = build_directory(&path, content_path, None, max_depth, depth + 1);
        return Ok(subtree.map(TreeNode::Directory));
    }

    if !metadata.is_file() || !is_video_file(&name) {
        return Ok(None);
    }

    let modified = metadata.modified().map_err(|source| ScanError::Stat {
        path: path.clone(),
        source,
    })?;
    let display_name = Path::new(&name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    Ok(Some(TreeNode::File(VideoFile {
        file_name: name,
        display_name,
        system_path: path,
        content_path,
        size: metadata.len(),
        modified: DateTime::<Utc>::from(modified),
    })))
}

/// Directories first, then files, each group by raw file name
fn sort_children(children: &mut [TreeNode]) {
    children.sort_by(|a, b| {
        b.is_directory()
            .cmp(&a.is_directory())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });
}

fn join_content_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}
