//! Content path resolution

use crate::tree::{Directory, TreeNode};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Whether every segment of `prefix` matches the leading segments of `path`
fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    let mut path_segments = segments(path);
    segments(prefix).all(|segment| path_segments.next() == Some(segment))
}

fn same_path(a: &str, b: &str) -> bool {
    segments(a).eq(segments(b))
}

/// Find the node whose content path equals `path`
///
/// Paths are compared segment by segment, so `/a/bc` is never routed
/// through a sibling `/a/b`, and repeated or trailing slashes are ignored.
///
/// # Returns
/// * `Some(&TreeNode)` for the matching directory or file
/// * `None` when no node has that content path
pub fn find_item_by_path<'a>(tree: &'a Directory, path: &str) -> Option<&'a TreeNode> {
    let mut dir = tree;
    loop {
        let child = dir
            .children
            .iter()
            .find(|child| is_segment_prefix(child.content_path(), path))?;

        if same_path(child.content_path(), path) {
            return Some(child);
        }

        match child {
            TreeNode::Directory(sub) => dir = sub,
            TreeNode::File(_) => return None,
        }
    }
}

/// Like [`find_item_by_path`] but also accepts the root's own path
///
/// The root is not a child of anything, so it is returned as a directory
/// reference rather than a node.
pub fn find_directory<'a>(tree: &'a Directory, path: &str) -> Option<&'a Directory> {
    if same_path(&tree.content_path, path) {
        return Some(tree);
    }
    find_item_by_path(tree, path).and_then(TreeNode::as_directory)
}
