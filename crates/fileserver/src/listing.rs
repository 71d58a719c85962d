//! Response bodies
//!
//! Tree nodes are mapped into these views at the HTTP boundary, which is
//! also where stored playback positions are merged in.

use chrono::{DateTime, Utc};
use mediatree::{Directory, MountStatus, TopLevelMount, TreeNode, VideoFile};
use progress::ProgressStore;
use serde::{Deserialize, Serialize};

/// Percent-encode a content path segment by segment, keeping the slashes
pub(crate) fn encode_content_path(content_path: &str) -> String {
    content_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// A directory and its immediate children
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub file_name: String,
    pub display_name: String,
    pub content_path: String,
    pub video_count: usize,
    pub children: Vec<ListingEntry>,
}

/// One child in a listing
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListingEntry {
    Directory(DirectoryEntry),
    File(FileEntry),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub file_name: String,
    pub display_name: String,
    pub content_path: String,
    /// Where to browse this directory
    pub url: String,
    pub video_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub file_name: String,
    pub display_name: String,
    pub content_path: String,
    /// Where to open the player for this file
    pub url: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub last_playback_position: f64,
}

impl DirectoryListing {
    pub fn new(dir: &Directory, progress: &ProgressStore) -> Self {
        let children = dir
            .children
            .iter()
            .map(|child| match child {
                TreeNode::Directory(sub) => ListingEntry::Directory(DirectoryEntry {
                    file_name: sub.file_name.clone(),
                    display_name: sub.display_name.clone(),
                    content_path: sub.content_path.clone(),
                    url: format!("/browse{}", encode_content_path(&sub.content_path)),
                    video_count: sub.video_count,
                }),
                TreeNode::File(file) => ListingEntry::File(FileEntry {
                    file_name: file.file_name.clone(),
                    display_name: file.display_name.clone(),
                    content_path: file.content_path.clone(),
                    url: format!("/video{}", encode_content_path(&file.content_path)),
                    size: file.size,
                    modified: file.modified,
                    last_playback_position: progress.get(&file.content_path),
                }),
            })
            .collect();

        Self {
            file_name: dir.file_name.clone(),
            display_name: dir.display_name.clone(),
            content_path: dir.content_path.clone(),
            video_count: dir.video_count,
            children,
        }
    }
}

/// What a player needs to mount a video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub file_name: String,
    pub content_path: String,
    pub stream_url: String,
    pub size: u64,
    pub last_playback_position: f64,
}

impl VideoInfo {
    pub fn new(file: &VideoFile, progress: &ProgressStore) -> Self {
        Self {
            title: file.display_name.clone(),
            file_name: file.file_name.clone(),
            content_path: file.content_path.clone(),
            stream_url: format!("/stream{}", encode_content_path(&file.content_path)),
            size: file.size,
            last_playback_position: progress.get(&file.content_path),
        }
    }
}

/// Stored position of one video, also the body of `POST /progress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub video_path: String,
    #[serde(alias = "position")]
    pub last_playback_position: f64,
}

/// Diagnostics for one configured mount
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountInfo {
    pub display_name: String,
    pub system_path: String,
    pub mount_point: String,
    pub description: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Videos indexed at startup, zero for mounts left out of the tree
    pub video_count: usize,
}

impl MountInfo {
    pub fn new(mount: &TopLevelMount, status: &MountStatus, video_count: usize) -> Self {
        Self {
            display_name: mount.display_name.clone(),
            system_path: mount.system_path.display().to_string(),
            mount_point: mount.mount_point.clone(),
            description: mount.description.clone(),
            status: status.code(),
            error: (!status.is_accessible()).then(|| status.to_string()),
            video_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_content_path() {
        assert_eq!(encode_content_path("/computer/My Movie.mp4"), "/computer/My%20Movie.mp4");
        assert_eq!(encode_content_path("/a/b#1/c?.mkv"), "/a/b%231/c%3F.mkv");
        assert_eq!(encode_content_path("/"), "/");
    }

    #[test]
    fn test_progress_view_accepts_position_alias() {
        let view: ProgressView =
            serde_json::from_str(r#"{"videoPath": "/m/a.mp4", "position": 12.5}"#).unwrap();
        assert_eq!(view.video_path, "/m/a.mp4");
        assert_eq!(view.last_playback_position, 12.5);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["lastPlaybackPosition"], 12.5);
    }

    #[test]
    fn test_progress_view_rejects_wrong_types() {
        assert!(serde_json::from_str::<ProgressView>(r#"{"videoPath": "/m/a.mp4", "position": "12"}"#).is_err());
        assert!(serde_json::from_str::<ProgressView>(r#"{"videoPath": 5, "position": 12}"#).is_err());
    }

    #[test]
    fn test_mount_info_error_only_when_inaccessible() {
        let mount = TopLevelMount::new("Computer", "/data", "computer", "desc");

        let ok = serde_json::to_value(MountInfo::new(&mount, &MountStatus::Accessible, 3)).unwrap();
        assert_eq!(ok["status"], "accessible");
        assert!(ok.get("error").is_none());
        assert_eq!(ok["videoCount"], 3);

        let missing = serde_json::to_value(MountInfo::new(&mount, &MountStatus::NotFound, 0)).unwrap();
        assert_eq!(missing["status"], "not_found");
        assert_eq!(missing["error"], "Directory does not exist");
    }
}
