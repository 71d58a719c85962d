//! Mount configuration entity

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A configured top-level directory exposed under a fixed path segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelMount {
    /// Human label used as the mount root's display name
    pub display_name: String,
    /// Directory on disk
    pub system_path: PathBuf,
    /// Single path segment, the mount root lives at `/{mount_point}`
    pub mount_point: String,
    /// Free-form description shown in diagnostics
    #[serde(default)]
    pub description: String,
}

impl TopLevelMount {
    pub fn new(
        display_name: impl Into<String>,
        system_path: impl Into<PathBuf>,
        mount_point: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            system_path: system_path.into(),
            mount_point: mount_point.into(),
            description: description.into(),
        }
    }

    /// Content path of the mount root
    pub fn content_path(&self) -> String {
        format!("/{}", self.mount_point)
    }
}
