//! JSON-backed progress store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::StoreError;

/// Stored progress of a single video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// Seconds from the start of the video
    pub last_playback_position: f64,
}

/// Older record layout: a list of entries carrying their own path
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedEntry {
    video_path: String,
    last_playback_position: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Record {
    Map(BTreeMap<String, ProgressEntry>),
    List(Vec<ListedEntry>),
}

impl From<Record> for BTreeMap<String, ProgressEntry> {
    fn from(record: Record) -> Self {
        match record {
            Record::Map(entries) => entries,
            Record::List(list) => list
                .into_iter()
                .map(|entry| {
                    (
                        entry.video_path,
                        ProgressEntry {
                            last_playback_position: entry.last_playback_position,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Playback positions keyed by content path
///
/// The record is read once when the store is opened. Every mutation writes
/// the full mapping back before it becomes visible to readers; a failed
/// write leaves the in-memory mapping unchanged. Other processes writing
/// the same record are not coordinated with, the last write wins.
pub struct ProgressStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, ProgressEntry>>,
}

impl ProgressStore {
    /// Open the store backed by the record at `path`
    ///
    /// A missing record is created empty. An unreadable or malformed record
    /// is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Err(err) = ensure_record_exists(&path) {
            tracing::warn!("Could not create progress record: {}", err);
        }

        let entries = match load(&path) {
            Ok(entries) => {
                tracing::info!(
                    "Loaded {} progress entries from {}",
                    entries.len(),
                    path.display()
                );
                entries
            }
            Err(err) => {
                tracing::error!("Error reading progress record, starting empty: {}", err);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Location of the backing record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last playback position for a video, `0.0` when nothing is stored
    pub fn get(&self, content_path: &str) -> f64 {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(content_path)
            .map(|entry| entry.last_playback_position)
            .unwrap_or(0.0)
    }

    /// Store the playback position for a video
    ///
    /// # Errors
    /// * `StoreError::InvalidPosition` if `position` is negative or not finite
    /// * `StoreError::Io` if the record cannot be written
    pub fn set(&self, content_path: &str, position: f64) -> Result<(), StoreError> {
        if !position.is_finite() || position < 0.0 {
            return Err(StoreError::InvalidPosition(position));
        }

        tracing::debug!("Saving progress {} -> {}", content_path, position);
        self.mutate(|entries| {
            entries.insert(
                content_path.to_string(),
                ProgressEntry {
                    last_playback_position: position,
                },
            );
        })
    }

    /// Forget the playback position for a video
    ///
    /// The record is rewritten even when no entry existed.
    pub fn delete(&self, content_path: &str) -> Result<(), StoreError> {
        tracing::debug!("Removing progress for {}", content_path);
        self.mutate(|entries| {
            entries.remove(content_path);
        })
    }

    /// All stored positions, ordered by content path
    pub fn all(&self) -> Vec<(String, f64)> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.last_playback_position))
            .collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mutate<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, ProgressEntry>),
    {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        apply(&mut next);

        persist(&self.path, &next).map_err(|err| {
            tracing::error!("Error writing progress record: {}", err);
            err
        })?;

        *entries = next;
        Ok(())
    }
}

fn ensure_record_exists(path: &Path) -> Result<(), StoreError> {
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    tracing::info!("Creating empty progress record at {}", path.display());
    persist(path, &BTreeMap::new())
}

fn load(path: &Path) -> Result<BTreeMap<String, ProgressEntry>, StoreError> {
    let data = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let record: Record = serde_json::from_str(&data).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(record.into())
}

fn persist(path: &Path, entries: &BTreeMap<String, ProgressEntry>) -> Result<(), StoreError> {
    let data = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, data).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_path(dir: &TempDir) -> PathBuf {
        dir.path().join("storage").join("progress.json")
    }

    #[test]
    fn test_missing_record_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let path = record_path(&dir);

        let store = ProgressStore::open(&path);
        assert!(store.is_empty());
        assert!(path.exists());

        let data = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed, serde_json::json!({}));
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(record_path(&dir));

        assert_eq!(store.get("/computer/a.mp4"), 0.0);
        store.set("/computer/a.mp4", 42.5).unwrap();
        assert_eq!(store.get("/computer/a.mp4"), 42.5);

        store.set("/computer/a.mp4", 90.0).unwrap();
        assert_eq!(store.get("/computer/a.mp4"), 90.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(record_path(&dir));

        store.set("/computer/a.mp4", 12.0).unwrap();
        store.delete("/computer/a.mp4").unwrap();
        assert_eq!(store.get("/computer/a.mp4"), 0.0);

        // Deleting an absent entry is fine
        store.delete("/computer/never.mp4").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = record_path(&dir);

        {
            let store = ProgressStore::open(&path);
            store.set("/m/a.mp4", 10.0).unwrap();
            store.set("/m/b.mkv", 20.0).unwrap();
            store.delete("/m/a.mp4").unwrap();
        }

        let store = ProgressStore::open(&path);
        assert_eq!(store.get("/m/a.mp4"), 0.0);
        assert_eq!(store.get("/m/b.mkv"), 20.0);
    }

    #[test]
    fn test_record_layout() {
        let dir = TempDir::new().unwrap();
        let path = record_path(&dir);
        let store = ProgressStore::open(&path);
        store.set("/m/a.mp4", 3.5).unwrap();

        let data = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({ "/m/a.mp4": { "lastPlaybackPosition": 3.5 } })
        );
    }

    #[test]
    fn test_reads_list_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(
            &path,
            r#"[{"videoPath": "/m/a.mp4", "lastPlaybackPosition": 7}]"#,
        )
        .unwrap();

        let store = ProgressStore::open(&path);
        assert_eq!(store.get("/m/a.mp4"), 7.0);
    }

    #[test]
    fn test_malformed_record_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "not json at all").unwrap();

        let store = ProgressStore::open(&path);
        assert!(store.is_empty());
        assert_eq!(store.get("/m/a.mp4"), 0.0);

        store.set("/m/a.mp4", 1.0).unwrap();
        assert_eq!(ProgressStore::open(&path).get("/m/a.mp4"), 1.0);
    }

    #[test]
    fn test_write_failure_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let store = ProgressStore::open(&path);
        store.set("/m/a.mp4", 5.0).unwrap();

        // A directory in place of the record makes every write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = store.set("/m/a.mp4", 50.0).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.get("/m/a.mp4"), 5.0);

        assert!(store.delete("/m/a.mp4").is_err());
        assert_eq!(store.get("/m/a.mp4"), 5.0);
    }

    #[test]
    fn test_rejects_invalid_positions() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(record_path(&dir));

        assert!(matches!(store.set("/m/a.mp4", -1.0), Err(StoreError::InvalidPosition(_))));
        assert!(matches!(store.set("/m/a.mp4", f64::NAN), Err(StoreError::InvalidPosition(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_all_is_ordered() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(record_path(&dir));
        store.set("/m/b.mp4", 2.0).unwrap();
        store.set("/m/a.mp4", 1.0).unwrap();

        assert_eq!(
            store.all(),
            vec![("/m/a.mp4".to_string(), 1.0), ("/m/b.mp4".to_string(), 2.0)]
        );
    }
}
