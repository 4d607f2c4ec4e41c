// # File Snapshot Store
//
// File-based implementation of SnapshotStore.
//
// ## File Format
//
// One pretty-printed JSON record at `<base_dir>/image_data.json`:
//
// ```json
// {
//   "base64_content": "...",
//   "hash": "9f86d081884c7d65...",
//   "last_updated": "2025-01-09T12:00:00Z",
//   "source_url": "https://example.com/image.png"
// }
// ```
//
// ## Atomicity
//
// Saves write to a temporary file and rename it into place, so a concurrent
// load never observes a partially written snapshot. A missing file is the
// valid "first run" state; corrupt JSON is a store error and is surfaced,
// not silently discarded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::snapshot::ImageSnapshot;
use crate::traits::SnapshotStore;

/// Fixed filename of the snapshot record under the storage directory
const SNAPSHOT_FILENAME: &str = "image_data.json";

/// File-based snapshot store
///
/// # Example
///
/// ```rust,no_run
/// use imgwatch_core::state::FileSnapshotStore;
/// use imgwatch_core::traits::SnapshotStore;
/// use imgwatch_core::ImageSnapshot;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSnapshotStore::new("/var/lib/imgwatch");
///
///     let snapshot = ImageSnapshot::from_bytes(b"...", "https://example.com/a.png");
///     store.save(&snapshot).await?;
///
///     let loaded = store.load().await?;
///     assert_eq!(loaded.as_ref().map(|s| s.digest.as_str()),
///                Some(snapshot.digest.as_str()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSnapshotStore {
    base_dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `base_dir`
    ///
    /// The directory is created on the first save, not here, so constructing
    /// a store is infallible and side-effect free.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the snapshot record
    pub fn snapshot_path(&self) -> PathBuf {
        self.base_dir.join(SNAPSHOT_FILENAME)
    }

    /// Path of the temporary file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.snapshot_path();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<ImageSnapshot>> {
        let path = self.snapshot_path();

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            // No file yet: valid first-run state
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::store(format!(
                    "failed to read snapshot file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let snapshot: ImageSnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::store(format!(
                "failed to parse snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &ImageSnapshot) -> Result<()> {
        fs::create_dir_all(&self.base_dir).await.map_err(|e| {
            Error::store(format!(
                "failed to create storage directory {}: {}",
                self.base_dir.display(),
                e
            ))
        })?;

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| Error::store(format!("failed to serialize snapshot: {}", e)))?;

        // Write to a temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        let path = self.snapshot_path();
        fs::rename(&temp_path, &path).await.map_err(|e| {
            Error::store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("snapshot written to {}", path.display());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        match fs::remove_file(self.snapshot_path()).await {
            Ok(()) => Ok(()),
            // Already absent counts as success
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::store(format!(
                "failed to delete snapshot file: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_returns_none_before_first_save() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("data"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("data"));

        let snapshot = ImageSnapshot::from_bytes(b"payload", "https://example.com/a.png");
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.content, snapshot.content);
        assert_eq!(loaded.digest, snapshot.digest);
        assert_eq!(loaded.source_url, snapshot.source_url);

        // A second store over the same directory sees the same record
        let store2 = FileSnapshotStore::new(dir.path().join("data"));
        assert!(store2.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_supersedes_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        let first = ImageSnapshot::from_bytes(b"one", "https://example.com/a.png");
        let second = ImageSnapshot::from_bytes(b"two", "https://example.com/a.png");
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.digest, second.digest);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        fs::create_dir_all(dir.path()).await.unwrap();
        fs::write(store.snapshot_path(), b"not json").await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn delete_is_tolerant_of_absence() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        // Nothing saved yet
        store.delete().await.unwrap();

        let snapshot = ImageSnapshot::from_bytes(b"payload", "https://example.com/a.png");
        store.save(&snapshot).await.unwrap();
        store.delete().await.unwrap();

        assert!(store.load().await.unwrap().is_none());

        // Deleting twice is still fine
        store.delete().await.unwrap();
    }
}
