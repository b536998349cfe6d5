//! File-backed JSON storage for the demo's "server" state.
//!
//! Each logical record is one pretty-printed JSON file under the data
//! directory, the local stand-in for a browser's key-value storage. Writes
//! replace the whole record atomically; unparseable records are deleted and
//! reported as absent so one bad file can never wedge the application.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;
        Ok(Self { data_dir })
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    /// Load a named record. A missing file is absence; a file that no longer
    /// parses is deleted and also reported as absence.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.record_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read record: {}", name))?;

        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(record = name, error = %e, "Discarding corrupt record");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    /// Replace a named record. The payload lands in a sibling temp file
    /// first and is renamed over the target, so a failed write leaves the
    /// previous contents untouched.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.record_path(name);
        let tmp = self.data_dir.join(format!("{}.json.tmp", name));

        let contents = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize record: {}", name))?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write record: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to commit record: {}", name))?;

        debug!(record = name, "Record saved");
        Ok(())
    }

    /// Delete a named record if present.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.record_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove record: {}", name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage)
    }

    #[test]
    fn save_then_load_roundtrips() {
        let (_dir, storage) = storage();
        storage.save("numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = storage.load("numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
    }

    #[test]
    fn missing_record_is_absent() {
        let (_dir, storage) = storage();
        let loaded: Option<Vec<i32>> = storage.load("nothing").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_record_is_deleted_and_absent() {
        let (dir, storage) = storage();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded: Option<Vec<i32>> = storage.load("broken").unwrap();
        assert!(loaded.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, storage) = storage();
        storage.save("gone", &"value").unwrap();
        storage.remove("gone").unwrap();
        storage.remove("gone").unwrap();
        let loaded: Option<String> = storage.load("gone").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_replaces_previous_contents() {
        let (_dir, storage) = storage();
        storage.save("value", &"first").unwrap();
        storage.save("value", &"second").unwrap();
        let loaded: Option<String> = storage.load("value").unwrap();
        assert_eq!(loaded.as_deref(), Some("second"));
    }
}
