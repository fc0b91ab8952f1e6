//! On-disk snapshot of the record store.

use std::fs;
use std::io;
use std::path::PathBuf;

use farm_sync_core::StoreSnapshot;

const SNAPSHOT_FILE: &str = "farm.json";

/// Loads and saves the whole store as one JSON file in the data directory.
#[derive(Clone, Debug)]
pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot from disk.
    ///
    /// A missing file loads as an empty store.
    pub fn load(&self) -> Result<StoreSnapshot, StorageError> {
        let path = self.path();

        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::LoadError(path, e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreSnapshot::default()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Saves the snapshot, creating the data directory if needed.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path();
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StorageError::SaveError(path.clone(), e.to_string()))?;
        fs::write(&path, bytes).map_err(|e| StorageError::IoError(path, e))?;

        tracing::debug!(logs = snapshot.logs.len(), "Saved store snapshot");
        Ok(())
    }
}

/// Errors that can occur reading or writing the snapshot.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// The file does not hold a valid snapshot.
    LoadError(PathBuf, String),
    /// The snapshot could not be encoded.
    SaveError(PathBuf, String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::LoadError(path, e) => {
                write!(f, "Failed to load snapshot {}: {}", path.display(), e)
            }
            StorageError::SaveError(path, e) => {
                write!(f, "Failed to save snapshot {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::LoadError(_, _) | StorageError::SaveError(_, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_sync_core::{Area, Asset, FarmStore, LocalId, Log};
    use tempfile::TempDir;

    fn test_storage() -> (SnapshotStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (storage, _temp) = test_storage();
        assert!(!storage.path().exists());
        assert_eq!(storage.load().unwrap(), StoreSnapshot::default());
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested_dir = temp_dir.path().join("nested").join("data");
        let storage = SnapshotStorage::new(nested_dir.clone());

        storage.save(&StoreSnapshot::default()).unwrap();

        assert!(nested_dir.exists());
        assert!(storage.path().exists());
    }

    #[test]
    fn test_store_survives_restart() {
        let (storage, _temp) = test_storage();
        let store = FarmStore::new();
        let log = Log::new(LocalId::new(), "Irrigate").with_remote_id("12");
        store.add_log(log.clone());
        store.add_assets(vec![Asset::new("7", "Tractor").with_type("equipment")]);
        store.add_areas(vec![Area::new("3", "North field")]);

        storage.save(&store.snapshot()).unwrap();
        let reloaded = FarmStore::from_snapshot(storage.load().unwrap());

        assert_eq!(*reloaded.logs(), vec![log]);
        assert_eq!(reloaded.equipment().len(), 1);
        assert_eq!(reloaded.areas()[0].name, "North field");
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let (storage, _temp) = test_storage();
        fs::write(storage.path(), "not json").unwrap();

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::LoadError(_, _)));
        assert!(err.to_string().contains("Failed to load snapshot"));
    }

    #[test]
    fn test_save_error_message() {
        let err = StorageError::SaveError(PathBuf::from("/data/farm.json"), "bad value".into());
        assert_eq!(
            err.to_string(),
            "Failed to save snapshot /data/farm.json: bad value"
        );
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_save_into_file_path_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let storage = SnapshotStorage::new(blocker);

        let err = storage.save(&StoreSnapshot::default()).unwrap_err();
        assert!(matches!(err, StorageError::IoError(_, _)));
    }
}
