//! Bincode snapshot files
//!
//! State lives at `<path>`, signing keys at `<path>.keys`. Every save writes
//! `<file>.tmp` and renames it over `<file>`, so a crash mid-save leaves the
//! previous version intact. On unix the key file is readable by its owner only.

use crate::adapters::ports::{
    KeystoreSnapshot, NodeSnapshot, PersistenceError, PersistenceStore, KEYSTORE_VERSION,
    SNAPSHOT_VERSION,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key file stored next to the snapshot
    pub fn keys_path(&self) -> PathBuf {
        with_suffix(&self.path, ".keys")
    }

    fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(path, e)),
        };
        let value = bincode::deserialize(&bytes)
            .map_err(|e| PersistenceError::Corrupted(format!("{:?}: {}", path, e)))?;
        debug!("Loaded {} bytes from {:?}", bytes.len(), path);
        Ok(Some(value))
    }

    fn write_atomic(path: &Path, bytes: &[u8], private: bool) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
        }
        let tmp = with_suffix(path, ".tmp");
        fs::write(&tmp, bytes).map_err(|e| Self::io_error(&tmp, e))?;
        if private {
            restrict_to_owner(&tmp).map_err(|e| Self::io_error(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| Self::io_error(path, e))?;
        debug!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl PersistenceStore for FileSnapshotStore {
    fn load_state(&self) -> Result<Option<NodeSnapshot>, PersistenceError> {
        let Some(snapshot) = Self::read::<NodeSnapshot>(&self.path)? else {
            info!("No snapshot at {:?}, starting empty", self.path);
            return Ok(None);
        };
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }

    fn save_state(&self, snapshot: &NodeSnapshot) -> Result<(), PersistenceError> {
        let bytes =
            bincode::serialize(snapshot).map_err(|e| PersistenceError::Encode(e.to_string()))?;
        Self::write_atomic(&self.path, &bytes, false)
    }

    fn load_keys(&self) -> Result<Option<KeystoreSnapshot>, PersistenceError> {
        let path = self.keys_path();
        let Some(keys) = Self::read::<KeystoreSnapshot>(&path)? else {
            return Ok(None);
        };
        if keys.version != KEYSTORE_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: keys.version,
                expected: KEYSTORE_VERSION,
            });
        }
        Ok(Some(keys))
    }

    fn save_keys(&self, keys: &KeystoreSnapshot) -> Result<(), PersistenceError> {
        let bytes =
            bincode::serialize(keys).map_err(|e| PersistenceError::Encode(e.to_string()))?;
        Self::write_atomic(&self.keys_path(), &bytes, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ports::StoredKey;
    use cl_01_validator_registry::RegistrySnapshot;
    use shared_types::{IdentityId, Location};

    fn sample_snapshot() -> NodeSnapshot {
        NodeSnapshot::new(
            42,
            RegistrySnapshot {
                validators: vec![],
                members: vec![(
                    IdentityId::from("alice"),
                    Location::new("CityA", "StateA", "CountryA"),
                )],
            },
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("state.bin"));
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested").join("state.bin"));
        let snapshot = sample_snapshot();

        store.save_state(&snapshot).unwrap();
        assert_eq!(store.load_state().unwrap(), Some(snapshot));
        assert!(!with_suffix(store.path(), ".tmp").exists());
    }

    #[test]
    fn test_garbage_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        fs::write(&path, b"\xff\xff\xff\xff not a snapshot").unwrap();

        let result = FileSnapshotStore::new(&path).load_state();
        assert!(matches!(result, Err(PersistenceError::Corrupted(_))));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("state.bin"));
        let mut snapshot = sample_snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        store.save_state(&snapshot).unwrap();

        assert!(matches!(
            store.load_state(),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_keys_saved_beside_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("state.bin"));
        assert!(store.load_keys().unwrap().is_none());

        let keys = KeystoreSnapshot::new(vec![StoredKey {
            identity: IdentityId::from("alice"),
            seed: [3u8; 32],
        }]);
        store.save_keys(&keys).unwrap();

        assert!(dir.path().join("state.bin.keys").exists());
        assert!(!dir.path().join("state.bin").exists());
        assert_eq!(store.load_keys().unwrap(), Some(keys));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("state.bin"));
        store.save_keys(&KeystoreSnapshot::new(vec![])).unwrap();

        let mode = fs::metadata(store.keys_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_stored_key_debug_hides_seed() {
        let key = StoredKey {
            identity: IdentityId::from("alice"),
            seed: [9u8; 32],
        };
        let printed = format!("{:?}", key);
        assert!(printed.contains("alice"));
        assert!(!printed.contains('9'));
    }
}
