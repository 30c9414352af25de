//! File-backed store: one JSON document per key inside a data directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StoreError};

/// A [`KeyValueStore`] that keeps each key in `<dir>/<key>.json`.
///
/// Writes go to a sibling temporary file and are renamed into place, so a
/// crash mid-write leaves the previous value intact. There is no locking:
/// two processes writing the same key resolve as last write wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(key, e))?;

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(Self::io_error(key, e));
        }

        debug!(key, path = %path.display(), bytes = value.len(), "Persisted value");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn test_get_missing_key() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn test_set_creates_directory_and_overwrites() {
        let (_dir, store) = temp_store();
        store.set("balance", "1000").unwrap();
        store.set("balance", "600").unwrap();
        assert_eq!(store.get("balance").unwrap().as_deref(), Some("600"));
        assert!(store.dir().join("balance.json").exists());
        assert!(!store.dir().join("balance.json.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let (_dir, store) = temp_store();
        // A directory in place of the value file makes the rename fail
        fs::create_dir_all(store.dir().join("favorites.json")).unwrap();

        let err = store.set("favorites", "[1]").unwrap_err();

        assert!(matches!(err, StoreError::Io { ref key, .. } if key == "favorites"));
        assert!(!store.dir().join("favorites.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::Unavailable(_))
        ));
    }
}
