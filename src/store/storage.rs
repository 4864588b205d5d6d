//! Key/value storage backends for the preference record.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access storage file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String-keyed storage, shaped after the browser's local storage.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// Process-local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object file of string values.
///
/// Every mutation rewrites the whole file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Last contents known to be on disk.
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the storage file, starting empty when it does not exist.
    ///
    /// A file that is not a JSON object of strings is discarded with a warning
    /// and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let items = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "Ignoring unreadable storage file");
                BTreeMap::new()
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), entries = items.len(), "Opened storage file");
        Ok(Self { path, items })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `items` to disk, then makes them the current contents.
    ///
    /// A failed write leaves the in-memory view untouched.
    fn commit(&mut self, items: BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }

        let content = serde_json::to_string_pretty(&items)?;
        std::fs::write(&self.path, content)
            .map_err(|source| StorageError::Io { path: self.path.clone(), source })?;

        self.items = items;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.clone();
        items.insert(key.to_string(), value.to_string());
        self.commit(items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut items = self.items.clone();
        items.remove(key);
        self.commit(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[googletest::test]
    fn memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();

        storage.set_item("k", "v").unwrap();
        expect_that!(storage.get_item("k"), some(eq("v")));

        storage.remove_item("k").unwrap();
        expect_that!(storage.get_item("k"), none());
        expect_that!(storage.is_empty(), eq(true));
    }

    #[rstest]
    fn file_storage_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("storage.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("apll.lang", r#"{"v":"en","exp":1}"#).unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("apll.lang").as_deref(), Some(r#"{"v":"en","exp":1}"#));
    }

    #[rstest]
    fn file_storage_remove_is_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        storage.remove_item("a").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert!(reopened.get_item("a").is_none());
        assert_eq!(reopened.get_item("b").as_deref(), Some("2"));
    }

    #[rstest]
    fn file_storage_starts_empty_on_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::open(&path).unwrap();

        assert!(storage.get_item("apll.lang").is_none());
    }

    /// Turns the storage file's directory into a plain file so writes fail.
    fn block_directory(dir: &Path) {
        fs::remove_dir_all(dir).unwrap();
        fs::write(dir, "").unwrap();
    }

    #[rstest]
    fn file_storage_failed_write_keeps_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("state");
        let mut storage = FileStorage::open(state.join("storage.json")).unwrap();
        storage.set_item("apll.lang", "en").unwrap();

        block_directory(&state);
        let result = storage.set_item("apll.lang", "hi");

        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert_eq!(storage.get_item("apll.lang").as_deref(), Some("en"));
    }

    #[rstest]
    fn file_storage_failed_remove_keeps_value() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("state");
        let mut storage = FileStorage::open(state.join("storage.json")).unwrap();
        storage.set_item("apll.lang", "en").unwrap();

        block_directory(&state);

        assert!(storage.remove_item("apll.lang").is_err());
        assert_eq!(storage.get_item("apll.lang").as_deref(), Some("en"));
    }

    #[rstest]
    fn boxed_storage_delegates() {
        let mut storage: Box<dyn Storage> = Box::new(MemoryStorage::new());

        storage.set_item("k", "v").unwrap();

        assert_eq!(storage.get_item("k").as_deref(), Some("v"));
    }
}
