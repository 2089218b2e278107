//! Persistent storage slot for the serialized cart.
//!
//! A storage backend holds exactly one string-keyed slot. The cart store
//! reads it once when it opens and overwrites it wholesale after every
//! successful mutation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when reading or writing the storage slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The slot key cannot be mapped to a storage location.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Capability exposing a single persisted slot.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Read the slot. `None` means nothing has been saved yet.
    async fn load(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the slot.
    async fn save(&self, serialized: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage slot.
///
/// Useful for embedding the store where persistence is handled elsewhere,
/// and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: RwLock<Option<String>>,
}

impl MemoryStorage {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already holds `serialized`.
    #[must_use]
    pub fn with_contents(serialized: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(serialized.into())),
        }
    }

    /// Current contents of the slot.
    pub async fn contents(&self) -> Option<String> {
        self.slot.read().await.clone()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents().await)
    }

    async fn save(&self, serialized: &str) -> Result<(), StorageError> {
        *self.slot.write().await = Some(serialized.to_string());
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Storage slot backed by one file inside a directory.
///
/// The file name is derived from the slot key. Writes go to a temporary file
/// that is then renamed over the slot, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a file-backed slot for `key` inside `dir`.
    ///
    /// The directory is created on first save.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` if the key is blank.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Result<Self, StorageError> {
        let file_name = slot_file_name(key)?;
        Ok(Self {
            path: dir.as_ref().join(file_name),
        })
    }

    /// Path of the slot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CartStorage for FileStorage {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, serialized: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, serialized).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// Map a slot key to a portable file name.
fn slot_file_name(key: &str) -> Result<String, StorageError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }

    let stem: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    Ok(format!("{stem}.json"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_file_name() {
        assert_eq!(
            slot_file_name("@RocketShoes:cart").unwrap(),
            "_RocketShoes_cart.json"
        );
        assert_eq!(slot_file_name("cart-v2").unwrap(), "cart-v2.json");
        assert!(matches!(
            slot_file_name("   "),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("[]").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "@RocketShoes:cart").unwrap();
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_overwrites_slot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"), "@RocketShoes:cart").unwrap();

        storage.save(r#"[{"id":1}]"#).await.unwrap();
        storage.save("[]").await.unwrap();

        assert_eq!(storage.load().await.unwrap().as_deref(), Some("[]"));
        assert!(storage.path().ends_with("nested/_RocketShoes_cart.json"));
        assert!(!storage.temp_path().exists());
    }
}
