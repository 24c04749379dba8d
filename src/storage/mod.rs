// Durable key-value storage for locally persisted state.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// String key-value storage. Writes replace the whole value.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value; `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Keys become file names, so restrict them to a safe alphabet.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
