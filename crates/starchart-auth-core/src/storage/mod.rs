//! Persistence providers for the credential store.
//!
//! A provider is a passive string store addressed by key. It holds the
//! serialized user table, the serialized session and whatever per-user
//! application data the surrounding app keeps next to them.
//!
//! - `MemoryStorage`: in-process map, used by tests and embedders
//! - `FileStorage`: one JSON file per key in a directory

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a key that does not exist is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn list_keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Read and deserialize a JSON blob. `None` when the key is absent.
pub(crate) fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub(crate) fn save_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let contents = serde_json::to_string(value)?;
    storage.set(key, &contents)
}
