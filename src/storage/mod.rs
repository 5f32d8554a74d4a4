pub mod json_backend;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::errors::CurrencyError;

pub type Result<T> = std::result::Result<T, CurrencyError>;

/// Durable byte-blob storage keyed by a tag string.
pub trait PersistenceAdapter: Send + Sync {
    /// Returns the blob stored under `tag`, or `None` when nothing was saved.
    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, tag: &str, bytes: &[u8]) -> Result<()>;
}

impl<T: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<T> {
    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(tag)
    }

    fn save(&self, tag: &str, bytes: &[u8]) -> Result<()> {
        (**self).save(tag, bytes)
    }
}

/// In-process storage. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tag: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.lock()?.insert(tag.into(), bytes.into());
        Ok(())
    }

    pub fn remove(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.remove(tag))
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| CurrencyError::Storage("memory storage lock poisoned".into()))
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(tag).cloned())
    }

    fn save(&self, tag: &str, bytes: &[u8]) -> Result<()> {
        self.lock()?.insert(tag.to_string(), bytes.to_vec());
        Ok(())
    }
}

pub use json_backend::JsonFileStorage;
