// FILE: crates/library/src/storage.rs

//! Durable key/value blob storage backing the library

use crate::error::{StorageError, StorageResult};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;

/// Text blobs stored under string keys
///
/// Reads of a key that was never written return `Ok(None)`.
pub trait BlobStorage: Send + Sync {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>>;

    fn write_blob(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBlobStorage {
    dir: PathBuf,
}

impl FileBlobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn ensure_dir(&self) -> StorageResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| StorageError::DirectoryCreation {
                path: self.dir.display().to_string(),
                source: e,
            })?;
            debug!("Created storage directory {}", self.dir.display());
        }
        Ok(())
    }
}

impl BlobStorage for FileBlobStorage {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn write_blob(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        self.ensure_dir()?;

        let io_err = |source: std::io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp.write_all(value.as_bytes()).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Process-local storage; clones share the same blobs
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStorage {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one blob
    pub fn with_blob(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        storage
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn read_blob(&self, key: &str) -> StorageResult<Option<String>> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn write_blob(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
