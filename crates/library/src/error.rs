// FILE: crates/library/src/error.rs

use bookstudio_core::StudioError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create storage directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for StudioError {
    fn from(err: StorageError) -> Self {
        StudioError::persistence("Could not write the library", err)
    }
}
