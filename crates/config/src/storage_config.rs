//! Library storage configuration section

use crate::validation::{ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how the library blob is kept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the library; empty means the platform data dir
    pub data_dir: PathBuf,

    /// Copy an unreadable library aside before starting empty
    pub backup_corrupt_library: bool,
}

impl StorageConfig {
    /// Explicit data directory, if one is configured
    pub fn data_dir(&self) -> Option<&PathBuf> {
        if self.data_dir.as_os_str().is_empty() {
            None
        } else {
            Some(&self.data_dir)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            backup_corrupt_library: true,
        }
    }
}

impl ConfigSection for StorageConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(dir) = self.data_dir() {
            if dir.is_file() {
                errors.push(ValidationError::with_value(
                    "storage.data_dir",
                    "must be a directory, not a file",
                    dir.display(),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn merge(&mut self, other: Self) {
        if other.data_dir().is_some() {
            self.data_dir = other.data_dir;
        }
        self.backup_corrupt_library = other.backup_corrupt_library;
    }

    fn section_name(&self) -> &'static str {
        "storage"
    }
}
