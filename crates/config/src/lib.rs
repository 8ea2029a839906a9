//! BookStudio Configuration System
//!
//! Settings for the studio: where the library lives, which generation
//! models are used and how long a step may run.
//!
//! # Architecture
//!
//! - **Trait-based**: Each section implements `ConfigSection`
//! - **Lenient loading**: out-of-range values are reported as warnings, a
//!   missing file means defaults
//! - **Atomic writes**: saves go through a temp file and a rename
//! - **Environment overrides**: `BOOKSTUDIO_<SECTION>_<FIELD>` wins over the file
//!
//! # Example
//!
//! ```rust,no_run
//! use bookstudio_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Chapter model: {}", config.provider.chapter_model);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod provider_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

// Re-export config sections
pub use app_config::{AppConfig, LogLevel};
pub use provider_config::ProviderConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Generation provider settings
    pub provider: ProviderConfig,

    /// Library storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Problems from every section, in section order
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.app.validate(),
            self.provider.validate(),
            self.storage.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Overwrites each section with the one from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.provider.merge(other.provider);
        self.storage.merge(other.storage);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            provider: ProviderConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
