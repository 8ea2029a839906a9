//! Reading and writing `config.toml`
//!
//! A missing file means defaults. A present file must parse; values that
//! parse but fail validation only produce warnings on load and are refused
//! on save. Writes go through a temp file in the same directory.

use crate::{Config, ConfigError, ConfigResult, ValidationError, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Reads and writes one config file
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Loads the config file, or defaults when there is none
    pub fn load(&self) -> ConfigResult<Config> {
        let Some(contents) = self.read_contents()? else {
            log::info!(
                "No config at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        };

        let config = self.parse(&contents)?;
        if let Err(errors) = config.validate() {
            log::warn!(
                "Config at {} has invalid values: {}",
                self.config_path.display(),
                describe(&errors)
            );
        }
        Ok(config)
    }

    /// Validates `config` and writes it atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError(describe(&errors)))?;

        let rendered = toml::to_string_pretty(config)?;
        self.write_atomic(&rendered)?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn read_contents(&self) -> ConfigResult<Option<String>> {
        let contents = match fs::read_to_string(&self.config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::ReadError {
                    path: self.config_path.clone(),
                    source,
                })
            }
        };

        // A blank file is a truncated write, not a request for defaults
        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, "config file is blank"),
            });
        }
        Ok(Some(contents))
    }

    fn parse(&self, contents: &str) -> ConfigResult<Config> {
        let config: Config =
            toml::from_str(contents).map_err(|source| ConfigError::ParseError {
                path: self.config_path.clone(),
                source,
            })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "Config version {} is newer than {}; unknown keys are ignored",
                config.version,
                CONFIG_VERSION
            );
        }
        Ok(config)
    }

    fn write_atomic(&self, contents: &str) -> ConfigResult<()> {
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: format!("{} has no parent directory", self.config_path.display()),
            })?;

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::DirectoryCreationError {
                path: dir.to_path_buf(),
                source,
            })?;
            log::info!("Created config directory {}", dir.display());
        }

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.flush()?;
        staged
            .persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
