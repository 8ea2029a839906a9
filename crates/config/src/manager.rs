//! Locating, loading and saving the config file

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;

const APPLICATION_NAME: &str = "bookstudio";
const ENV_PREFIX: &str = "BOOKSTUDIO";

/// Knows where `config.toml` lives and how environment overrides apply
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Manager over the platform config directory
    ///
    /// - Linux: `~/.config/bookstudio/`
    /// - macOS: `~/Library/Application Support/bookstudio/`
    /// - Windows: `%APPDATA%\bookstudio\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::project_dirs()?.config_dir().to_path_buf();
        Self::with_directory(config_dir)
    }

    /// Manager over `config_dir/config.toml`
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let config_path = config_dir.join("config.toml");
        let persistence = ConfigPersistence::new(config_path);

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("", "", APPLICATION_NAME).ok_or_else(|| {
            ConfigError::PathResolutionError {
                reason: "Could not determine user home directory".to_string(),
            }
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Directory the library blob is stored in
    ///
    /// The configured `storage.data_dir` wins; otherwise the platform data
    /// directory for the application is used.
    pub fn resolve_data_dir(config: &Config) -> ConfigResult<PathBuf> {
        match config.storage.data_dir() {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Reads the file; a missing file yields defaults, a broken one an error
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Validates and writes atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Writes defaults unless a file is already there; true when written
    pub fn initialize(&self) -> ConfigResult<bool> {
        let path = self.config_path();
        if path.exists() {
            log::debug!("Keeping existing config at {}", path.display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Overwrites the file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Problems in the file on disk, one line each; empty when valid
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let problems = match self.load()?.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };
        Ok(problems)
    }

    /// Loads the config file and applies process environment overrides
    ///
    /// Variables follow the pattern `BOOKSTUDIO_<SECTION>_<FIELD>`, for
    /// example `BOOKSTUDIO_PROVIDER_CHAPTER_MODEL=gemini-2.5-flash`.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("After environment overrides: {}", error);
            }
        }

        Ok(config)
    }
}

fn variable(section: &str, field: &str) -> String {
    format!(
        "{}_{}_{}",
        ENV_PREFIX,
        section.to_ascii_uppercase(),
        field.to_ascii_uppercase()
    )
}

fn parse_secs(name: &str, value: String) -> ConfigResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidOverride {
            variable: name.to_string(),
            value,
            reason: e.to_string(),
        })
}

/// Applies `BOOKSTUDIO_*` overrides read through `lookup`
///
/// Unset variables leave the field untouched. A value that cannot be parsed
/// for its field is an error.
pub(crate) fn apply_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let text = |section: &str, field: &str| lookup(&variable(section, field));

    if let Some(value) = text("app", "log_level") {
        let name = variable("app", "log_level");
        config.app.log_level =
            value
                .parse::<LogLevel>()
                .map_err(|reason| ConfigError::InvalidOverride {
                    variable: name,
                    value: value.clone(),
                    reason,
                })?;
    }

    let provider = &mut config.provider;
    for (field, slot) in [
        ("api_base_url", &mut provider.api_base_url),
        ("api_key_env", &mut provider.api_key_env),
        ("text_model", &mut provider.text_model),
        ("chapter_model", &mut provider.chapter_model),
        ("image_model", &mut provider.image_model),
        ("output_language", &mut provider.output_language),
    ] {
        if let Some(value) = text("provider", field) {
            log::debug!("Override provider.{} from environment", field);
            *slot = value;
        }
    }

    for (field, slot) in [
        ("request_timeout_secs", &mut provider.request_timeout_secs),
        ("step_timeout_secs", &mut provider.step_timeout_secs),
    ] {
        if let Some(value) = text("provider", field) {
            *slot = parse_secs(&variable("provider", field), value)?;
        }
    }

    if let Some(value) = text("storage", "data_dir") {
        config.storage.data_dir = PathBuf::from(value);
    }

    Ok(())
}
