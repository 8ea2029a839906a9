//! Config errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures while locating, reading or writing `config.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML or has values of the wrong type
    #[error("Invalid TOML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Cannot render config as TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Refused to save values that fail validation
    #[error("Invalid config values: {0}")]
    ValidationError(String),

    #[error("Cannot create directory {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No home directory, or a path without a parent
    #[error("Cannot resolve directory: {reason}")]
    PathResolutionError { reason: String },

    /// A `BOOKSTUDIO_*` variable holds a value of the wrong type
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidOverride {
        variable: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path, e.g. `provider.text_model`
    pub field: String,

    pub message: String,

    /// Offending value when it can be shown
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} (got: {})", self.field, self.message, value),
            None => write!(f, "{} {}", self.field, self.message),
        }
    }
}

impl std::error::Error for ValidationError {}
