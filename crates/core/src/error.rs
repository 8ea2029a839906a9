//! Error types for BookStudio
//!
//! Every failure is classified into one of three categories:
//! - **Validation**: a precondition was not met; nothing left the process
//! - **Provider**: the generation service failed or answered with the wrong shape
//! - **Persistence**: durable storage or (de)serialization failed
//!
//! Errors are caught at the boundary of the operation that raised them and
//! shown next to the control that triggered it, via `user_message()`.
//! Nothing here is retried automatically.

use std::fmt;
use thiserror::Error;

/// Error category, as reported to the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Precondition unmet, handled locally
    Validation,
    /// Generation service failure of any kind
    Provider,
    /// Storage or serialization failure
    Persistence,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "Validation"),
            Self::Provider => write!(f, "Provider"),
            Self::Persistence => write!(f, "Persistence"),
        }
    }
}

/// Main error type for BookStudio
#[derive(Error, Debug)]
pub enum StudioError {
    // ===== Validation Errors =====
    /// A required field is missing or invalid
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// An image data URI could not be split into MIME type and payload
    #[error("Invalid image data: {reason}")]
    InvalidDataUri { reason: String },

    /// The step is already running for this session
    #[error("Step already in progress: {step}")]
    StepInFlight { step: String },

    /// An editing operation was attempted without an open book
    #[error("No book is open for editing")]
    NoActiveSession,

    /// The book id is not in the library
    #[error("Book not found: {id}")]
    BookNotFound { id: String },

    // ===== Provider Errors =====
    /// The generation service call failed (network, auth, quota, service)
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service answered, but the payload did not have the expected shape
    #[error("Malformed response from provider: {details}")]
    MalformedResponse { details: String },

    /// The image step answered without any image payload
    #[error("Provider returned no image")]
    NoImageReturned,

    /// The step did not complete within the configured limit
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    // ===== Persistence Errors =====
    /// Storage read/write or serialization failed
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An import payload was rejected; nothing was changed
    #[error("Invalid import: {reason}")]
    InvalidImport { reason: String },
}

impl StudioError {
    /// Returns the category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::InvalidDataUri { .. }
            | Self::StepInFlight { .. }
            | Self::NoActiveSession
            | Self::BookNotFound { .. } => ErrorCategory::Validation,

            Self::Provider { .. }
            | Self::MalformedResponse { .. }
            | Self::NoImageReturned
            | Self::Timeout { .. } => ErrorCategory::Provider,

            Self::Persistence { .. } | Self::InvalidImport { .. } => ErrorCategory::Persistence,
        }
    }

    /// Returns a user-friendly message suitable for display next to the control
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::InvalidDataUri { .. } => {
                "The uploaded image is not in a supported format.".to_string()
            }
            Self::StepInFlight { .. } => "This step is already running.".to_string(),
            Self::NoActiveSession => "Open a book before editing.".to_string(),
            Self::BookNotFound { .. } => "The requested book was not found.".to_string(),

            Self::Provider { .. } | Self::MalformedResponse { .. } | Self::Timeout { .. } => {
                "Generation failed. Please try again.".to_string()
            }
            Self::NoImageReturned => "No image was generated. Please try again.".to_string(),

            Self::Persistence { .. } => {
                "Could not save your library. Your changes are still open.".to_string()
            }
            Self::InvalidImport { .. } => {
                "Invalid import file. Make sure it is a library exported as JSON.".to_string()
            }
        }
    }

    /// Returns true if this error came from the generation service
    pub fn is_provider_failure(&self) -> bool {
        self.category() == ErrorCategory::Provider
    }

    /// Helper to create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Helper to create a provider error from any error type
    pub fn provider<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a persistence error from any error type
    pub fn persistence<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        Self::persistence("JSON serialization failed", err)
    }
}
