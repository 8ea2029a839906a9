// crates/network/src/error.rs
//! Error types for network operations

use bookstudio_core::StudioError;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the service
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// The service answered without usable content
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// An image was requested but none came back
    #[error("Response contained no image")]
    NoImage,

    /// No API key in the configured environment variable
    #[error("API key not set; export {variable}")]
    MissingApiKey { variable: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetworkError {
    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (400..500).contains(status),
            NetworkError::Http(e) => e.status().is_some_and(|s| s.is_client_error()),
            _ => false,
        }
    }

    /// Returns true if the error is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => (500..600).contains(status),
            NetworkError::Http(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Decode(err.to_string())
    }
}

impl From<NetworkError> for StudioError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Decode(details) | NetworkError::EmptyResponse(details) => {
                StudioError::MalformedResponse { details }
            }
            NetworkError::NoImage => StudioError::NoImageReturned,
            other => StudioError::provider(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstudio_core::ErrorCategory;

    #[test]
    fn test_status_classification() {
        let quota = NetworkError::Status {
            status: 429,
            message: "Resource has been exhausted".to_string(),
        };
        assert!(quota.is_client_error());
        assert!(!quota.is_server_error());

        let outage = NetworkError::Status {
            status: 503,
            message: "The model is overloaded".to_string(),
        };
        assert!(outage.is_server_error());
    }

    #[test]
    fn test_conversion_to_studio_error() {
        let malformed: StudioError = NetworkError::Decode("expected array".into()).into();
        assert!(matches!(malformed, StudioError::MalformedResponse { .. }));

        let no_image: StudioError = NetworkError::NoImage.into();
        assert!(matches!(no_image, StudioError::NoImageReturned));

        let missing: StudioError = NetworkError::MissingApiKey {
            variable: "API_KEY".into(),
        }
        .into();
        assert_eq!(missing.category(), ErrorCategory::Provider);
        assert!(missing.to_string().contains("API_KEY"));
    }
}
