// crates/network/src/client.rs
//! HTTP client wrapper

use crate::error::{NetworkError, NetworkResult};
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            user_agent: format!("BookStudio/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Thin JSON-over-HTTP client
///
/// Failed requests are reported once; callers decide what to do next.
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

/// Error envelope used by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs `body` as JSON and decodes a JSON reply
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> NetworkResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NetworkError::InvalidUrl(url.to_string()));
        }

        let mut request = self.inner.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown".to_string());
            log::warn!("POST {} failed with HTTP {}: {}", url, status.as_u16(), message);
            return Err(NetworkError::Status {
                status: status.as_u16(),
                message,
            });
        }

        log::debug!("POST {} -> {} ({} bytes)", url, status.as_u16(), text.len());
        Ok(serde_json::from_str(&text)?)
    }
}

fn error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let ErrorBody { message, status } = envelope.error;
    match status {
        Some(status) if !message.is_empty() => Some(format!("{} ({})", message, status)),
        Some(status) => Some(status),
        None if !message.is_empty() => Some(message),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_redirects, 10);
        assert!(config.user_agent.starts_with("BookStudio/"));
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = ClientConfig {
            timeout: Duration::from_secs(10),
            user_agent: "TestAgent".to_string(),
            max_redirects: 5,
        };

        let client = Client::with_config(config).expect("Failed to create client");
        assert_eq!(client.config().user_agent, "TestAgent");
    }

    #[test]
    fn test_error_message_from_google_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Quota exceeded (RESOURCE_EXHAUSTED)")
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_rejects_relative_url() {
        let client = Client::new().expect("Failed to create client");
        let result: NetworkResult<serde_json::Value> =
            tokio_test::block_on(client.post_json("models/x:generateContent", &[], &()));
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    }
}
