//! Generation provider configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generation provider endpoints, models and time limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the generative API
    pub api_base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Model used for outlines and synopses
    pub text_model: String,

    /// Model used for chapter prose
    pub chapter_model: String,

    /// Model used for cover images
    pub image_model: String,

    /// Language the generated text is written in
    pub output_language: String,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Upper bound for a whole generation step; 0 disables it
    pub step_timeout_secs: u64,
}

impl ProviderConfig {
    /// HTTP request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Step timeout, or `None` when disabled
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "API_KEY".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            chapter_model: "gemini-2.5-pro".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            output_language: "Brazilian Portuguese".to_string(),
            request_timeout_secs: 120,
            step_timeout_secs: 0,
        }
    }
}

impl ConfigSection for ProviderConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors([
            Validator::http_url(&self.api_base_url, "provider.api_base_url"),
            Validator::env_var_name(&self.api_key_env, "provider.api_key_env"),
            Validator::not_empty(&self.text_model, "provider.text_model"),
            Validator::not_empty(&self.chapter_model, "provider.chapter_model"),
            Validator::not_empty(&self.image_model, "provider.image_model"),
            Validator::not_empty(&self.output_language, "provider.output_language"),
            Validator::in_range(self.request_timeout_secs, 1..=600, "provider.request_timeout_secs"),
            Validator::in_range(self.step_timeout_secs, 0..=3600, "provider.step_timeout_secs"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.api_base_url = other.api_base_url;
        self.api_key_env = other.api_key_env;
        self.text_model = other.text_model;
        self.chapter_model = other.chapter_model;
        self.image_model = other.image_model;
        self.output_language = other.output_language;
        self.request_timeout_secs = other.request_timeout_secs;
        self.step_timeout_secs = other.step_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "provider"
    }
}
