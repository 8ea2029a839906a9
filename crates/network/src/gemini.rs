// crates/network/src/gemini.rs
//! `GenerationProvider` backed by the Google Generative Language API

use crate::client::{Client, ClientConfig};
use crate::error::{NetworkError, NetworkResult};
use crate::prompts;
use crate::wire::{outline_schema, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bookstudio_core::provider::ProviderMetadata;
use bookstudio_core::{ChapterOutline, GenerationProvider, Result};
use std::time::Duration;

/// Endpoint, models and language used by [`GeminiProvider`]
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base_url: String,
    /// Environment variable read for the API key on every call
    pub api_key_env: String,
    pub text_model: String,
    pub chapter_model: String,
    pub image_model: String,
    pub output_language: String,
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "API_KEY".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            chapter_model: "gemini-2.5-pro".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            output_language: "Brazilian Portuguese".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> NetworkResult<Self> {
        let client = Client::with_config(ClientConfig {
            timeout: config.request_timeout,
            ..ClientConfig::default()
        })?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: GeminiConfig) -> Self {
        Self {
            client,
            config,
            api_key: None,
        }
    }

    /// Uses `key` instead of reading the environment
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn api_key(&self) -> NetworkResult<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| NetworkError::MissingApiKey {
                variable: self.config.api_key_env.clone(),
            })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> NetworkResult<GenerateContentResponse> {
        let key = self.api_key()?;
        log::debug!("Calling {} ({})", model, self.config.api_base_url);
        self.client
            .post_json(
                &self.endpoint(model),
                &[("x-goog-api-key", key.as_str())],
                request,
            )
            .await
    }

    async fn generate_text(&self, model: &str, prompt: String) -> NetworkResult<String> {
        let response = self
            .generate(model, &GenerateContentRequest::text(prompt))
            .await?;
        text_of(&response)
    }
}

/// Text of a reply, or why there is none
fn text_of(response: &GenerateContentResponse) -> NetworkResult<String> {
    let text = response.text();
    if !text.trim().is_empty() {
        return Ok(text.trim().to_string());
    }
    Err(NetworkError::EmptyResponse(
        response
            .block_reason()
            .unwrap_or_else(|| "no text in reply".to_string()),
    ))
}

/// Reads an outline, tolerating a Markdown code fence around the JSON
pub(crate) fn parse_outline(text: &str) -> NetworkResult<Vec<ChapterOutline>> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let chapters: Vec<ChapterOutline> = serde_json::from_str(json)
        .map_err(|e| NetworkError::Decode(format!("outline is not a list of chapters: {}", e)))?;
    if chapters.is_empty() {
        return Err(NetworkError::Decode("outline has no chapters".to_string()));
    }
    Ok(chapters)
}

/// Decoded bytes of the first inline image in a reply
pub(crate) fn image_of(response: &GenerateContentResponse) -> NetworkResult<Vec<u8>> {
    let inline = response.first_inline_data().ok_or(NetworkError::NoImage)?;
    let bytes = STANDARD
        .decode(inline.data.trim())
        .map_err(|e| NetworkError::Decode(format!("image is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(NetworkError::NoImage);
    }
    Ok(bytes)
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate_outline(&self, premise: &str) -> Result<Vec<ChapterOutline>> {
        let request = GenerateContentRequest::text(prompts::outline(
            premise,
            &self.config.output_language,
        ))
        .with_config(GenerationConfig::json(outline_schema()));

        let response = self.generate(&self.config.text_model, &request).await?;
        let text = text_of(&response)?;
        Ok(parse_outline(&text)?)
    }

    async fn generate_synopsis(
        &self,
        premise: &str,
        chapters: &[ChapterOutline],
    ) -> Result<String> {
        let prompt = prompts::synopsis(premise, chapters, &self.config.output_language);
        Ok(self.generate_text(&self.config.text_model, prompt).await?)
    }

    async fn generate_chapter_content(&self, title: &str, summary: &str) -> Result<String> {
        let prompt = prompts::chapter(title, summary, &self.config.output_language);
        Ok(self.generate_text(&self.config.chapter_model, prompt).await?)
    }

    async fn generate_cover_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
        title: &str,
    ) -> Result<Vec<u8>> {
        let request = GenerateContentRequest::new(vec![
            Part::inline(mime_type, STANDARD.encode(image)),
            Part::text(prompts::cover(title)),
        ])
        .with_config(GenerationConfig::image());

        let response = self.generate(&self.config.image_model, &request).await?;
        Ok(image_of(&response)?)
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new("gemini", "Google Gemini generative models").with_auth(true)
    }
}
