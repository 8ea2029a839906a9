// FILE: src/provider.rs
// ============================================================================

use crate::error::Result;
use crate::types::ChapterOutline;
use async_trait::async_trait;

/// Generation provider capability
///
/// The generative service the pipeline talks to. Implementations report
/// transport, auth and quota failures as `StudioError::Provider`, payloads
/// of the wrong shape as `StudioError::MalformedResponse`, and image replies
/// without an image as `StudioError::NoImageReturned`.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produces a chapter outline for a premise
    async fn generate_outline(&self, premise: &str) -> Result<Vec<ChapterOutline>>;

    /// Writes a back-cover synopsis from the premise and outline
    async fn generate_synopsis(&self, premise: &str, chapters: &[ChapterOutline])
        -> Result<String>;

    /// Writes the full text of one chapter
    async fn generate_chapter_content(&self, title: &str, summary: &str) -> Result<String>;

    /// Turns a reference image into a titled cover, returning PNG bytes
    async fn generate_cover_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
        title: &str,
    ) -> Result<Vec<u8>>;

    /// Describes the provider
    fn metadata(&self) -> ProviderMetadata;
}

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub description: String,
    pub requires_auth: bool,
}

impl ProviderMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requires_auth: false,
        }
    }

    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }
}
