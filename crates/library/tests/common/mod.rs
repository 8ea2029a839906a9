// FILE: crates/library/tests/common/mod.rs
//! Shared fixtures: a scripted provider and in-memory studios

#![allow(dead_code)]

use async_trait::async_trait;
use bookstudio_core::{ChapterOutline, GenerationProvider, ProviderMetadata, Result, StudioError};
use bookstudio_library::{LibraryStore, MemoryBlobStorage, Studio};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const COVER_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];
pub const REFERENCE_IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";
pub const OTHER_REFERENCE_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Provider with canned answers that counts its calls
///
/// Calls can be held open with [`FakeProvider::gate`] until the returned
/// sender fires, and forced to fail with [`FakeProvider::fail`].
pub struct FakeProvider {
    outline: Vec<ChapterOutline>,
    failing: Mutex<HashSet<&'static str>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            outline: vec![
                ChapterOutline::new("The Summons", "A wizard is called to court"),
                ChapterOutline::new("The Rivals", "Two kingdoms refuse to meet"),
                ChapterOutline::new("The Pact", "An uneasy alliance is sworn"),
            ],
            failing: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_outline(mut self, outline: Vec<ChapterOutline>) -> Self {
        self.outline = outline;
        self
    }

    /// Makes every later call of `method` fail with a provider error
    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    /// Holds the next call keyed `key` until the sender fires
    ///
    /// Keys are `outline`, `synopsis`, `cover` and `chapter:<title>`.
    pub fn gate(&self, key: impl Into<String>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key.into(), rx);
        tx
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn enter(&self, method: &'static str, gate: String) -> Result<()> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;

        let rx = self.gates.lock().unwrap().remove(&gate);
        if let Some(rx) = rx {
            let _ = rx.await;
        }

        if self.failing.lock().unwrap().contains(method) {
            return Err(StudioError::Provider {
                message: format!("{} quota exceeded", method),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn generate_outline(&self, _premise: &str) -> Result<Vec<ChapterOutline>> {
        self.enter("outline", "outline".to_string()).await?;
        Ok(self.outline.clone())
    }

    async fn generate_synopsis(&self, premise: &str, chapters: &[ChapterOutline]) -> Result<String> {
        self.enter("synopsis", "synopsis".to_string()).await?;
        Ok(format!("{} told in {} chapters.", premise, chapters.len()))
    }

    async fn generate_chapter_content(&self, title: &str, summary: &str) -> Result<String> {
        self.enter("chapter", format!("chapter:{}", title)).await?;
        Ok(format!("Full text of {}: {}", title, summary))
    }

    async fn generate_cover_from_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        _title: &str,
    ) -> Result<Vec<u8>> {
        self.enter("cover", "cover".to_string()).await?;
        Ok(COVER_PNG.to_vec())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new("fake", "Scripted test provider")
    }
}

/// Studio over fresh in-memory storage, plus a handle on that storage
pub fn studio(provider: &Arc<FakeProvider>) -> (Studio<MemoryBlobStorage>, MemoryBlobStorage) {
    studio_over(MemoryBlobStorage::new(), provider)
}

pub fn studio_over(
    storage: MemoryBlobStorage,
    provider: &Arc<FakeProvider>,
) -> (Studio<MemoryBlobStorage>, MemoryBlobStorage) {
    let mut store = LibraryStore::new(storage.clone());
    store.load();
    (Studio::new(store, provider.clone()), storage)
}
