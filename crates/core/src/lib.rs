//! Core domain for BookStudio
//!
//! Shared by every other crate in the workspace:
//! - `types`: books, chapters, patches
//! - `datauri`: `data:` URI encoding for uploaded and generated images
//! - `export`: Markdown and filename helpers for downloads
//! - `provider`: the generation capability the pipeline depends on
//! - `error`: the error taxonomy surfaced to users

pub mod datauri;
pub mod error;
pub mod export;
pub mod provider;
pub mod types;

// Re-export commonly used types
pub use datauri::DataUri;
pub use error::{ErrorCategory, Result, StudioError};
pub use provider::{GenerationProvider, ProviderMetadata};
pub use types::{Book, BookId, BookPatch, Chapter, ChapterOutline, Validator, DEFAULT_BOOK_TITLE};
