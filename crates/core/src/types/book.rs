//! Book and chapter domain models

use crate::types::common::optional_text;
use crate::types::Validator;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to every newly created book
pub const DEFAULT_BOOK_TITLE: &str = "Novo Livro Sem Título";

/// Unique identifier for a book
///
/// Opaque: ids created here look like `book_<uuid>`, but imported libraries
/// keep whatever ids they were written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a new random BookId
    pub fn new() -> Self {
        Self(format!("book_{}", Uuid::new_v4().simple()))
    }

    /// Wraps an existing id string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A book project the user is authoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub premise: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Reference image uploaded by the user, as a data URI
    #[serde(default, with = "optional_text")]
    pub uploaded_cover_image: Option<String>,
    /// Generated cover, as a data URI
    #[serde(default, with = "optional_text")]
    pub cover_image_url: Option<String>,
}

impl Book {
    /// Creates an empty book with a fresh id and the placeholder title
    pub fn new() -> Self {
        Self {
            id: BookId::new(),
            title: DEFAULT_BOOK_TITLE.to_string(),
            premise: String::new(),
            synopsis: String::new(),
            chapters: Vec::new(),
            uploaded_cover_image: None,
            cover_image_url: None,
        }
    }

    /// Merges a partial update into this book
    ///
    /// Fields absent from the patch are left as they are. The id never changes.
    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(premise) = patch.premise {
            self.premise = premise;
        }
        if let Some(synopsis) = patch.synopsis {
            self.synopsis = synopsis;
        }
        if let Some(chapters) = patch.chapters {
            self.chapters = chapters;
            self.clear_empty_content();
        }
        if let Some(uploaded) = patch.uploaded_cover_image {
            self.uploaded_cover_image = uploaded;
        }
        if let Some(cover) = patch.cover_image_url {
            self.cover_image_url = cover;
        }
    }

    /// Turns empty chapter text into no text, matching how it is stored
    pub fn clear_empty_content(&mut self) {
        for chapter in &mut self.chapters {
            if chapter.content.as_deref() == Some("") {
                chapter.content = None;
            }
        }
    }

    /// Edits one chapter's title and/or summary in place
    ///
    /// Returns false if there is no chapter at `index`.
    pub fn edit_chapter(
        &mut self,
        index: usize,
        title: Option<String>,
        summary: Option<String>,
    ) -> bool {
        let Some(chapter) = self.chapters.get_mut(index) else {
            return false;
        };
        if let Some(title) = title {
            chapter.title = title;
        }
        if let Some(summary) = summary {
            chapter.summary = summary;
        }
        true
    }

    /// Returns the chapters that still need their content generated
    pub fn chapters_without_content(&self) -> Vec<usize> {
        self.chapters
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.has_content())
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One unit of a book's outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub summary: String,
    #[serde(
        default,
        deserialize_with = "optional_text::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
}

impl Chapter {
    /// Creates a chapter without content
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            content: None,
        }
    }

    /// Returns true once the chapter's full text has been generated
    ///
    /// Empty text counts as no content, the same as it is stored.
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Title and summary pair produced by outline generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub title: String,
    pub summary: String,
}

impl ChapterOutline {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
        }
    }
}

impl From<ChapterOutline> for Chapter {
    fn from(outline: ChapterOutline) -> Self {
        Chapter::new(outline.title, outline.summary)
    }
}

impl From<&Chapter> for ChapterOutline {
    fn from(chapter: &Chapter) -> Self {
        ChapterOutline::new(chapter.title.clone(), chapter.summary.clone())
    }
}

/// Partial update of a book's editable fields
///
/// Image fields are doubly optional: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub premise: Option<String>,
    pub synopsis: Option<String>,
    pub chapters: Option<Vec<Chapter>>,
    pub uploaded_cover_image: Option<Option<String>>,
    pub cover_image_url: Option<Option<String>>,
}

impl BookPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn premise(mut self, premise: impl Into<String>) -> Self {
        self.premise = Some(premise.into());
        self
    }

    pub fn synopsis(mut self, synopsis: impl Into<String>) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }

    pub fn chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = Some(chapters);
        self
    }

    pub fn uploaded_cover_image(mut self, image: Option<String>) -> Self {
        self.uploaded_cover_image = Some(image);
        self
    }

    pub fn cover_image_url(mut self, image: Option<String>) -> Self {
        self.cover_image_url = Some(image);
        self
    }

    /// Returns true if the patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
