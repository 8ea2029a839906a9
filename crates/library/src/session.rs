// FILE: crates/library/src/session.rs

//! The working copy of the one book being edited

use bookstudio_core::{Book, BookPatch, Result, StudioError};
use std::collections::HashMap;
use std::fmt;

/// Identifies one generation step of the open book
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepId {
    Outline,
    Synopsis,
    Cover,
    ChapterContent(usize),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Outline => write!(f, "outline"),
            StepId::Synopsis => write!(f, "synopsis"),
            StepId::Cover => write!(f, "cover"),
            StepId::ChapterContent(index) => write!(f, "chapter {}", index + 1),
        }
    }
}

/// Progress of a generation step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Idle,
    InFlight,
    /// Last run failed; holds the message shown next to the control
    Failed(String),
}

impl StepStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, StepStatus::InFlight)
    }
}

/// An open book plus the status of its generation steps
///
/// `epoch` changes every time a book is opened or created, so results
/// computed for an earlier session can be told apart.
#[derive(Debug, Clone)]
pub struct EditorSession {
    book: Book,
    epoch: u64,
    steps: HashMap<StepId, StepStatus>,
}

impl EditorSession {
    pub fn new(book: Book, epoch: u64) -> Self {
        Self {
            book,
            epoch,
            steps: HashMap::new(),
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub(crate) fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self, step: &StepId) -> StepStatus {
        self.steps.get(step).cloned().unwrap_or_default()
    }

    pub(crate) fn set_status(&mut self, step: StepId, status: StepStatus) {
        if status == StepStatus::Idle {
            self.steps.remove(&step);
        } else {
            self.steps.insert(step, status);
        }
    }

    /// Steps that are not idle
    pub fn active_steps(&self) -> Vec<(StepId, StepStatus)> {
        let mut steps: Vec<_> = self
            .steps
            .iter()
            .map(|(id, status)| (id.clone(), status.clone()))
            .collect();
        steps.sort_by_key(|(id, _)| id.to_string());
        steps
    }

    pub fn apply_patch(&mut self, patch: BookPatch) {
        self.book.apply(patch);
    }

    /// Sets the reference image and drops any cover generated from the old one
    pub fn upload_cover_image(&mut self, data_uri: impl Into<String>) {
        self.apply_patch(
            BookPatch::new()
                .uploaded_cover_image(Some(data_uri.into()))
                .cover_image_url(None),
        );
    }

    pub fn edit_chapter(
        &mut self,
        index: usize,
        title: Option<String>,
        summary: Option<String>,
    ) -> Result<()> {
        if self.book.edit_chapter(index, title, summary) {
            Ok(())
        } else {
            Err(StudioError::validation(
                "chapters",
                format!("Chapter {} does not exist.", index + 1),
            ))
        }
    }
}
