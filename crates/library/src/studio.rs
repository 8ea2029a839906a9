// FILE: crates/library/src/studio.rs

//! The studio owns the library and the editor session
//!
//! All state sits behind one mutex that is only held for synchronous
//! sections. Generation steps (see `pipeline`) release it while the
//! provider works, so several steps can be in flight at once.

use crate::session::{EditorSession, StepId, StepStatus};
use crate::storage::BlobStorage;
use crate::store::{LibraryStore, LoadStatus};
use bookstudio_core::export::{
    book_to_markdown, cover_filename, markdown_filename, LIBRARY_EXPORT_FILENAME,
};
use bookstudio_core::{
    Book, BookId, BookPatch, DataUri, GenerationProvider, Result, StudioError,
};
use log::{debug, info};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Confirmation shown after a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    Imported { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Saved => write!(f, "Book saved successfully!"),
            Notice::Imported { count } => {
                write!(f, "Library imported successfully! ({} books)", count)
            }
        }
    }
}

/// A file ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: Vec<u8>,
}

pub(crate) struct Inner<S> {
    pub(crate) store: LibraryStore<S>,
    pub(crate) session: Option<EditorSession>,
    next_epoch: u64,
}

pub struct Studio<S> {
    pub(crate) inner: Mutex<Inner<S>>,
    pub(crate) provider: Arc<dyn GenerationProvider>,
    pub(crate) step_timeout: Option<Duration>,
}

impl<S: BlobStorage> Studio<S> {
    /// Creates a studio over an already loaded library
    pub fn new(store: LibraryStore<S>, provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store,
                session: None,
                next_epoch: 1,
            }),
            provider,
            step_timeout: None,
        }
    }

    /// Bounds every provider call made by a generation step
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the open session
    pub(crate) fn with_session<T>(
        &self,
        f: impl FnOnce(&mut EditorSession) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.lock();
        let session = inner.session.as_mut().ok_or(StudioError::NoActiveSession)?;
        f(session)
    }

    // ------------------------------------------------------------------
    // Library
    // ------------------------------------------------------------------

    pub fn books(&self) -> Vec<Book> {
        self.lock().store.books().to_vec()
    }

    pub fn book(&self, id: &BookId) -> Option<Book> {
        self.lock().store.get(id).cloned()
    }

    pub fn load_status(&self) -> LoadStatus {
        self.lock().store.load_status().clone()
    }

    pub fn export_library(&self) -> Result<ExportFile> {
        let json = self.lock().store.export_json()?;
        Ok(ExportFile {
            filename: LIBRARY_EXPORT_FILENAME.to_string(),
            contents: json.into_bytes(),
        })
    }

    /// Replaces the whole library; an open session keeps its working copy
    pub fn import_library(&self, raw: &str) -> Result<Notice> {
        let count = self.lock().store.import_json(raw)?;
        Ok(Notice::Imported { count })
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    fn start_session(inner: &mut Inner<S>, book: Book) {
        let epoch = inner.next_epoch;
        inner.next_epoch += 1;
        debug!("Opening book {} (session {})", book.id, epoch);
        inner.session = Some(EditorSession::new(book, epoch));
    }

    /// Opens a copy of the book with `id` for editing
    pub fn open(&self, id: &BookId) -> Result<()> {
        let mut inner = self.lock();
        let book = inner
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::BookNotFound { id: id.to_string() })?;
        Self::start_session(&mut inner, book);
        Ok(())
    }

    /// Creates a book, stores it right away and opens it
    pub fn create_new(&self) -> Result<BookId> {
        let book = Book::new();
        let id = book.id.clone();

        let mut inner = self.lock();
        inner.store.upsert(book.clone())?;
        info!("Created book {}", id);
        Self::start_session(&mut inner, book);
        Ok(id)
    }

    /// Drops the working copy without saving
    pub fn close(&self) {
        if let Some(session) = self.lock().session.take() {
            debug!("Closed book {} (session {})", session.book().id, session.epoch());
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Snapshot of the working copy
    pub fn working_copy(&self) -> Option<Book> {
        self.lock().session.as_ref().map(|s| s.book().clone())
    }

    /// True when the working copy differs from its library entry
    pub fn has_unsaved_changes(&self) -> bool {
        let inner = self.lock();
        match &inner.session {
            Some(session) => inner.store.get(&session.book().id) != Some(session.book()),
            None => false,
        }
    }

    pub fn step_status(&self, step: &StepId) -> StepStatus {
        self.lock()
            .session
            .as_ref()
            .map(|s| s.status(step))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn apply_patch(&self, patch: BookPatch) -> Result<()> {
        self.with_session(|session| {
            session.apply_patch(patch);
            Ok(())
        })
    }

    pub fn upload_cover_image(&self, data_uri: impl Into<String>) -> Result<()> {
        let data_uri = data_uri.into();
        self.with_session(|session| {
            session.upload_cover_image(data_uri);
            Ok(())
        })
    }

    pub fn edit_chapter(
        &self,
        index: usize,
        title: Option<String>,
        summary: Option<String>,
    ) -> Result<()> {
        self.with_session(|session| session.edit_chapter(index, title, summary))
    }

    /// Commits the working copy to the library
    pub fn save(&self) -> Result<Notice> {
        let mut inner = self.lock();
        let book = inner
            .session
            .as_ref()
            .map(|s| s.book().clone())
            .ok_or(StudioError::NoActiveSession)?;
        let id = book.id.clone();
        inner.store.upsert(book)?;
        info!("Saved book {}", id);
        Ok(Notice::Saved)
    }

    // ------------------------------------------------------------------
    // Exports of the open book
    // ------------------------------------------------------------------

    pub fn export_markdown(&self) -> Result<ExportFile> {
        self.with_session(|session| {
            let book = session.book();
            Ok(ExportFile {
                filename: markdown_filename(&book.title),
                contents: book_to_markdown(book).into_bytes(),
            })
        })
    }

    pub fn export_cover(&self) -> Result<ExportFile> {
        self.with_session(|session| {
            let book = session.book();
            let cover = book.cover_image_url.as_deref().ok_or_else(|| {
                StudioError::validation("coverImageUrl", "Generate a cover first.")
            })?;
            let uri = DataUri::parse(cover)?;
            Ok(ExportFile {
                filename: cover_filename(&book.title),
                contents: uri.into_data(),
            })
        })
    }
}
