// FILE: crates/library/src/store.rs

//! The library: every book, persisted as one JSON blob

use crate::storage::BlobStorage;
use bookstudio_core::{Book, BookId, Result, StudioError, Validator};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::HashSet;

/// Storage key of the library blob
pub const LIBRARY_KEY: &str = "ai-studio-library";

/// Storage key an unreadable library blob is copied to
pub const CORRUPT_LIBRARY_KEY: &str = "ai-studio-library.corrupt";

/// What happened when the library was loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing stored yet
    Fresh,
    /// Library parsed
    Loaded { count: usize },
    /// Blob did not parse; it was copied aside and the library starts empty
    Recovered { backup_key: String, reason: String },
    /// Blob could not be read or backed up; the library starts empty
    Unreadable { reason: String },
}

impl LoadStatus {
    /// Returns true if the stored library was lost on load
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Recovered { .. } | Self::Unreadable { .. })
    }
}

/// In-memory library mirrored to a `BlobStorage`
pub struct LibraryStore<S> {
    storage: S,
    books: Vec<Book>,
    status: LoadStatus,
    backup_corrupt: bool,
}

impl<S: BlobStorage> LibraryStore<S> {
    /// Empty store over `storage`; call [`load`](Self::load) to read it
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            books: Vec::new(),
            status: LoadStatus::Fresh,
            backup_corrupt: true,
        }
    }

    /// Whether an unparsable blob is copied to [`CORRUPT_LIBRARY_KEY`]
    pub fn with_corrupt_backup(mut self, enabled: bool) -> Self {
        self.backup_corrupt = enabled;
        self
    }

    /// Reads the library from storage, degrading to empty on any failure
    pub fn load(&mut self) -> &LoadStatus {
        let (books, status) = self.read_library();
        self.books = books;
        self.status = status;
        &self.status
    }

    fn read_library(&self) -> (Vec<Book>, LoadStatus) {
        let raw = match self.storage.read_blob(LIBRARY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No library stored yet, starting empty");
                return (Vec::new(), LoadStatus::Fresh);
            }
            Err(e) => {
                error!("Failed to read library: {}", e);
                return (
                    Vec::new(),
                    LoadStatus::Unreadable {
                        reason: e.to_string(),
                    },
                );
            }
        };

        match serde_json::from_str::<Vec<Book>>(&raw) {
            Ok(books) => {
                info!("Loaded {} books from library", books.len());
                let count = books.len();
                (books, LoadStatus::Loaded { count })
            }
            Err(e) => {
                error!("Failed to parse library, starting empty: {}", e);
                (Vec::new(), self.back_up_corrupt(&raw, e.to_string()))
            }
        }
    }

    fn back_up_corrupt(&self, raw: &str, reason: String) -> LoadStatus {
        if !self.backup_corrupt {
            return LoadStatus::Unreadable { reason };
        }
        match self.storage.write_blob(CORRUPT_LIBRARY_KEY, raw) {
            Ok(()) => {
                warn!("Copied unreadable library to '{}'", CORRUPT_LIBRARY_KEY);
                LoadStatus::Recovered {
                    backup_key: CORRUPT_LIBRARY_KEY.to_string(),
                    reason,
                }
            }
            Err(e) => {
                error!("Failed to back up unreadable library: {}", e);
                LoadStatus::Unreadable { reason }
            }
        }
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn get(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Overwrites the stored library with `books`
    ///
    /// The in-memory library only changes once the write succeeded.
    pub fn persist(&mut self, mut books: Vec<Book>) -> Result<()> {
        books.iter_mut().for_each(Book::clear_empty_content);
        let serialized = serde_json::to_string(&books)?;
        self.storage.write_blob(LIBRARY_KEY, &serialized)?;
        debug!("Persisted library with {} books", books.len());
        self.books = books;
        Ok(())
    }

    /// Replaces the book with the same id, or appends it, then persists
    pub fn upsert(&mut self, book: Book) -> Result<()> {
        let mut books = self.books.clone();
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => books.push(book),
        }
        self.persist(books)
    }

    /// The whole library as pretty-printed JSON
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.books)?)
    }

    /// Replaces the library with the books in `raw`
    ///
    /// Nothing changes, in memory or in storage, unless every element is a
    /// book with a non-empty id and title and the ids are unique.
    pub fn import_json(&mut self, raw: &str) -> Result<usize> {
        let books = parse_import(raw)?;
        let count = books.len();
        self.persist(books)?;
        info!("Imported library with {} books", count);
        Ok(count)
    }
}

fn invalid(reason: impl Into<String>) -> StudioError {
    StudioError::InvalidImport {
        reason: reason.into(),
    }
}

fn parse_import(raw: &str) -> Result<Vec<Book>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| invalid(format!("not valid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(invalid("expected a JSON array of books"));
    };

    for (index, item) in items.iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(invalid(format!("element {} is not an object", index)));
        };
        for key in ["id", "title"] {
            let present = fields
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(invalid(format!(
                    "element {} has no non-empty '{}'",
                    index, key
                )));
            }
        }
    }

    let books: Vec<Book> = serde_json::from_value(Value::Array(items))
        .map_err(|e| invalid(format!("not a library: {}", e)))?;

    let mut seen = HashSet::new();
    for book in &books {
        if let Err(errors) = book.validate() {
            return Err(invalid(errors.join(", ")));
        }
        if !seen.insert(book.id.as_str()) {
            return Err(invalid(format!("duplicate book id '{}'", book.id)));
        }
    }

    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStorage;

    fn store() -> LibraryStore<MemoryBlobStorage> {
        let mut store = LibraryStore::new(MemoryBlobStorage::new());
        store.load();
        store
    }

    #[test]
    fn test_load_fresh() {
        let store = store();
        assert_eq!(store.load_status(), &LoadStatus::Fresh);
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let mut store = store();
        let mut book = Book::new();
        store.upsert(book.clone()).unwrap();

        book.title = "Renamed".to_string();
        store.upsert(book.clone()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&book.id).unwrap().title, "Renamed");
    }

    #[test]
    fn test_upsert_keeps_order() {
        let mut store = store();
        let first = Book::new();
        let second = Book::new();
        store.upsert(first.clone()).unwrap();
        store.upsert(second.clone()).unwrap();
        store.upsert(first.clone()).unwrap();

        let ids: Vec<_> = store.books().iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_parse_import_rejects_non_array() {
        let err = parse_import(r#"{"id":"a","title":"t"}"#).unwrap_err();
        assert!(matches!(err, StudioError::InvalidImport { .. }));
    }

    #[test]
    fn test_parse_import_requires_id_and_title() {
        assert!(parse_import(r#"[{"title":"t"}]"#).is_err());
        assert!(parse_import(r#"[{"id":"a","title":""}]"#).is_err());
        assert!(parse_import(r#"[{"id":"a","title":"t"}, 3]"#).is_err());
        assert_eq!(parse_import(r#"[{"id":"a","title":"t"}]"#).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_import_rejects_duplicate_ids() {
        let err = parse_import(r#"[{"id":"a","title":"t"},{"id":"a","title":"u"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_parse_import_accepts_empty_array() {
        assert!(parse_import("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_status_degraded() {
        assert!(!LoadStatus::Fresh.is_degraded());
        assert!(!LoadStatus::Loaded { count: 2 }.is_degraded());
        assert!(LoadStatus::Unreadable {
            reason: "x".into()
        }
        .is_degraded());
    }
}
