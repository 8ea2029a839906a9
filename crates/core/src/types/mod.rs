//! Domain types for BookStudio
//!
//! - `book`: Book, Chapter, ChapterOutline and BookPatch
//! - `common`: Shared traits and serde helpers

mod book;
mod common;

// Re-export all public types
pub use book::{Book, BookId, BookPatch, Chapter, ChapterOutline, DEFAULT_BOOK_TITLE};
pub use common::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let book = Book::new();
        let _id: BookId = book.id.clone();
        let _patch: BookPatch = BookPatch::new().title("t");
        let _chapter: Chapter = ChapterOutline::new("t", "s").into();
    }
}
