// FILE: crates/library/tests/scenario_tests.rs
//! End-to-end walk through a book, from creation to reload

mod common;

use bookstudio_core::{BookPatch, DEFAULT_BOOK_TITLE};
use bookstudio_library::{FileBlobStorage, LibraryStore, StepOutcome, Studio};
use common::FakeProvider;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_create_outline_synopsis_chapter_save_reload() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new());

    let mut store = LibraryStore::new(FileBlobStorage::new(dir.path()));
    store.load();
    let studio = Studio::new(store, provider.clone());

    let id = studio.create_new().unwrap();
    let fresh = studio.working_copy().unwrap();
    assert_eq!(fresh.title, DEFAULT_BOOK_TITLE);
    assert!(fresh.premise.is_empty() && fresh.synopsis.is_empty());
    assert!(fresh.chapters.is_empty());
    assert_eq!(fresh.uploaded_cover_image, None);
    assert_eq!(fresh.cover_image_url, None);

    studio
        .apply_patch(BookPatch::new().premise("A reluctant wizard must unite rival kingdoms"))
        .unwrap();

    assert_eq!(studio.generate_outline().await.unwrap(), StepOutcome::Applied);
    let outlined = studio.working_copy().unwrap();
    assert!(!outlined.chapters.is_empty());
    assert!(outlined
        .chapters
        .iter()
        .all(|c| !c.title.is_empty() && !c.summary.is_empty() && c.content.is_none()));

    assert_eq!(studio.generate_synopsis().await.unwrap(), StepOutcome::Applied);
    assert!(!studio.working_copy().unwrap().synopsis.is_empty());

    assert_eq!(
        studio.generate_chapter_content(0).await.unwrap(),
        StepOutcome::Applied
    );
    let written = studio.working_copy().unwrap();
    assert!(written.chapters[0].content.is_some());
    assert!(written.chapters[1..].iter().all(|c| c.content.is_none()));

    studio.save().unwrap();
    studio.close();

    let mut reloaded = LibraryStore::new(FileBlobStorage::new(dir.path()));
    reloaded.load();
    assert_eq!(reloaded.get(&id), Some(&written));

    studio.open(&id).unwrap();
    let export = studio.export_markdown().unwrap();
    let markdown = String::from_utf8(export.contents).unwrap();
    assert!(markdown.starts_with(&format!("# {}\n\n## Sinopse\n\n", DEFAULT_BOOK_TITLE)));
    assert!(markdown.contains(written.chapters[0].content.as_deref().unwrap()));
    assert!(markdown.contains(&written.chapters[1].summary));
}
