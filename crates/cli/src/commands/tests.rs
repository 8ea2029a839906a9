use super::*;
use async_trait::async_trait;
use bookstudio_core::{ChapterOutline, GenerationProvider, ProviderMetadata};
use bookstudio_library::MemoryBlobStorage;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

const COVER_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 7];

#[derive(Default)]
struct StubProvider {
    fail_chapters: AtomicBool,
}

#[async_trait]
impl GenerationProvider for StubProvider {
    async fn generate_outline(&self, _premise: &str) -> bookstudio_core::Result<Vec<ChapterOutline>> {
        Ok(vec![
            ChapterOutline::new("Arrival", "The heroine reaches the school."),
            ChapterOutline::new("Trial", "The first exam goes wrong."),
        ])
    }

    async fn generate_synopsis(
        &self,
        premise: &str,
        chapters: &[ChapterOutline],
    ) -> bookstudio_core::Result<String> {
        Ok(format!("{} ({} chapters)", premise, chapters.len()))
    }

    async fn generate_chapter_content(
        &self,
        title: &str,
        _summary: &str,
    ) -> bookstudio_core::Result<String> {
        if self.fail_chapters.load(Ordering::SeqCst) {
            return Err(StudioError::Provider {
                message: "quota exceeded".to_string(),
                source: None,
            });
        }
        Ok(format!("Text of {}", title))
    }

    async fn generate_cover_from_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        _title: &str,
    ) -> bookstudio_core::Result<Vec<u8>> {
        Ok(COVER_PNG.to_vec())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new("stub", "Canned answers")
    }
}

fn setup_studio() -> (Studio<MemoryBlobStorage>, Arc<StubProvider>) {
    let provider = Arc::new(StubProvider::default());
    let mut store = LibraryStore::new(MemoryBlobStorage::new());
    store.load();
    let studio = Studio::new(store, provider.clone());
    (studio, provider)
}

fn create_sample_book(studio: &Studio<MemoryBlobStorage>) -> String {
    new_book(studio, Some("Academy of Wands"), Some("A girl learns magic."))
        .unwrap()
        .to_string()
}

#[test]
fn test_gemini_config_follows_provider_section() {
    let mut provider = ProviderConfig::default();
    provider.chapter_model = "gemini-2.5-flash".to_string();
    provider.request_timeout_secs = 30;

    let gemini = gemini_config(&provider);
    assert_eq!(gemini.chapter_model, "gemini-2.5-flash");
    assert_eq!(gemini.request_timeout, std::time::Duration::from_secs(30));
    assert_eq!(gemini.api_key_env, provider.api_key_env);
}

#[test]
fn test_new_book_is_stored_with_fields() {
    let (studio, _) = setup_studio();
    let id = new_book(&studio, Some("Academy of Wands"), Some("A girl learns magic.")).unwrap();

    let book = studio.book(&id).unwrap();
    assert_eq!(book.title, "Academy of Wands");
    assert_eq!(book.premise, "A girl learns magic.");
    assert!(!studio.is_open());
}

#[test]
fn test_new_book_without_fields_uses_default_title() {
    let (studio, _) = setup_studio();
    let id = new_book(&studio, None, None).unwrap();

    let book = studio.book(&id).unwrap();
    assert_eq!(book.title, bookstudio_core::DEFAULT_BOOK_TITLE);
    assert_eq!(studio.books().len(), 1);
}

#[test]
fn test_list_and_show_books() {
    let (studio, _) = setup_studio();
    assert!(list_books(&studio).is_ok());

    let id = create_sample_book(&studio);
    assert!(list_books(&studio).is_ok());
    assert!(show_book(&studio, &id, false).is_ok());
    assert!(show_book(&studio, &id, true).is_ok());
}

#[test]
fn test_show_unknown_book_fails() {
    let (studio, _) = setup_studio();
    assert!(show_book(&studio, "missing", false).is_err());
}

#[test]
fn test_edit_book_saves_changes() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);

    edit_book(&studio, &id, None, None, Some("A tale of wands.")).unwrap();

    let book = studio.book(&BookId::from_string(&id)).unwrap();
    assert_eq!(book.synopsis, "A tale of wands.");
    assert_eq!(book.title, "Academy of Wands");
    assert!(!studio.is_open());
}

#[test]
fn test_edit_book_without_changes_is_rejected() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);

    assert!(edit_book(&studio, &id, None, None, None).is_err());
}

#[tokio::test]
async fn test_edit_chapter_uses_one_based_numbers() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);
    generate(&studio, &id, GenerateTarget::Outline).await.unwrap();

    edit_chapter(&studio, &id, 2, Some("The Exam"), None).unwrap();

    let book = studio.book(&BookId::from_string(&id)).unwrap();
    assert_eq!(book.chapters[0].title, "Arrival");
    assert_eq!(book.chapters[1].title, "The Exam");
    assert_eq!(book.chapters[1].summary, "The first exam goes wrong.");

    assert!(edit_chapter(&studio, &id, 0, Some("x"), None).is_err());
    assert!(edit_chapter(&studio, &id, 3, Some("x"), None).is_err());
    assert!(!studio.is_open());
}

#[test]
fn test_upload_cover_encodes_file_as_data_uri() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("reference.JPG");
    std::fs::write(&image, [0xff, 0xd8, 0xff, 0xe0]).unwrap();

    upload_cover(&studio, &id, &image).unwrap();

    let book = studio.book(&BookId::from_string(&id)).unwrap();
    assert_eq!(
        book.uploaded_cover_image.as_deref(),
        Some("data:image/jpeg;base64,/9j/4A==")
    );
}

#[test]
fn test_upload_cover_rejects_unknown_extension() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("reference.gif");
    std::fs::write(&image, b"GIF89a").unwrap();

    assert!(upload_cover(&studio, &id, &image).is_err());
    let book = studio.book(&BookId::from_string(&id)).unwrap();
    assert!(book.uploaded_cover_image.is_none());
}

#[tokio::test]
async fn test_generate_full_book() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("reference.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

    generate(&studio, &id, GenerateTarget::Outline).await.unwrap();
    generate(&studio, &id, GenerateTarget::Synopsis).await.unwrap();
    generate(&studio, &id, GenerateTarget::MissingChapters).await.unwrap();
    upload_cover(&studio, &id, &image).unwrap();
    generate(&studio, &id, GenerateTarget::Cover).await.unwrap();

    let book = studio.book(&BookId::from_string(&id)).unwrap();
    assert_eq!(book.synopsis, "A girl learns magic. (2 chapters)");
    assert_eq!(book.chapters[0].content.as_deref(), Some("Text of Arrival"));
    assert_eq!(book.chapters[1].content.as_deref(), Some("Text of Trial"));
    assert_eq!(
        book.cover_image_url.as_deref(),
        Some(DataUri::png(COVER_PNG.to_vec()).to_string().as_str())
    );

    let cover = export_cover(&studio, &id, Some(dir.path().join("cover.png"))).unwrap();
    assert_eq!(std::fs::read(cover).unwrap(), COVER_PNG);

    let markdown = export_markdown(&studio, &id, Some(dir.path().join("book.md"))).unwrap();
    let text = std::fs::read_to_string(markdown).unwrap();
    assert!(text.starts_with("# Academy of Wands"));
    assert!(text.contains("Text of Trial"));
}

#[tokio::test]
async fn test_generate_failure_leaves_book_unchanged() {
    let (studio, provider) = setup_studio();
    let id = create_sample_book(&studio);
    generate(&studio, &id, GenerateTarget::Outline).await.unwrap();
    provider.fail_chapters.store(true, Ordering::SeqCst);

    let before = studio.book(&BookId::from_string(&id)).unwrap();
    let result = generate(&studio, &id, GenerateTarget::Chapter(1)).await;

    assert!(result.is_err());
    assert_eq!(studio.book(&BookId::from_string(&id)).unwrap(), before);
    assert!(!studio.is_open());
}

#[tokio::test]
async fn test_generate_chapter_zero_is_rejected_before_opening() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);

    assert!(generate(&studio, &id, GenerateTarget::Chapter(0)).await.is_err());
    assert!(!studio.is_open());
}

#[tokio::test]
async fn test_generate_synopsis_without_outline_fails() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);

    let result = generate(&studio, &id, GenerateTarget::Synopsis).await;
    assert!(result.is_err());
    assert!(studio.book(&BookId::from_string(&id)).unwrap().synopsis.is_empty());
}

#[test]
fn test_export_cover_without_cover_fails() {
    let (studio, _) = setup_studio();
    let id = create_sample_book(&studio);
    let dir = TempDir::new().unwrap();

    let result = export_cover(&studio, &id, Some(dir.path().join("cover.png")));
    assert!(result.is_err());
    assert!(!dir.path().join("cover.png").exists());
}

#[test]
fn test_export_then_import_library() {
    let (studio, _) = setup_studio();
    create_sample_book(&studio);
    new_book(&studio, Some("Second"), None).unwrap();
    let dir = TempDir::new().unwrap();
    let path = export_library(&studio, Some(dir.path().join("library.json"))).unwrap();

    let (other, _) = setup_studio();
    import_library(&other, &path).unwrap();
    assert_eq!(other.books(), studio.books());
}

#[test]
fn test_import_invalid_file_keeps_library() {
    let (studio, _) = setup_studio();
    create_sample_book(&studio);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();

    assert!(import_library(&studio, &path).is_err());
    assert_eq!(studio.books().len(), 1);
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer sentence", 10), "a much ...");
    assert_eq!(truncate("ãéíõúãéíõú", 5), "ãé...");
}

#[test]
fn test_config_commands_round_trip() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();

    config_init(&manager).unwrap();
    assert!(manager.config_path().exists());
    assert!(config_validate(&manager).is_ok());

    std::fs::write(manager.config_path(), "[provider]\nrequest_timeout_secs = 0\n").unwrap();
    assert!(config_validate(&manager).is_err());

    config_reset(&manager).unwrap();
    assert!(config_validate(&manager).is_ok());
    assert_eq!(manager.load().unwrap(), Config::default());
}
