// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use bookstudio_config::{Config, ConfigManager, ProviderConfig};
use bookstudio_core::datauri::mime_type_for_extension;
use bookstudio_core::{Book, BookId, BookPatch, DataUri, StudioError};
use bookstudio_library::{
    BlobStorage, ExportFile, FileBlobStorage, LibraryStore, LoadStatus, StepOutcome, Studio,
};
use bookstudio_network::{GeminiConfig, GeminiProvider};
use console::style;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Generation step requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateTarget {
    Outline,
    Synopsis,
    Cover,
    /// 1-based chapter number
    Chapter(usize),
    MissingChapters,
}

/// Maps the provider section of the config onto the Gemini client settings
pub fn gemini_config(provider: &ProviderConfig) -> GeminiConfig {
    GeminiConfig {
        api_base_url: provider.api_base_url.clone(),
        api_key_env: provider.api_key_env.clone(),
        text_model: provider.text_model.clone(),
        chapter_model: provider.chapter_model.clone(),
        image_model: provider.image_model.clone(),
        output_language: provider.output_language.clone(),
        request_timeout: provider.request_timeout(),
    }
}

/// Loads the library from `data_dir` and wires it to the Gemini provider
pub fn open_studio(data_dir: &Path, config: &Config) -> Result<Studio<FileBlobStorage>> {
    debug!("Library directory: {}", data_dir.display());
    let mut store = LibraryStore::new(FileBlobStorage::new(data_dir))
        .with_corrupt_backup(config.storage.backup_corrupt_library);

    match store.load() {
        LoadStatus::Recovered { backup_key, reason } => eprintln!(
            "{} The stored library could not be read ({}). A copy was kept as '{}' and the library starts empty.",
            style("!").yellow().bold(),
            reason,
            backup_key
        ),
        LoadStatus::Unreadable { reason } => eprintln!(
            "{} The stored library could not be read ({}). The library starts empty.",
            style("!").yellow().bold(),
            reason
        ),
        LoadStatus::Fresh | LoadStatus::Loaded { .. } => {}
    }

    let provider = GeminiProvider::new(gemini_config(&config.provider))
        .context("Failed to create the generation client")?;

    Ok(Studio::new(store, Arc::new(provider)).with_step_timeout(config.provider.step_timeout()))
}

/// List all books in the library
pub fn list_books<S: BlobStorage>(studio: &Studio<S>) -> Result<()> {
    let books = studio.books();

    if books.is_empty() {
        println!("No books in library. Use 'new' command to start one.");
        return Ok(());
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }

    Ok(())
}

/// Create a book, optionally with a title and premise
pub fn new_book<S: BlobStorage>(
    studio: &Studio<S>,
    title: Option<&str>,
    premise: Option<&str>,
) -> Result<BookId> {
    let id = studio.create_new().map_err(user_error)?;

    let mut patch = BookPatch::new();
    if let Some(title) = title {
        patch = patch.title(title);
    }
    if let Some(premise) = premise {
        patch = patch.premise(premise);
    }

    let result = if patch.is_empty() {
        Ok(())
    } else {
        studio
            .apply_patch(patch)
            .and_then(|()| studio.save())
            .map(|_| ())
    };
    studio.close();
    result.map_err(user_error)?;

    println!("{} Book created successfully!", style("✓").green().bold());
    println!("  ID: {}", style(&id).dim());
    Ok(id)
}

/// Show one book with its chapters
pub fn show_book<S: BlobStorage>(studio: &Studio<S>, id: &str, as_json: bool) -> Result<()> {
    let book = find_book(studio, id)?;

    if as_json {
        let json = serde_json::to_string_pretty(&book).context("Failed to serialize book")?;
        println!("{}", json);
        return Ok(());
    }

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Title: {}", style(&book.title).bold());
    println!("ID: {}", book.id);
    println!("Premise: {}", or_placeholder(&book.premise));
    println!("Synopsis: {}", or_placeholder(&book.synopsis));
    println!(
        "Reference image: {}",
        if book.uploaded_cover_image.is_some() { "uploaded" } else { "none" }
    );
    println!(
        "Cover: {}",
        if book.cover_image_url.is_some() { "generated" } else { "none" }
    );

    if book.chapters.is_empty() {
        println!("\nNo chapters yet. Run 'generate outline' once the premise is set.");
        return Ok(());
    }

    println!("\n{}", style("Chapters").bold());
    for (index, chapter) in book.chapters.iter().enumerate() {
        let marker = if chapter.has_content() {
            style("✓").green()
        } else {
            style("·").dim()
        };
        println!("{} {:>2}. {}", marker, index + 1, style(&chapter.title).bold());
        if !chapter.summary.is_empty() {
            println!("      {}", truncate(&chapter.summary, 72));
        }
    }

    Ok(())
}

/// Edit the top-level fields of a book
pub fn edit_book<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    title: Option<&str>,
    premise: Option<&str>,
    synopsis: Option<&str>,
) -> Result<()> {
    let mut patch = BookPatch::new();
    if let Some(title) = title {
        patch = patch.title(title);
    }
    if let Some(premise) = premise {
        patch = patch.premise(premise);
    }
    if let Some(synopsis) = synopsis {
        patch = patch.synopsis(synopsis);
    }

    if patch.is_empty() {
        bail!("Nothing to change: pass --title, --premise or --synopsis");
    }

    edit_and_save(studio, id, |studio| studio.apply_patch(patch))
}

/// Edit the title or summary of chapter `number` (1-based)
pub fn edit_chapter<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    number: usize,
    title: Option<&str>,
    summary: Option<&str>,
) -> Result<()> {
    let index = chapter_index(number)?;
    if title.is_none() && summary.is_none() {
        bail!("Nothing to change: pass --title or --summary");
    }

    edit_and_save(studio, id, |studio| {
        studio.edit_chapter(index, title.map(str::to_string), summary.map(str::to_string))
    })
}

/// Attach an image file as the cover reference image
pub fn upload_cover<S: BlobStorage>(studio: &Studio<S>, id: &str, image: &Path) -> Result<()> {
    let extension = image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let Some(mime_type) = mime_type_for_extension(extension) else {
        bail!(
            "Unsupported image type for {}: use a PNG, JPEG or WebP file",
            image.display()
        );
    };

    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read image: {}", image.display()))?;
    let data_uri = DataUri::new(mime_type, bytes).to_string();

    edit_and_save(studio, id, |studio| studio.upload_cover_image(data_uri))
}

/// Run one generation step and save the book if it changed
pub async fn generate<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    target: GenerateTarget,
) -> Result<()> {
    if let GenerateTarget::Chapter(number) = target {
        chapter_index(number)?;
    }

    open_book(studio, id)?;
    let report = run_step(studio, target).await;

    let saved = if report.changed {
        studio.save().map(Some)
    } else {
        Ok(None)
    };
    studio.close();

    if let Some(notice) = saved.map_err(user_error)? {
        println!("{} {}", style("✓").green().bold(), notice);
    }

    match report.failures.len() {
        0 => Ok(()),
        1 => bail!("{}", report.failures[0]),
        n => bail!("{} steps failed:\n  {}", n, report.failures.join("\n  ")),
    }
}

/// Write the open book as Markdown
pub fn export_markdown<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    open_book(studio, id)?;
    let file = studio.export_markdown();
    studio.close();
    write_export(file.map_err(user_error)?, output)
}

/// Write the generated cover as PNG
pub fn export_cover<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    open_book(studio, id)?;
    let file = studio.export_cover();
    studio.close();
    write_export(file.map_err(user_error)?, output)
}

/// Export library data
pub fn export_library<S: BlobStorage>(studio: &Studio<S>, output: Option<PathBuf>) -> Result<PathBuf> {
    let count = studio.books().len();
    let file = studio.export_library().map_err(user_error)?;
    let path = write_export(file, output)?;
    println!("  {} books exported", style(count).bold());
    Ok(path)
}

/// Replace the library with the contents of a JSON export
pub fn import_library<S: BlobStorage>(studio: &Studio<S>, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read library file: {}", path.display()))?;
    let notice = studio.import_library(&raw).map_err(user_error)?;
    println!("{} {}", style("✓").green().bold(), notice);
    Ok(())
}

/// Write a default config file if none exists
pub fn config_init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to write the default config")?;
    if created {
        println!(
            "{} Created {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", manager.config_path().display());
    }
    Ok(())
}

/// Print the configuration in effect, environment overrides included
pub fn config_show(manager: &ConfigManager) -> Result<()> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;

    println!("# {}", manager.config_path().display());
    println!("{}", rendered);

    if let Err(errors) = config.validate() {
        for error in errors {
            eprintln!("{} {}", style("!").yellow().bold(), error);
        }
    }
    Ok(())
}

/// Report invalid values in the config file
pub fn config_validate(manager: &ConfigManager) -> Result<()> {
    let problems = manager
        .validate()
        .context("Failed to load configuration")?;
    if problems.is_empty() {
        println!("{} {} is valid", style("✓").green().bold(), manager.config_path().display());
        return Ok(());
    }

    for problem in &problems {
        println!("{} {}", style("✗").red().bold(), problem);
    }
    bail!("{} invalid config values", problems.len())
}

/// Overwrite the config file with defaults
pub fn config_reset(manager: &ConfigManager) -> Result<()> {
    manager.reset().context("Failed to reset configuration")?;
    println!(
        "{} Reset {} to defaults",
        style("✓").green().bold(),
        manager.config_path().display()
    );
    Ok(())
}

struct StepReport {
    changed: bool,
    failures: Vec<String>,
}

async fn run_step<S: BlobStorage>(studio: &Studio<S>, target: GenerateTarget) -> StepReport {
    let mut report = StepReport {
        changed: false,
        failures: Vec::new(),
    };

    let single = match target {
        GenerateTarget::Outline => ("Outline", studio.generate_outline().await),
        GenerateTarget::Synopsis => ("Synopsis", studio.generate_synopsis().await),
        GenerateTarget::Cover => ("Cover", studio.generate_cover().await),
        GenerateTarget::Chapter(number) => {
            let outcome = studio.generate_chapter_content(number.saturating_sub(1)).await;
            report_outcome(&mut report, &format!("Chapter {}", number), outcome);
            return report;
        }
        GenerateTarget::MissingChapters => {
            match studio.generate_missing_chapters().await {
                Ok(runs) if runs.is_empty() => println!("Every chapter already has content."),
                Ok(runs) => {
                    for (index, outcome) in runs {
                        report_outcome(&mut report, &format!("Chapter {}", index + 1), outcome);
                    }
                }
                Err(e) => report.failures.push(e.user_message()),
            }
            return report;
        }
    };

    report_outcome(&mut report, single.0, single.1);
    report
}

fn report_outcome(
    report: &mut StepReport,
    label: &str,
    outcome: bookstudio_core::Result<StepOutcome>,
) {
    match outcome {
        Ok(StepOutcome::Applied) => {
            report.changed = true;
            println!("{} {} generated", style("✓").green().bold(), label);
        }
        Ok(StepOutcome::Skipped) => {
            println!("{} {} already has content, skipped", style("·").dim(), label);
        }
        Ok(StepOutcome::Discarded) => {
            println!("{} {} result discarded: the book changed meanwhile", style("!").yellow().bold(), label);
        }
        Err(e) => {
            eprintln!("{} {}: {}", style("✗").red().bold(), label, e.user_message());
            report.failures.push(format!("{}: {}", label, e.user_message()));
        }
    }
}

fn open_book<S: BlobStorage>(studio: &Studio<S>, id: &str) -> Result<()> {
    studio
        .open(&BookId::from_string(id))
        .map_err(user_error)
}

fn edit_and_save<S: BlobStorage>(
    studio: &Studio<S>,
    id: &str,
    edit: impl FnOnce(&Studio<S>) -> bookstudio_core::Result<()>,
) -> Result<()> {
    open_book(studio, id)?;
    let result = edit(studio).and_then(|()| studio.save());
    studio.close();

    let notice = result.map_err(user_error)?;
    println!("{} {}", style("✓").green().bold(), notice);
    Ok(())
}

fn find_book<S: BlobStorage>(studio: &Studio<S>, id: &str) -> Result<Book> {
    let id = BookId::from_string(id);
    studio
        .book(&id)
        .ok_or_else(|| user_error(StudioError::BookNotFound { id: id.to_string() }))
}

fn write_export(file: ExportFile, output: Option<PathBuf>) -> Result<PathBuf> {
    let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
    std::fs::write(&path, &file.contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote {}", style("✓").green().bold(), path.display());
    Ok(path)
}

fn chapter_index(number: usize) -> Result<usize> {
    if number == 0 {
        bail!("Chapter numbers start at 1");
    }
    Ok(number - 1)
}

fn user_error(err: StudioError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn print_book_summary(book: &Book) {
    let written = book.chapters.iter().filter(|c| c.has_content()).count();

    println!("\n{}", style(&book.title).bold());
    println!("  ID: {}", style(&book.id).dim());
    if !book.premise.is_empty() {
        println!("  {}", truncate(&book.premise, 76));
    }
    print!("  Chapters: {}/{} written", written, book.chapters.len());
    if book.cover_image_url.is_some() {
        print!("  {}", style("Cover ready").green());
    }
    println!();
}

fn or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        style("(empty)").dim().to_string()
    } else {
        value.to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests;
