//! Download helpers: Markdown rendering and file names

use crate::types::Book;

/// File name used when exporting the whole library
pub const LIBRARY_EXPORT_FILENAME: &str = "ai_studio_library.json";

/// Heading used for the synopsis section of a Markdown export
pub const SYNOPSIS_HEADING: &str = "Sinopse";

/// Renders one book as a Markdown document
///
/// Chapters with generated content export their content; the others fall
/// back to their summary.
pub fn book_to_markdown(book: &Book) -> String {
    let mut markdown = format!("# {}\n\n", book.title);

    if !book.synopsis.is_empty() {
        markdown.push_str(&format!("## {}\n\n{}\n\n", SYNOPSIS_HEADING, book.synopsis));
    }

    for chapter in &book.chapters {
        let body = chapter.content.as_deref().unwrap_or(&chapter.summary);
        markdown.push_str(&format!("## {}\n\n{}\n\n", chapter.title, body));
    }

    markdown
}

/// `My Book` → `My_Book.md`
pub fn markdown_filename(title: &str) -> String {
    format!("{}.md", title.replace(' ', "_"))
}

/// `My Book` → `My_Book_cover.png`
pub fn cover_filename(title: &str) -> String {
    format!("{}_cover.png", title.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chapter;

    #[test]
    fn test_markdown_without_synopsis() {
        let mut book = Book::new();
        book.title = "Empty".to_string();

        assert_eq!(book_to_markdown(&book), "# Empty\n\n");
    }

    #[test]
    fn test_markdown_prefers_content_over_summary() {
        let mut book = Book::new();
        book.title = "The Wizard".to_string();
        book.synopsis = "Kingdoms unite.".to_string();
        book.chapters = vec![Chapter::new("Call", "He is called"), Chapter::new("Road", "He walks")];
        book.chapters[0].content = Some("Long ago...".to_string());

        let expected = "# The Wizard\n\n\
                        ## Sinopse\n\nKingdoms unite.\n\n\
                        ## Call\n\nLong ago...\n\n\
                        ## Road\n\nHe walks\n\n";
        assert_eq!(book_to_markdown(&book), expected);
    }

    #[test]
    fn test_filenames_replace_spaces() {
        assert_eq!(markdown_filename("A Long  Title"), "A_Long__Title.md");
        assert_eq!(cover_filename("A Long Title"), "A_Long_Title_cover.png");
    }
}
