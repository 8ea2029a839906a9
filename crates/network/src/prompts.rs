// crates/network/src/prompts.rs
//! Instructions sent with each generation request

use bookstudio_core::ChapterOutline;

pub fn outline(premise: &str, language: &str) -> String {
    format!(
        "Create a detailed chapter outline for a book with the following premise: \"{premise}\". \
         Provide a list of chapters, each with a title and a one-paragraph summary. \
         Write the titles and summaries in {language}."
    )
}

pub fn synopsis(premise: &str, chapters: &[ChapterOutline], language: &str) -> String {
    let outline = chapters
        .iter()
        .map(|c| format!("- {}: {}", c.title, c.summary))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Based on the book premise \"{premise}\" and the chapter outline below, write a \
         captivating and concise back-cover synopsis (150-200 words) that draws readers in. \
         Write it in {language}.\n\nChapter outline:\n{outline}"
    )
}

pub fn chapter(title: &str, summary: &str, language: &str) -> String {
    format!(
        "Write the complete content of a book chapter.\n\n\
         Chapter title: \"{title}\"\n\
         Chapter summary: \"{summary}\"\n\n\
         Instructions:\n\
         - Develop the points of the summary into a rich, engaging narrative.\n\
         - Keep a tone and style consistent with a work of fiction.\n\
         - The chapter should be well paced, with a beginning, middle and end.\n\
         - Write in {language}.\n\
         - Reply with the chapter text only, without headings or extra formatting."
    )
}

pub fn cover(title: &str) -> String {
    format!(
        "Turn this image into book cover art for a book titled \"{title}\". \
         Add the title to the image in a stylized, prominent way. \
         Keep the artistic style of the original image but adapt it to look like a \
         professional book cover. The title must be the main focus and easy to read, \
         even as a thumbnail. Do not include author names."
    )
}
