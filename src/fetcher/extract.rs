//! Paragraph extraction from HTML.

use scraper::{Html, Selector};

/// Concatenates the text of the first `max_paragraphs` `<p>` elements.
///
/// Each paragraph's whitespace is collapsed and paragraphs are joined with a
/// newline. The running length, separators included, is measured in
/// characters; the paragraph that would push it past `max_chars` is dropped
/// whole, along with everything after it. Blank paragraphs count toward
/// `max_paragraphs` but add no text.
pub fn extract_paragraphs(html: &str, max_paragraphs: usize, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let paragraph = Selector::parse("p").expect("valid selector");

    let mut content = String::new();
    let mut used = 0usize;

    for element in document.select(&paragraph).take(max_paragraphs) {
        let text = normalize_whitespace(element.text());
        if text.is_empty() {
            continue;
        }

        let separator = usize::from(!content.is_empty());
        let len = text.chars().count();
        if used + separator + len > max_chars {
            break;
        }

        if separator == 1 {
            content.push('\n');
        }
        content.push_str(&text);
        used += separator + len;
    }

    content
}

fn normalize_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
