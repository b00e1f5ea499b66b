//! Plain text rendering.

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::Document;

use super::RenderOptions;

/// Convert a document to plain text: blocks in reading order, one per
/// line, pages separated by a blank line.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let text = doc
        .pages
        .iter()
        .filter(|page| options.pages.includes(page.number))
        .map(|page| page.text())
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = if options.normalize_unicode {
        text.nfc().collect::<String>()
    } else {
        text
    };
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::model::{Block, FontDescriptor, FontStyle, Page, Word};

    fn page(number: u32, lines: &[&str]) -> Page {
        let mut page = Page::new(number);
        for (i, line) in lines.iter().enumerate() {
            let y = 700.0 - i as f32 * 20.0;
            page.add_block(Block::new(vec![Word::new(
                *line,
                BBox::new(10.0, y, 100.0, y + 12.0).unwrap(),
                FontDescriptor::new("Times", 12.0, FontStyle::Normal),
            )
            .unwrap()]));
        }
        page
    }

    #[test]
    fn test_to_text() {
        let mut doc = Document::new();
        doc.add_page(page(0, &["Hello, world!", "Second block."]));
        doc.add_page(page(1, &["Next page"]));

        let result = to_text(&doc, &RenderOptions::default()).unwrap();
        assert_eq!(result, "Hello, world!\nSecond block.\n\nNext page");

        let options = RenderOptions::default().with_page_range(1..=1);
        assert_eq!(to_text(&doc, &options).unwrap(), "Next page");
    }
}
