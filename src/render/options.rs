//! Rendering options and configuration.

use std::ops::RangeInclusive;

use crate::parser::DEFAULT_COLUMN_TOLERANCE;

/// Options for rendering a document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Render multi-column pages column by column
    pub preserve_columns: bool,

    /// Render accepted table candidates as pipe tables
    pub table_detection: bool,

    /// Include YAML frontmatter with metadata
    pub include_metadata: bool,

    /// Wrap body text to this many characters
    pub max_line_length: Option<usize>,

    /// Heading syntax
    pub heading_style: HeadingStyle,

    /// Horizontal tolerance for column membership (points)
    pub column_tolerance: f32,

    /// Apply NFC normalization to block text
    pub normalize_unicode: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Page selection
    pub pages: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable column-preserving output.
    pub fn with_columns(mut self, preserve: bool) -> Self {
        self.preserve_columns = preserve;
        self
    }

    /// Enable or disable table output.
    pub fn with_tables(mut self, tables: bool) -> Self {
        self.table_detection = tables;
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Set the wrap width for body text.
    pub fn with_line_length(mut self, width: usize) -> Self {
        self.max_line_length = Some(width);
        self
    }

    /// Set the heading syntax.
    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    /// Set the column tolerance.
    pub fn with_column_tolerance(mut self, tolerance: f32) -> Self {
        self.column_tolerance = tolerance;
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.pages = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.pages = PageSelection::Range(range);
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preserve_columns: true,
            table_detection: true,
            include_metadata: false,
            max_line_length: None,
            heading_style: HeadingStyle::Atx,
            column_tolerance: DEFAULT_COLUMN_TOLERANCE,
            normalize_unicode: true,
            escape_special_chars: false,
            pages: PageSelection::All,
        }
    }
}

/// Markdown heading syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// `#`-prefixed headings
    #[default]
    Atx,
    /// Underlined headings for levels 1 and 2, `#` below that
    Setext,
}

/// Page selection for rendering, by page number as reported by the source.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Render specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a selection string such as `all`, `2-5` or `0,3,7-9`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') && s.contains('-') {
            return parse_range(s).map(PageSelection::Range);
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            if part.contains('-') {
                pages.extend(parse_range(part)?);
            } else {
                pages.push(parse_page(part)?);
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_range(s: &str) -> Result<RangeInclusive<u32>, String> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| format!("Invalid page range: {:?}", s.trim()))?;
    let (start, end) = (parse_page(start)?, parse_page(end)?);
    if start > end {
        return Err(format!("Empty page range: {}", s.trim()));
    }
    Ok(start..=end)
}

fn parse_page(s: &str) -> Result<u32, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("Invalid page number: {:?}", s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_metadata(true)
            .with_line_length(72)
            .with_heading_style(HeadingStyle::Setext)
            .with_columns(false);

        assert!(options.include_metadata);
        assert_eq!(options.max_line_length, Some(72));
        assert_eq!(options.heading_style, HeadingStyle::Setext);
        assert!(!options.preserve_columns);
        assert!(options.table_detection);
    }

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert!(options.preserve_columns);
        assert!(options.normalize_unicode);
        assert!(!options.escape_special_chars);
        assert_eq!(options.column_tolerance, 10.0);
        assert_eq!(options.max_line_length, None);
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![0, 3]);
        assert!(pages.includes(0));
        assert!(!pages.includes(1));
        assert!(PageSelection::All.includes(99));
    }

    #[test]
    fn test_page_selection_parse() {
        assert!(matches!(PageSelection::parse("all").unwrap(), PageSelection::All));
        assert!(matches!(PageSelection::parse("1-10").unwrap(), PageSelection::Range(_)));

        match PageSelection::parse("7, 1,3-5,3").unwrap() {
            PageSelection::Pages(pages) => assert_eq!(pages, vec![1, 3, 4, 5, 7]),
            other => panic!("expected page list, got {:?}", other),
        }
        assert!(PageSelection::parse("x").is_err());
        assert!(PageSelection::parse("5-2").is_err());
        assert_eq!(
            PageSelection::parse("5-2,7").unwrap_err(),
            "Empty page range: 5-2"
        );
    }
}
