//! # layoutmd
//!
//! Layout reconstruction for extracted PDF content.
//!
//! PDF text extraction yields positioned fragments in arbitrary stream
//! order. This library rebuilds the reading structure of each page from
//! geometry and typography alone (merged text blocks, roles, reading order,
//! columns and tables) and renders it as Markdown, plain text or JSON.
//!
//! Input is the page content an extraction backend produces, supplied as
//! JSON ([`parser::DocumentInput`]) or through the [`parser::PageSource`]
//! trait.
//!
//! ## Quick Start
//!
//! ```no_run
//! use layoutmd::{parse_file, render};
//!
//! fn main() -> layoutmd::Result<()> {
//!     let doc = parse_file("report.json")?;
//!
//!     let options = render::RenderOptions::default();
//!     let markdown = render::to_markdown(&doc, &options)?;
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Fragment merging**: split glyph runs rejoined into blocks
//! - **Block roles**: title, headings, captions, list items, code
//! - **Reading order and columns**: top-to-bottom, column by column
//! - **Tables**: from ruling lines, cell rectangles or text alignment
//! - **Parallel processing**: pages processed with Rayon
//! - **Quality gate**: unpromising documents rejected up front

pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod render;

pub use error::{Error, Result};
pub use geometry::BBox;
pub use model::{
    Block, Document, FontDescriptor, FontStyle, Metadata, Page, QualityReport, Role,
    TableCandidate, Word,
};
pub use parser::{DocumentInput, LayoutParser, PageSource, ParseOptions};
pub use render::{HeadingStyle, JsonFormat, PageSelection, RenderOptions};

use std::io::Read;
use std::path::Path;

/// Build a document from any page source.
pub fn parse_source(source: &dyn PageSource, options: ParseOptions) -> Result<Document> {
    LayoutParser::new(options).parse(source)
}

/// Build a document from backend output held in memory.
pub fn parse_input(input: &DocumentInput) -> Result<Document> {
    parse_source(input, ParseOptions::default())
}

/// Build a document from backend output serialized as JSON.
///
/// # Example
///
/// ```
/// let json = r#"{
///     "pages": [{
///         "number": 0,
///         "bbox": [0, 0, 612, 792],
///         "spans": [{"text": "Hello", "bbox": [72, 700, 110, 712], "font": "Times", "size": 12}]
///     }]
/// }"#;
/// let doc = layoutmd::parse_json(json)?;
/// assert_eq!(doc.plain_text(), "Hello");
/// # Ok::<(), layoutmd::Error>(())
/// ```
pub fn parse_json(json: &str) -> Result<Document> {
    parse_input(&DocumentInput::from_json(json)?)
}

/// Build a document from JSON read from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    parse_input(&DocumentInput::from_reader(reader)?)
}

/// Build a document from a JSON file.
///
/// # Example
///
/// ```no_run
/// use layoutmd::parse_file;
///
/// let doc = parse_file("report.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Build a document from a JSON file with custom options.
///
/// ```no_run
/// use layoutmd::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().sequential().with_quality_check(false);
/// let doc = parse_file_with_options("report.json", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let input = DocumentInput::from_path(path)?;
    parse_source(&input, options)
}

/// Extract plain text from a JSON file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    Ok(doc.plain_text())
}

/// Convert a JSON file to Markdown.
///
/// ```no_run
/// let markdown = layoutmd::to_markdown("report.json").unwrap();
/// std::fs::write("report.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, &RenderOptions::default())
}

/// Convert a JSON file to Markdown with custom render options.
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &RenderOptions,
) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_markdown(&doc, options)
}

/// Convert a JSON file to plain text.
pub fn to_text<P: AsRef<Path>>(path: P, options: &RenderOptions) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_text(&doc, options)
}

/// Convert a JSON file to the structured document as JSON.
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}

/// Builder for parsing and rendering in one go.
///
/// # Example
///
/// ```no_run
/// use layoutmd::{Converter, HeadingStyle};
///
/// let markdown = Converter::new()
///     .with_metadata()
///     .with_heading_style(HeadingStyle::Setext)
///     .sequential()
///     .parse_file("report.json")?
///     .to_markdown()?;
/// # Ok::<(), layoutmd::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Converter {
    /// Create a converter with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Replace all render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parse_options = self.parse_options.sequential();
        self
    }

    /// Skip the quality gate.
    pub fn without_quality_check(mut self) -> Self {
        self.parse_options = self.parse_options.with_quality_check(false);
        self
    }

    /// Enable or disable table reconstruction and table output.
    pub fn with_tables(mut self, tables: bool) -> Self {
        self.parse_options = self.parse_options.with_table_detection(tables);
        self.render_options = self.render_options.with_tables(tables);
        self
    }

    /// Enable or disable column-preserving output.
    pub fn with_columns(mut self, preserve: bool) -> Self {
        self.render_options = self.render_options.with_columns(preserve);
        self
    }

    /// Enable frontmatter in output.
    pub fn with_metadata(mut self) -> Self {
        self.render_options = self.render_options.with_metadata(true);
        self
    }

    /// Set the heading syntax.
    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.render_options = self.render_options.with_heading_style(style);
        self
    }

    /// Wrap body text.
    pub fn with_line_length(mut self, width: usize) -> Self {
        self.render_options = self.render_options.with_line_length(width);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Parse any page source.
    pub fn parse_source(self, source: &dyn PageSource) -> Result<Conversion> {
        let document = parse_source(source, self.parse_options)?;
        Ok(Conversion {
            document,
            render_options: self.render_options,
        })
    }

    /// Parse backend output serialized as JSON.
    pub fn parse_json(self, json: &str) -> Result<Conversion> {
        let input = DocumentInput::from_json(json)?;
        self.parse_source(&input)
    }

    /// Parse a JSON file.
    pub fn parse_file<P: AsRef<Path>>(self, path: P) -> Result<Conversion> {
        let input = DocumentInput::from_path(path)?;
        self.parse_source(&input)
    }
}

/// A parsed document together with the options to render it.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The parsed document
    pub document: Document,
    render_options: RenderOptions,
}

impl Conversion {
    /// Convert to Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Quality report, if the gate ran.
    pub fn quality(&self) -> Option<&QualityReport> {
        self.document.diagnostics.quality.as_ref()
    }

    /// Pages that were skipped, with the reason.
    pub fn warnings(&self) -> &[String] {
        &self.document.diagnostics.warnings
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
