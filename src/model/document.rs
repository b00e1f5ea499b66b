//! Document-level types.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FontDescriptor, Page};

/// Separator used between pages in plain-text and Markdown output.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// A reconstructed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Pages that survived processing, in page order
    pub pages: Vec<Page>,

    /// Source identifier (usually the input path)
    pub source: Option<String>,

    /// Quality report and recovered per-page problems
    pub diagnostics: Diagnostics,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            pages: Vec::new(),
            source: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Find a page by its page number.
    pub fn get_page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn total_word_count(&self) -> usize {
        self.pages.iter().map(|p| p.word_count()).sum()
    }

    pub fn total_block_count(&self) -> usize {
        self.pages.iter().map(|p| p.block_count()).sum()
    }

    /// Distinct fonts across all pages, in order of first appearance.
    pub fn unique_fonts(&self) -> Vec<&FontDescriptor> {
        let mut seen = HashSet::new();
        self.pages
            .iter()
            .flat_map(|p| p.all_words())
            .map(|w| w.font())
            .filter(|f| seen.insert(f.key()))
            .collect()
    }

    /// Plain text of every page joined by `separator`.
    pub fn get_text(&self, separator: &str) -> String {
        self.pages
            .iter()
            .map(|page| page.text())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Plain text with the default page separator.
    pub fn plain_text(&self) -> String {
        self.get_text(PAGE_SEPARATOR)
    }

    /// Font sizes in descending order, each with an inferred role.
    pub fn typography_hierarchy(&self) -> Vec<TypographyLevel> {
        let fonts = self.unique_fonts();
        let mut sizes: Vec<f32> = Vec::new();
        for font in &fonts {
            if !sizes.contains(&font.size) {
                sizes.push(font.size);
            }
        }
        sizes.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        sizes
            .iter()
            .enumerate()
            .map(|(position, &size)| TypographyLevel {
                level: position + 1,
                size,
                fonts: fonts
                    .iter()
                    .filter(|f| f.size == size)
                    .map(|f| (*f).clone())
                    .collect(),
                role: TypographyRole::infer(size, position),
            })
            .collect()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// One font size in the document's typographic hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypographyLevel {
    /// 1 for the largest size
    pub level: usize,
    pub size: f32,
    pub fonts: Vec<FontDescriptor>,
    pub role: TypographyRole,
}

/// Likely purpose of a font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypographyRole {
    MainTitle,
    Title,
    SectionHeader,
    SubsectionHeader,
    CaptionOrFootnote,
    BodyText,
}

impl TypographyRole {
    /// Infer the role from the size and its rank among all sizes.
    fn infer(size: f32, position: usize) -> Self {
        match position {
            0 if size >= 18.0 => TypographyRole::MainTitle,
            0 => TypographyRole::Title,
            1 if size >= 14.0 => TypographyRole::SectionHeader,
            1 | 2 if size >= 12.0 => TypographyRole::SubsectionHeader,
            _ if size <= 10.0 => TypographyRole::CaptionOrFootnote,
            _ => TypographyRole::BodyText,
        }
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Producer application
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Source format reported by the backend (e.g., "PDF 1.7")
    pub format: Option<String>,

    /// Number of pages reported by the backend
    pub page_count: u32,
}

impl Metadata {
    /// Convert metadata to YAML frontmatter format.
    ///
    /// Only a fixed set of keys is written; strings are double-quoted.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        let strings = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("creator", &self.creator),
            ("producer", &self.producer),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                lines.push(format!("{}: \"{}\"", key, escape_yaml(value)));
            }
        }
        if let Some(ref created) = self.created {
            lines.push(format!("creation_date: \"{}\"", created.to_rfc3339()));
        }
        if let Some(ref modified) = self.modified {
            lines.push(format!("modification_date: \"{}\"", modified.to_rfc3339()));
        }
        lines.push(format!("page_count: {}", self.page_count));

        lines.push("---".to_string());
        lines.push(String::new());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Outcome of the pre-processing quality check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Final score in [0, 1]
    pub score: f32,

    /// Human-readable reasons the score was lowered
    pub issues: Vec<String>,

    /// Average spans per sampled page
    pub avg_blocks_per_page: f32,

    /// Drawings across sampled pages
    pub total_drawings: usize,

    /// Sampled pages without any text
    pub empty_pages: usize,
}

/// Problems recorded while building the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Quality report, when the gate ran
    pub quality: Option<QualityReport>,

    /// Skipped pages and other recovered failures
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::model::{Block, FontStyle, Word};

    fn page_with_sizes(number: u32, sizes: &[f32]) -> Page {
        let mut page = Page::new(number);
        for (i, &size) in sizes.iter().enumerate() {
            let y = 700.0 - i as f32 * 20.0;
            let word = Word::new(
                format!("w{}", i),
                BBox::new(10.0, y, 50.0, y + size).unwrap(),
                FontDescriptor::new("Helvetica", size, FontStyle::Normal),
            )
            .unwrap();
            page.add_block(Block::new(vec![word]));
        }
        page
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.get_text(PAGE_SEPARATOR), "");
    }

    #[test]
    fn test_get_text_joins_pages() {
        let mut doc = Document::new();
        doc.add_page(page_with_sizes(0, &[12.0]));
        doc.add_page(page_with_sizes(1, &[12.0]));
        assert_eq!(doc.plain_text(), "w0\n\n---\n\nw0");
        assert_eq!(doc.total_word_count(), 2);
        assert!(doc.get_page(1).is_some());
        assert!(doc.get_page(7).is_none());
    }

    #[test]
    fn test_typography_hierarchy() {
        let mut doc = Document::new();
        doc.add_page(page_with_sizes(0, &[24.0, 16.0, 12.0, 9.0, 11.0, 12.0]));

        let levels = doc.typography_hierarchy();
        let roles: Vec<_> = levels.iter().map(|l| l.role).collect();
        assert_eq!(
            roles,
            vec![
                TypographyRole::MainTitle,
                TypographyRole::SectionHeader,
                TypographyRole::SubsectionHeader,
                TypographyRole::BodyText,
                TypographyRole::CaptionOrFootnote,
            ]
        );
        assert_eq!(levels[0].size, 24.0);
        assert_eq!(levels[2].fonts.len(), 1);
    }

    #[test]
    fn test_metadata_frontmatter() {
        let metadata = Metadata {
            title: Some("Quarterly \"Results\"".to_string()),
            author: Some("Jane Roe".to_string()),
            keywords: Some("ignored".to_string()),
            page_count: 10,
            ..Default::default()
        };

        let yaml = metadata.to_yaml_frontmatter();
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("title: \"Quarterly \\\"Results\\\"\""));
        assert!(yaml.contains("author: \"Jane Roe\""));
        assert!(yaml.contains("page_count: 10"));
        assert!(!yaml.contains("keywords"));
        assert!(yaml.ends_with("---\n\n"));
    }

    #[test]
    fn test_frontmatter_dates() {
        use chrono::TimeZone;

        let metadata = Metadata {
            created: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
            modified: Some(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()),
            page_count: 3,
            ..Default::default()
        };

        assert_eq!(
            metadata.to_yaml_frontmatter(),
            "---\n\
             creation_date: \"2024-01-15T10:30:00+00:00\"\n\
             modification_date: \"2024-02-01T08:00:00+00:00\"\n\
             page_count: 3\n\
             ---\n\n"
        );
    }

    #[test]
    fn test_deserialize_rejects_invalid_content() {
        let mut doc = Document::new();
        doc.add_page(page_with_sizes(0, &[12.0]));
        let valid = serde_json::to_value(&doc).unwrap();
        assert!(serde_json::from_value::<Document>(valid.clone()).is_ok());

        let mut blank = valid.clone();
        blank["pages"][0]["blocks"][0]["words"][0]["text"] = "   ".into();
        assert!(serde_json::from_value::<Document>(blank).is_err());

        let mut word_conf = valid.clone();
        word_conf["pages"][0]["blocks"][0]["words"][0]["confidence"] = serde_json::json!(7.5);
        assert!(serde_json::from_value::<Document>(word_conf).is_err());

        let mut block_conf = valid;
        block_conf["pages"][0]["blocks"][0]["confidence"] = serde_json::json!(-3.0);
        assert!(serde_json::from_value::<Document>(block_conf).is_err());
    }
}
