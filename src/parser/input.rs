//! Upstream input contract: raw spans, drawings and images per page.
//!
//! A decoding backend serializes each page as positioned text spans plus
//! vector primitives. The pipeline only reads pages through [`PageSource`],
//! so any backend can feed it; [`DocumentInput`] is the JSON form.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DrawingKind, Metadata};

/// Backend flag bit marking a bold span.
pub const FLAG_BOLD: u32 = 1 << 4;
/// Backend flag bit marking an italic span.
pub const FLAG_ITALIC: u32 = 1 << 1;

/// A whole document as delivered by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Source identifier (file name or URI)
    #[serde(default)]
    pub source: Option<String>,

    /// The backend could not open the document without a password
    #[serde(default)]
    pub needs_password: bool,

    #[serde(default)]
    pub metadata: RawMetadata,

    #[serde(default)]
    pub pages: Vec<PageInput>,
}

/// Document information strings as reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// `D:YYYYMMDDHHmmSS` or RFC 3339
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    /// Source format, e.g. "PDF 1.7"
    pub format: Option<String>,
}

/// One page of raw content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInput {
    pub number: u32,

    /// Page box as `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],

    #[serde(default)]
    pub spans: Vec<RawSpan>,

    #[serde(default)]
    pub drawings: Vec<RawDrawing>,

    #[serde(default)]
    pub images: Vec<RawImage>,
}

/// A positioned run of text in a single font.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSpan {
    pub text: String,
    pub bbox: [f32; 4],
    pub font: String,
    pub size: f32,
    /// Backend style flags (see [`FLAG_BOLD`], [`FLAG_ITALIC`])
    #[serde(default)]
    pub flags: u32,
    /// Packed RGB fill color
    #[serde(default)]
    pub color: Option<u32>,
    /// Backend block id; spans without one form their own block
    #[serde(default)]
    pub block: Option<u32>,
}

/// A line or rectangle primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDrawing {
    pub kind: DrawingKind,
    pub bbox: [f32; 4],
    #[serde(default)]
    pub stroke: Option<u32>,
    #[serde(default)]
    pub fill: Option<u32>,
    #[serde(default)]
    pub width: f32,
}

/// An image placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImage {
    pub bbox: [f32; 4],
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub colorspace: Option<String>,
}

impl PageInput {
    /// Number of backend text blocks; spans without a block id count alone.
    pub fn text_block_count(&self) -> usize {
        let mut count = 0;
        let mut previous: Option<u32> = None;
        for span in &self.spans {
            let continues = span.block.is_some() && span.block == previous;
            if !continues {
                count += 1;
            }
            previous = span.block;
        }
        count
    }
}

/// Document-level facts a source exposes before any page is read.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub source: Option<String>,
    pub needs_password: bool,
    pub metadata: Metadata,
}

/// Read access to a document's pages.
///
/// Implemented by [`DocumentInput`]; other backends can implement it to
/// stream pages on demand.
pub trait PageSource {
    /// Document-level information.
    fn info(&self) -> SourceInfo;

    /// Number of pages the source claims to have.
    fn page_count(&self) -> usize;

    /// Load one page by index.
    fn page(&self, index: usize) -> Result<PageInput>;
}

impl DocumentInput {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a JSON document from a file. The path becomes the source name
    /// unless the file names one itself.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut input = Self::from_reader(BufReader::new(file))?;
        if input.source.is_none() {
            input.source = Some(path.display().to_string());
        }
        Ok(input)
    }
}

impl PageSource for DocumentInput {
    fn info(&self) -> SourceInfo {
        let raw = &self.metadata;
        SourceInfo {
            source: self.source.clone(),
            needs_password: self.needs_password,
            metadata: Metadata {
                title: non_empty(&raw.title),
                author: non_empty(&raw.author),
                subject: non_empty(&raw.subject),
                keywords: non_empty(&raw.keywords),
                creator: non_empty(&raw.creator),
                producer: non_empty(&raw.producer),
                created: raw.creation_date.as_deref().and_then(parse_date),
                modified: raw.modification_date.as_deref().and_then(parse_date),
                format: non_empty(&raw.format),
                page_count: self.pages.len() as u32,
            },
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PageInput> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| Error::PageProcessing {
                page: index as u32,
                reason: format!("page index out of range ({} pages)", self.pages.len()),
            })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a metadata date in PDF (`D:YYYYMMDDHHmmSS`) or RFC 3339 form.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.starts_with("D:") {
        return parse_pdf_date(s);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse PDF date format (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:")?;

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const SAMPLE: &str = r#"{
        "source": "report.pdf",
        "metadata": {"title": "Report", "producer": "  ", "creation_date": "D:20240115103045"},
        "pages": [{
            "number": 0,
            "bbox": [0, 0, 612, 792],
            "spans": [
                {"text": "Hello", "bbox": [0, 700, 20, 712], "font": "Helvetica", "size": 12, "block": 0},
                {"text": "world", "bbox": [25, 700, 45, 712], "font": "Helvetica", "size": 12, "block": 0},
                {"text": "Loose", "bbox": [0, 600, 25, 612], "font": "Helvetica", "size": 12}
            ],
            "drawings": [{"kind": "line", "bbox": [0, 500, 600, 501], "width": 1}]
        }]
    }"#;

    #[test]
    fn test_parse_json_contract() {
        let input = DocumentInput::from_json(SAMPLE).unwrap();
        assert_eq!(input.page_count(), 1);
        let page = input.page(0).unwrap();
        assert_eq!(page.spans.len(), 3);
        assert_eq!(page.drawings[0].kind, DrawingKind::Line);
        assert_eq!(page.text_block_count(), 2);
        assert!(matches!(
            input.page(3),
            Err(Error::PageProcessing { page: 3, .. })
        ));
    }

    #[test]
    fn test_info_normalizes_metadata() {
        let input = DocumentInput::from_json(SAMPLE).unwrap();
        let info = input.info();
        assert_eq!(info.source.as_deref(), Some("report.pdf"));
        assert_eq!(info.metadata.title.as_deref(), Some("Report"));
        assert_eq!(info.metadata.producer, None);
        assert_eq!(info.metadata.created.unwrap().year(), 2024);
        assert_eq!(info.metadata.page_count, 1);
    }

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);

        let date = parse_date("D:2024").unwrap();
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);

        assert!(parse_date("2023-06-01T12:00:00Z").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_from_path_sets_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"pages": []}"#).unwrap();
        let input = DocumentInput::from_path(&path).unwrap();
        assert!(input.source.unwrap().ends_with("doc.json"));
    }
}
