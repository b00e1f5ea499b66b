//! Pre-processing quality gate.
//!
//! The gate samples a document before any page is processed and produces a
//! score in [0, 1]. Documents scoring below the floor are rejected outright.

use crate::error::{Error, Result};
use crate::model::QualityReport;

use super::input::{PageSource, SourceInfo};

/// Documents scoring below this are rejected.
pub const MIN_QUALITY_SCORE: f32 = 0.1;

/// Decides whether a document is worth processing.
pub trait QualityGate: Send + Sync {
    /// Assess a document. Returns the report on acceptance and
    /// [`Error::QualityRejection`] otherwise.
    fn assess(&self, source: &dyn PageSource) -> Result<QualityReport>;
}

/// Heuristic gate scoring structure of the first few pages.
#[derive(Debug, Clone)]
pub struct HeuristicQualityGate {
    /// Pages sampled from the start of the document
    pub sample_pages: usize,
    /// Page count above which the document counts as very large
    pub large_document_pages: usize,
    /// Average text blocks per sampled page above which text is fragmented
    pub fragmented_blocks_per_page: f32,
}

impl Default for HeuristicQualityGate {
    fn default() -> Self {
        Self {
            sample_pages: 3,
            large_document_pages: 1000,
            fragmented_blocks_per_page: 500.0,
        }
    }
}

impl QualityGate for HeuristicQualityGate {
    fn assess(&self, source: &dyn PageSource) -> Result<QualityReport> {
        let info = source.info();
        let page_count = source.page_count();
        let mut score = 1.0_f32;
        let mut issues = Vec::new();

        if info.needs_password {
            issues.push("Password protected".to_string());
            score *= 0.0;
        }

        if page_count > self.large_document_pages {
            issues.push(format!("Very large document ({} pages)", page_count));
            score *= 0.8;
        }

        let sampled = self.sample_pages.min(page_count);
        let mut total_blocks = 0;
        let mut total_drawings = 0;
        let mut empty_pages = 0;
        for index in 0..sampled {
            match source.page(index) {
                Ok(page) => {
                    let blocks = page.text_block_count();
                    total_blocks += blocks;
                    if blocks == 0 {
                        empty_pages += 1;
                    }
                    total_drawings += page.drawings.len();
                }
                Err(e) => {
                    issues.push(format!("Error sampling page {}: {}", index, e));
                    score *= 0.9;
                }
            }
        }

        if empty_pages == sampled {
            issues.push("No text content found".to_string());
            score *= 0.2;
        }

        let avg_blocks_per_page = if sampled > 0 {
            total_blocks as f32 / sampled as f32
        } else {
            0.0
        };
        if avg_blocks_per_page > self.fragmented_blocks_per_page {
            issues.push("Extremely fragmented text (possible OCR)".to_string());
            score *= 0.7;
        }

        if office_producer(&info) {
            issues.push("MS Office generated (may have artifacts)".to_string());
            score *= 0.8;
        }

        if let Some(format) = info.metadata.format.as_deref() {
            if !format.to_lowercase().contains("pdf") {
                issues.push(format!("Non-PDF source format ({})", format));
                score *= 0.5;
            }
        }

        log::info!(
            "Quality assessment: score={:.2}, issues={}",
            score,
            issues.len()
        );

        if score < MIN_QUALITY_SCORE {
            return Err(Error::QualityRejection {
                document: info.source.unwrap_or_else(|| "<input>".to_string()),
                score,
                issues,
            });
        }

        Ok(QualityReport {
            score,
            issues,
            avg_blocks_per_page,
            total_drawings,
            empty_pages,
        })
    }
}

fn office_producer(info: &SourceInfo) -> bool {
    let producer = info
        .metadata
        .producer
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    ["microsoft", "excel", "word", "powerpoint"]
        .iter()
        .any(|term| producer.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::input::{DocumentInput, PageInput, RawMetadata, RawSpan};

    fn page_with_text(number: u32) -> PageInput {
        PageInput {
            number,
            bbox: [0.0, 0.0, 612.0, 792.0],
            spans: vec![RawSpan {
                text: "Text".to_string(),
                bbox: [10.0, 10.0, 40.0, 22.0],
                font: "Helvetica".to_string(),
                size: 12.0,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_document_scores_one() {
        let input = DocumentInput {
            pages: vec![page_with_text(0), page_with_text(1)],
            ..Default::default()
        };
        let report = HeuristicQualityGate::default().assess(&input).unwrap();
        assert_eq!(report.score, 1.0);
        assert!(report.issues.is_empty());
        assert_eq!(report.avg_blocks_per_page, 1.0);
    }

    #[test]
    fn test_password_rejected() {
        let input = DocumentInput {
            source: Some("locked.pdf".to_string()),
            needs_password: true,
            pages: vec![page_with_text(0)],
            ..Default::default()
        };
        match HeuristicQualityGate::default().assess(&input) {
            Err(Error::QualityRejection {
                document, score, ..
            }) => {
                assert_eq!(document, "locked.pdf");
                assert_eq!(score, 0.0);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_penalties_multiply() {
        let input = DocumentInput {
            metadata: RawMetadata {
                producer: Some("Microsoft Word 2016".to_string()),
                ..Default::default()
            },
            pages: vec![PageInput::default()],
            ..Default::default()
        };
        let report = HeuristicQualityGate::default().assess(&input).unwrap();
        assert!((report.score - 0.16).abs() < 1e-6);
        assert_eq!(report.empty_pages, 1);
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_converted_format_penalized() {
        let input = DocumentInput {
            metadata: RawMetadata {
                format: Some("XPS".to_string()),
                ..Default::default()
            },
            pages: vec![page_with_text(0)],
            ..Default::default()
        };
        let report = HeuristicQualityGate::default().assess(&input).unwrap();
        assert_eq!(report.score, 0.5);

        let input = DocumentInput {
            metadata: RawMetadata {
                format: Some("PDF 1.7".to_string()),
                ..Default::default()
            },
            pages: vec![page_with_text(0)],
            ..Default::default()
        };
        assert_eq!(HeuristicQualityGate::default().assess(&input).unwrap().score, 1.0);
    }
}
