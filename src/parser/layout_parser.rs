//! End-to-end page pipeline: quality gate, assembly, classification,
//! reading order and table reconstruction.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{Document, Page};

use super::assembler::FragmentAssembler;
use super::classifier::{promote_title, BlockClassifier};
use super::input::{PageInput, PageSource};
use super::layout::LayoutAnalyzer;
use super::quality::{HeuristicQualityGate, QualityGate};
use super::table_detector::{TableDetector, TablePooling};
use super::ParseOptions;

/// Turns a [`PageSource`] into a structured [`Document`].
///
/// Pages are independent, so they are processed in parallel when
/// [`ParseOptions::parallel`] is set. A page that fails is logged, noted
/// in the document diagnostics and left out; the rest of the document
/// is still returned.
///
/// # Example
///
/// ```no_run
/// use layoutmd::parser::{DocumentInput, LayoutParser, ParseOptions};
///
/// let input = DocumentInput::from_path("report.json")?;
/// let doc = LayoutParser::new(ParseOptions::default()).parse(&input)?;
/// println!("{} pages", doc.page_count());
/// # Ok::<(), layoutmd::Error>(())
/// ```
#[derive(Clone)]
pub struct LayoutParser {
    options: ParseOptions,
    gate: Arc<dyn QualityGate>,
    assembler: FragmentAssembler,
    classifier: BlockClassifier,
    analyzer: LayoutAnalyzer,
    detector: TableDetector,
}

impl LayoutParser {
    /// Create a parser with the heuristic quality gate and confidence pooling.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            assembler: FragmentAssembler::new(&options),
            classifier: BlockClassifier::with_config(options.classifier.clone()),
            analyzer: LayoutAnalyzer::new(),
            detector: TableDetector::with_config(options.tables.clone()),
            gate: Arc::new(HeuristicQualityGate::default()),
            options,
        }
    }

    /// Replace the quality gate.
    pub fn with_quality_gate(mut self, gate: Arc<dyn QualityGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Replace the table pooling policy.
    pub fn with_pooling(mut self, pooling: Arc<dyn TablePooling>) -> Self {
        self.detector = self.detector.with_pooling(pooling);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse every page of a source.
    pub fn parse(&self, source: &dyn PageSource) -> Result<Document> {
        let info = source.info();
        let name = info
            .source
            .clone()
            .unwrap_or_else(|| "<input>".to_string());

        let mut doc = Document::new();
        doc.source = info.source.clone();
        doc.metadata = info.metadata;

        if self.options.check_quality {
            let report = self.gate.assess(source)?;
            if !report.issues.is_empty() {
                log::warn!("{}: {}", name, report.issues.join("; "));
            }
            doc.diagnostics.quality = Some(report);
        }

        let page_count = source.page_count();
        if page_count == 0 {
            return Err(Error::LoadFailure {
                document: name,
                reason: "document has no pages".to_string(),
            });
        }

        // Loading stays sequential; sources are not required to be Sync.
        let mut inputs = Vec::with_capacity(page_count);
        for index in 0..page_count {
            match source.page(index) {
                Ok(input) => inputs.push(input),
                Err(e) => self.record_failure(&mut doc, e),
            }
        }

        let results: Vec<Result<Page>> = if self.options.parallel {
            inputs
                .par_iter()
                .map(|input| self.process_page(input))
                .collect()
        } else {
            inputs.iter().map(|input| self.process_page(input)).collect()
        };

        for result in results {
            match result {
                Ok(page) => doc.add_page(page),
                Err(e) => self.record_failure(&mut doc, e),
            }
        }
        // Sources may hand pages out of order; title promotion reads page order.
        doc.pages.sort_by_key(|page| page.number);

        if doc.pages.is_empty() {
            return Err(Error::LoadFailure {
                document: name,
                reason: format!("none of {} pages could be processed", page_count),
            });
        }

        if self.options.classifier.promote_title {
            promote_title(&mut doc);
        }

        log::info!(
            "{}: {} of {} pages, {} blocks, {} tables",
            name,
            doc.page_count(),
            page_count,
            doc.total_block_count(),
            doc.pages.iter().map(|p| p.tables.len()).sum::<usize>()
        );

        Ok(doc)
    }

    /// Run one page through assembly, classification, ordering and table
    /// reconstruction.
    pub fn process_page(&self, input: &PageInput) -> Result<Page> {
        let mut page = self.assembler.assemble(input)?;
        self.classifier.classify_page(&mut page);
        self.analyzer.sort_reading_order(&mut page);
        if self.options.detect_tables {
            page.tables = self.detector.detect(&page);
        }
        log::debug!(
            "page {}: {} blocks, {} tables, {} spans dropped",
            page.number,
            page.block_count(),
            page.tables.len(),
            page.metadata.dropped_spans
        );
        Ok(page)
    }

    fn record_failure(&self, doc: &mut Document, error: Error) {
        log::warn!("Skipping page: {}", error);
        doc.diagnostics.warnings.push(error.to_string());
    }
}

impl Default for LayoutParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl std::fmt::Debug for LayoutParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutParser")
            .field("options", &self.options)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::parser::input::{DocumentInput, RawSpan};

    fn span(text: &str, bbox: [f32; 4], font: &str, size: f32, block: u32) -> RawSpan {
        RawSpan {
            text: text.to_string(),
            bbox,
            font: font.to_string(),
            size,
            block: Some(block),
            ..Default::default()
        }
    }

    fn page(number: u32, spans: Vec<RawSpan>) -> PageInput {
        PageInput {
            number,
            bbox: [0.0, 0.0, 612.0, 792.0],
            spans,
            ..Default::default()
        }
    }

    #[test]
    fn test_title_and_body() {
        let input = DocumentInput {
            pages: vec![page(
                0,
                vec![
                    span("Body text", [72.0, 600.0, 140.0, 612.0], "Times-Roman", 12.0, 1),
                    span("Report Title", [72.0, 700.0, 250.0, 720.0], "Helvetica-Bold", 20.0, 0),
                ],
            )],
            ..Default::default()
        };
        let doc = LayoutParser::default().parse(&input).unwrap();
        let roles: Vec<Role> = doc.pages[0].blocks.iter().map(|b| b.role).collect();
        assert_eq!(roles, vec![Role::Title, Role::Paragraph]);
        assert_eq!(doc.pages[0].blocks[0].text(), "Report Title");
        assert!(doc.diagnostics.quality.is_some());
    }

    #[test]
    fn test_bad_page_is_skipped() {
        let mut broken = page(1, vec![span("x", [1.0, 1.0, 5.0, 5.0], "Times", 12.0, 0)]);
        broken.bbox = [10.0, 10.0, 0.0, 0.0];
        let input = DocumentInput {
            pages: vec![
                page(0, vec![span("First", [72.0, 700.0, 120.0, 712.0], "Times", 12.0, 0)]),
                broken,
                page(2, vec![span("Third", [72.0, 700.0, 120.0, 712.0], "Times", 12.0, 0)]),
            ],
            ..Default::default()
        };
        let doc = LayoutParser::new(ParseOptions::default().sequential())
            .parse(&input)
            .unwrap();
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![0, 2]);
        assert_eq!(doc.diagnostics.warnings.len(), 1);
        assert!(doc.diagnostics.warnings[0].contains("Page 1"));
    }

    #[test]
    fn test_pages_sorted_by_number() {
        let line = |text: &str| span(text, [72.0, 700.0, 200.0, 712.0], "Times", 12.0, 0);
        let input = DocumentInput {
            pages: vec![
                page(2, vec![line("Closing remarks")]),
                page(
                    0,
                    vec![span("Annual Report", [72.0, 700.0, 250.0, 720.0], "Helvetica-Bold", 20.0, 0)],
                ),
                page(1, vec![line("Middle section")]),
            ],
            ..Default::default()
        };
        let doc = LayoutParser::default().parse(&input).unwrap();
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(doc.pages[0].blocks[0].role, Role::Title);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pages = (0..8)
            .map(|n| {
                page(
                    n,
                    vec![span(
                        &format!("Page {} text", n),
                        [72.0, 700.0, 200.0, 712.0],
                        "Times",
                        12.0,
                        0,
                    )],
                )
            })
            .collect();
        let input = DocumentInput {
            pages,
            ..Default::default()
        };
        let parallel = LayoutParser::default().parse(&input).unwrap();
        let sequential = LayoutParser::new(ParseOptions::default().sequential())
            .parse(&input)
            .unwrap();
        assert_eq!(parallel.pages, sequential.pages);
    }

    #[test]
    fn test_no_pages_is_load_failure() {
        let input = DocumentInput {
            source: Some("empty.pdf".to_string()),
            ..Default::default()
        };
        let parser = LayoutParser::new(ParseOptions::default().with_quality_check(false));
        match parser.parse(&input) {
            Err(Error::LoadFailure { document, .. }) => assert_eq!(document, "empty.pdf"),
            other => panic!("expected load failure, got {:?}", other),
        }
    }
}
