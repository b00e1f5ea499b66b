//! Fragment assembly: raw spans become words, words become blocks.
//!
//! Backends often emit one span per glyph run, so a single visual line can
//! arrive as many fragments. Assembly screens out unusable spans, splits
//! multi-word spans, groups spans by backend block and then merges adjacent
//! blocks that sit on the same line in the same font.

use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::model::{
    color_to_hex, Block, Drawing, FontDescriptor, FontStyle, ImageInfo, Page, Word,
};

use super::input::{PageInput, RawDrawing, RawSpan, FLAG_BOLD, FLAG_ITALIC};
use super::ParseOptions;

/// Confidence assigned to words produced by splitting a multi-word span.
const SPLIT_WORD_CONFIDENCE: f32 = 0.9;

/// Maximum font size difference (points) for two blocks to merge.
const MERGE_FONT_SIZE_DELTA: f32 = 1.0;

/// Builds a page of blocks from raw page content.
#[derive(Debug, Clone)]
pub struct FragmentAssembler {
    merge_tolerance: f32,
    min_font_size: f32,
    max_font_size: f32,
    skip_invisible: bool,
}

impl FragmentAssembler {
    /// Create an assembler from parse options.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            merge_tolerance: options.merge_tolerance,
            min_font_size: options.min_font_size,
            max_font_size: options.max_font_size,
            skip_invisible: options.skip_invisible_text,
        }
    }

    /// Assemble one page.
    ///
    /// Fails only when the page box itself is unusable; bad spans and
    /// drawings are dropped and counted in the page metadata.
    pub fn assemble(&self, input: &PageInput) -> Result<Page> {
        let page_box = BBox::from_array(input.bbox).map_err(|e| Error::PageProcessing {
            page: input.number,
            reason: e.to_string(),
        })?;
        let mut page = Page::new(input.number).with_bbox(page_box);

        for raw in &input.drawings {
            match convert_drawing(raw) {
                Ok(drawing) => page.add_drawing(drawing),
                Err(e) => {
                    log::debug!("page {}: dropping drawing: {}", input.number, e);
                    page.metadata.dropped_drawings += 1;
                }
            }
        }

        for raw in &input.images {
            match BBox::from_array(raw.bbox) {
                Ok(bbox) => page.metadata.images.push(ImageInfo {
                    bbox,
                    width: raw.width,
                    height: raw.height,
                    colorspace: raw.colorspace.clone(),
                }),
                Err(e) => log::debug!("page {}: dropping image: {}", input.number, e),
            }
        }

        let mut initial: Vec<Block> = Vec::new();
        let mut current_id: Option<u32> = None;
        for span in &input.spans {
            let words = match self.span_to_words(span) {
                Ok(words) => words,
                Err(e) => {
                    log::debug!("page {}: dropping span {:?}: {}", input.number, span.text, e);
                    page.metadata.dropped_spans += 1;
                    continue;
                }
            };

            let continues = span.block.is_some() && span.block == current_id;
            match initial.last_mut() {
                Some(block) if continues => block.words.extend(words),
                _ => {
                    let mut block = Block::new(words);
                    block.metadata.source_blocks.extend(span.block);
                    initial.push(block);
                }
            }
            current_id = span.block;
        }

        let mut blocks = self.merge_blocks(initial);
        for block in &mut blocks {
            if let Some(bbox) = block.bbox() {
                block.metadata.drawing_refs = page
                    .metadata
                    .drawings
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.bbox.overlaps(&bbox, 0.0))
                    .map(|(i, _)| i)
                    .collect();
            }
        }
        page.blocks = blocks;

        log::debug!(
            "page {}: {} blocks, {} drawings, {} spans dropped",
            page.number,
            page.blocks.len(),
            page.metadata.drawings.len(),
            page.metadata.dropped_spans
        );
        Ok(page)
    }

    /// Screen a span and split it into words.
    fn span_to_words(&self, span: &RawSpan) -> Result<Vec<Word>> {
        let bbox = BBox::from_array(span.bbox)?;
        if self.skip_invisible && (bbox.width() == 0.0 || bbox.height() == 0.0) {
            return Err(Error::MalformedInput("invisible span".to_string()));
        }
        if span.size < self.min_font_size || span.size > self.max_font_size {
            return Err(Error::MalformedInput(format!(
                "font size {} outside [{}, {}]",
                span.size, self.min_font_size, self.max_font_size
            )));
        }
        if bbox.x0() >= bbox.x1() || bbox.y0() >= bbox.y1() {
            return Err(Error::MalformedInput("degenerate span box".to_string()));
        }

        let font = span_font(span);
        let text = span.text.trim();
        let parts: Vec<&str> = text.split_whitespace().collect();

        match parts.len() {
            0 => Err(Error::MalformedInput("empty span text".to_string())),
            1 => Ok(vec![Word::new(parts[0], bbox, font)?]),
            _ => {
                let total = text.chars().count();
                let char_width = bbox.width() / total as f32;
                let mut words = Vec::with_capacity(parts.len());
                for (start, end, part) in word_runs(text) {
                    let x0 = bbox.x0() + char_width * start as f32;
                    // The last run ends the trimmed text, so it ends the span too
                    let x1 = if end == total {
                        bbox.x1()
                    } else {
                        (bbox.x0() + char_width * end as f32).min(bbox.x1())
                    };
                    let word_box = BBox::new(x0.min(x1), bbox.y0(), x1, bbox.y1())?;
                    words.push(
                        Word::new(part, word_box, font.clone())?
                            .with_confidence(SPLIT_WORD_CONFIDENCE)?,
                    );
                }
                Ok(words)
            }
        }
    }

    /// Left fold over blocks, merging each into the running block when they
    /// share a line and a font.
    fn merge_blocks(&self, blocks: Vec<Block>) -> Vec<Block> {
        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.pop() {
                Some(current) if self.should_merge(&current, &block) => {
                    merged.push(current.merge_with(block));
                }
                Some(current) => {
                    merged.push(current);
                    merged.push(block);
                }
                None => merged.push(block),
            }
        }
        merged
    }

    fn should_merge(&self, current: &Block, next: &Block) -> bool {
        let (Some(a), Some(b)) = (current.bbox(), next.bbox()) else {
            return false;
        };
        if !a.same_line(&b, self.merge_tolerance) {
            return false;
        }
        if a.horizontal_distance(&b) > 3.0 * self.merge_tolerance {
            return false;
        }
        match (current.dominant_font(), next.dominant_font()) {
            (Some(fa), Some(fb)) => {
                (fa.size - fb.size).abs() <= MERGE_FONT_SIZE_DELTA && fa.style == fb.style
            }
            _ => false,
        }
    }
}

/// Font descriptor for a span: flags first, then the font name.
/// Non-whitespace runs of `text` as `(start_char, end_char, run)`.
///
/// Offsets count characters, so a run of several spaces between two words
/// keeps its full width.
fn word_runs(text: &str) -> Vec<(usize, usize, &str)> {
    let mut runs = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut chars = 0;
    for (byte, c) in text.char_indices() {
        match (c.is_whitespace(), open) {
            (false, None) => open = Some((byte, chars)),
            (true, Some((start_byte, start_char))) => {
                runs.push((start_char, chars, &text[start_byte..byte]));
                open = None;
            }
            _ => {}
        }
        chars += 1;
    }
    if let Some((start_byte, start_char)) = open {
        runs.push((start_char, chars, &text[start_byte..]));
    }
    runs
}

fn span_font(span: &RawSpan) -> FontDescriptor {
    let name = span.font.to_lowercase();
    let bold = span.flags & FLAG_BOLD != 0
        || name.contains("bold")
        || name.contains("black")
        || name.contains("heavy");
    let italic =
        span.flags & FLAG_ITALIC != 0 || name.contains("italic") || name.contains("oblique");

    let font = FontDescriptor::new(span.font.clone(), span.size, FontStyle::from_flags(bold, italic));
    match span.color {
        Some(color) => font.with_color(color_to_hex(color)),
        None => font,
    }
}

fn convert_drawing(raw: &RawDrawing) -> Result<Drawing> {
    Ok(Drawing {
        kind: raw.kind,
        bbox: BBox::from_array(raw.bbox)?,
        stroke: raw.stroke.map(color_to_hex),
        fill: raw.fill.map(color_to_hex),
        width: raw.width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DrawingKind;

    fn span(text: &str, bbox: [f32; 4], size: f32, block: Option<u32>) -> RawSpan {
        RawSpan {
            text: text.to_string(),
            bbox,
            font: "Helvetica".to_string(),
            size,
            flags: 0,
            color: None,
            block,
        }
    }

    fn page(spans: Vec<RawSpan>) -> PageInput {
        PageInput {
            number: 0,
            bbox: [0.0, 0.0, 612.0, 792.0],
            spans,
            drawings: Vec::new(),
            images: Vec::new(),
        }
    }

    fn assembler() -> FragmentAssembler {
        FragmentAssembler::new(&ParseOptions::default())
    }

    #[test]
    fn test_merges_fragments_on_one_line() {
        let input = page(vec![
            span("Hello", [0.0, 100.0, 20.0, 112.0], 12.0, Some(0)),
            span("world", [25.0, 100.0, 45.0, 112.0], 12.0, Some(1)),
        ]);
        let page = assembler().assemble(&input).unwrap();
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].text(), "Hello world");
        assert_eq!(page.blocks[0].metadata.source_blocks, vec![0, 1]);
    }

    #[test]
    fn test_keeps_distant_or_different_fonts_apart() {
        let input = page(vec![
            span("Left", [0.0, 100.0, 20.0, 112.0], 12.0, None),
            span("Far", [200.0, 100.0, 220.0, 112.0], 12.0, None),
            span("Big", [225.0, 100.0, 245.0, 112.0], 16.0, None),
        ]);
        let page = assembler().assemble(&input).unwrap();
        assert_eq!(page.blocks.len(), 3);
    }

    #[test]
    fn test_same_block_id_groups_spans() {
        let input = page(vec![
            span("Line one", [0.0, 120.0, 80.0, 132.0], 12.0, Some(4)),
            span("Line two", [0.0, 100.0, 80.0, 112.0], 12.0, Some(4)),
        ]);
        let page = assembler().assemble(&input).unwrap();
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].text(), "Line one Line two");
    }

    #[test]
    fn test_split_allocates_proportional_widths() {
        let input = page(vec![span("ab cd", [0.0, 0.0, 50.0, 10.0], 12.0, None)]);
        let page = assembler().assemble(&input).unwrap();
        let words = &page.blocks[0].words;
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].bbox().x1(), 20.0);
        assert_eq!(words[1].bbox().x0(), 30.0);
        assert_eq!(words[1].bbox().x1(), 50.0);
        assert_eq!(words[0].confidence(), 0.9);
    }

    #[test]
    fn test_split_keeps_wide_gaps() {
        let input = page(vec![span("Revenue  2024", [0.0, 100.0, 130.0, 112.0], 12.0, None)]);
        let page = assembler().assemble(&input).unwrap();
        let words = &page.blocks[0].words;
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].bbox().x0(), 0.0);
        assert_eq!(words[0].bbox().x1(), 70.0);
        assert_eq!(words[1].text(), "2024");
        assert_eq!(words[1].bbox().x0(), 90.0);
        assert_eq!(words[1].bbox().x1(), 130.0);
    }

    #[test]
    fn test_word_runs_count_characters() {
        assert_eq!(
            word_runs("né  à b"),
            vec![(0, 2, "né"), (4, 5, "à"), (6, 7, "b")]
        );
    }

    #[test]
    fn test_screening_counts_dropped_spans() {
        let input = page(vec![
            span("tiny", [0.0, 0.0, 10.0, 2.0], 2.0, None),
            span("huge", [0.0, 0.0, 10.0, 80.0], 80.0, None),
            span("flat", [0.0, 5.0, 10.0, 5.0], 12.0, None),
            span("   ", [0.0, 0.0, 10.0, 12.0], 12.0, None),
            span("bad", [10.0, 0.0, 0.0, 12.0], 12.0, None),
            span("ok", [0.0, 0.0, 10.0, 12.0], 12.0, None),
        ]);
        let page = assembler().assemble(&input).unwrap();
        assert_eq!(page.metadata.dropped_spans, 5);
        assert_eq!(page.blocks.len(), 1);
    }

    #[test]
    fn test_visible_text_screening_off() {
        let flat = span("flat", [0.0, 5.0, 10.0, 5.0], 12.0, None);
        let err = assembler().span_to_words(&flat).unwrap_err();
        assert!(err.to_string().contains("invisible span"));

        // Zero-size boxes are still degenerate without the visibility check
        let lenient = FragmentAssembler::new(&ParseOptions::default().with_skip_invisible(false));
        let err = lenient.span_to_words(&flat).unwrap_err();
        assert!(err.to_string().contains("degenerate span box"));

        let input = page(vec![
            flat,
            span("kept", [0.0, 20.0, 40.0, 32.0], 12.0, None),
        ]);
        let page = lenient.assemble(&input).unwrap();
        assert_eq!(page.metadata.dropped_spans, 1);
        assert_eq!(page.blocks[0].text(), "kept");
    }

    #[test]
    fn test_style_from_flags_and_name() {
        let mut bold = span("B", [0.0, 0.0, 10.0, 12.0], 12.0, None);
        bold.flags = FLAG_BOLD;
        assert_eq!(span_font(&bold).style, FontStyle::Bold);

        let mut named = span("I", [0.0, 0.0, 10.0, 12.0], 12.0, None);
        named.font = "Times-BoldItalic".to_string();
        named.color = Some(0x336699);
        let font = span_font(&named);
        assert_eq!(font.style, FontStyle::BoldItalic);
        assert_eq!(font.color.as_deref(), Some("#336699"));
    }

    #[test]
    fn test_drawing_refs_and_invalid_page() {
        let mut input = page(vec![span("Cell", [10.0, 10.0, 30.0, 22.0], 12.0, None)]);
        input.drawings = vec![
            RawDrawing {
                kind: DrawingKind::Rectangle,
                bbox: [0.0, 0.0, 50.0, 30.0],
                stroke: None,
                fill: Some(0xeeeeee),
                width: 1.0,
            },
            RawDrawing {
                kind: DrawingKind::Line,
                bbox: [5.0, 0.0, 1.0, 1.0],
                stroke: None,
                fill: None,
                width: 1.0,
            },
        ];
        let page = assembler().assemble(&input).unwrap();
        assert_eq!(page.metadata.drawings.len(), 1);
        assert_eq!(page.metadata.dropped_drawings, 1);
        assert_eq!(page.blocks[0].metadata.drawing_refs, vec![0]);

        input.bbox = [0.0, 0.0, -1.0, 10.0];
        assert!(matches!(
            assembler().assemble(&input),
            Err(Error::PageProcessing { page: 0, .. })
        ));
    }
}
