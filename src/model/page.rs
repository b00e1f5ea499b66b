//! Page-level types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Block, FontDescriptor, Role, TableCandidate, Word};
use crate::geometry::BBox;

/// Kind of vector primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    Line,
    Rectangle,
}

/// A vector-graphics primitive kept for table reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub kind: DrawingKind,
    pub bbox: BBox,
    /// Stroke color as `#rrggbb`
    pub stroke: Option<String>,
    /// Fill color as `#rrggbb`
    pub fill: Option<String>,
    /// Stroke width in points
    pub width: f32,
}

/// An image placement on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub bbox: BBox,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    pub colorspace: Option<String>,
}

/// Page-level provenance and screening counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Drawings that passed screening
    pub drawings: Vec<Drawing>,

    /// Image placements
    pub images: Vec<ImageInfo>,

    /// Spans removed during screening
    pub dropped_spans: usize,

    /// Drawings removed because their geometry was invalid
    pub dropped_drawings: usize,
}

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (0-indexed, as delivered by the backend)
    pub number: u32,

    /// Content blocks, in reading order once the pipeline has run
    pub blocks: Vec<Block>,

    /// Page box
    pub bbox: Option<BBox>,

    /// Drawings, images and screening counters
    pub metadata: PageMetadata,

    /// Accepted table candidates, best first
    pub tables: Vec<TableCandidate>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            blocks: Vec::new(),
            bbox: None,
            metadata: PageMetadata::default(),
            tables: Vec::new(),
        }
    }

    /// Set the page box.
    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Add a block to the page.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a drawing to the page.
    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.metadata.drawings.push(drawing);
    }

    /// Get plain text content of the page.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the page has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(|b| b.word_count()).sum()
    }

    /// All words in block order.
    pub fn all_words(&self) -> impl Iterator<Item = &Word> {
        self.blocks.iter().flat_map(|b| b.words.iter())
    }

    /// Distinct fonts in order of first appearance.
    pub fn unique_fonts(&self) -> Vec<&FontDescriptor> {
        let mut seen = HashSet::new();
        self.all_words()
            .map(|w| w.font())
            .filter(|f| seen.insert(f.key()))
            .collect()
    }

    pub fn blocks_by_role(&self, role: Role) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.role == role)
    }

    /// Blocks whose intersection ratio with `region` reaches `threshold`.
    pub fn blocks_in_bbox(&self, region: &BBox, threshold: f32) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| {
                b.bbox()
                    .is_some_and(|bb| bb.intersection_ratio(region) >= threshold)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;

    fn block(text: &str, x0: f32, y0: f32, role: Role) -> Block {
        let word = Word::new(
            text,
            BBox::new(x0, y0, x0 + 40.0, y0 + 12.0).unwrap(),
            FontDescriptor::new("Helvetica", 12.0, FontStyle::Normal),
        )
        .unwrap();
        Block::new(vec![word]).with_role(role)
    }

    #[test]
    fn test_page_queries() {
        let mut page = Page::new(0);
        page.add_block(block("Title", 10.0, 700.0, Role::Heading));
        page.add_block(block("Body", 10.0, 600.0, Role::Paragraph));

        assert_eq!(page.text(), "Title\nBody");
        assert_eq!(page.block_count(), 2);
        assert_eq!(page.word_count(), 2);
        assert_eq!(page.unique_fonts().len(), 1);
        assert_eq!(page.blocks_by_role(Role::Heading).count(), 1);
    }

    #[test]
    fn test_blocks_in_bbox() {
        let mut page = Page::new(0);
        page.add_block(block("Inside", 10.0, 700.0, Role::Text));
        page.add_block(block("Outside", 300.0, 100.0, Role::Text));

        let region = BBox::new(0.0, 650.0, 200.0, 750.0).unwrap();
        let found = page.blocks_in_bbox(&region, 0.5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "Inside");
    }
}
