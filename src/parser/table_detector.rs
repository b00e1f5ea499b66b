//! Table reconstruction from ruling lines, cell rectangles and text alignment.
//!
//! Each strategy is a pure function from a page to candidate tables. The
//! detector runs all three and hands the combined list to a pooling policy,
//! which ranks and filters them. The default policy does not merge
//! overlapping candidates from different strategies.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::geometry::{merge_bboxes, BBox};
use crate::model::{Block, DrawingKind, Page, TableCandidate, TableSource};

/// Confidence of tables built from ruling lines.
pub const GRID_CONFIDENCE: f32 = 0.9;
/// Confidence of tables built from filled cell rectangles.
pub const RECTANGLE_CONFIDENCE: f32 = 0.8;
/// Confidence of tables built from text alignment alone.
pub const ALIGNMENT_CONFIDENCE: f32 = 0.7;

/// Maximum thickness of a ruling line (points).
const MAX_RULE_THICKNESS: f32 = 3.0;

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Tolerance for row and column alignment (points)
    pub alignment_tolerance: f32,
    /// Ruling lines closer than this collapse into one (points)
    pub border_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            alignment_tolerance: 5.0,
            border_tolerance: 2.0,
        }
    }
}

impl TableDetectorConfig {
    pub fn with_min_rows(mut self, rows: usize) -> Self {
        self.min_rows = rows;
        self
    }

    pub fn with_min_columns(mut self, columns: usize) -> Self {
        self.min_columns = columns;
        self
    }

    pub fn with_alignment_tolerance(mut self, tolerance: f32) -> Self {
        self.alignment_tolerance = tolerance;
        self
    }

    pub fn with_border_tolerance(mut self, tolerance: f32) -> Self {
        self.border_tolerance = tolerance;
        self
    }
}

/// Ranks and filters the candidates of all strategies.
pub trait TablePooling: Send + Sync + fmt::Debug {
    fn pool(&self, candidates: Vec<TableCandidate>) -> Vec<TableCandidate>;
}

/// Stable sort by confidence, highest first, dropping weak candidates.
#[derive(Debug, Clone)]
pub struct ConfidencePooling {
    pub min_confidence: f32,
}

impl Default for ConfidencePooling {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
        }
    }
}

impl TablePooling for ConfidencePooling {
    fn pool(&self, mut candidates: Vec<TableCandidate>) -> Vec<TableCandidate> {
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        candidates.retain(|t| t.confidence >= self.min_confidence);
        candidates
    }
}

/// Runs every strategy on a page and pools the results.
#[derive(Debug, Clone)]
pub struct TableDetector {
    config: TableDetectorConfig,
    pooling: Arc<dyn TablePooling>,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::with_config(TableDetectorConfig::default())
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self {
            config,
            pooling: Arc::new(ConfidencePooling::default()),
        }
    }

    /// Replace the pooling policy.
    pub fn with_pooling(mut self, pooling: Arc<dyn TablePooling>) -> Self {
        self.pooling = pooling;
        self
    }

    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Detect tables on a page. An empty result means no table was found.
    pub fn detect(&self, page: &Page) -> Vec<TableCandidate> {
        let mut candidates = grid_line_tables(page, &self.config);
        let grid = candidates.len();
        candidates.extend(rectangle_tables(page, &self.config));
        let rect = candidates.len() - grid;
        candidates.extend(alignment_tables(page, &self.config));
        let aligned = candidates.len() - grid - rect;

        log::debug!(
            "TableDetector: page {}: {} grid, {} rectangle, {} alignment candidates",
            page.number,
            grid,
            rect,
            aligned
        );
        self.pooling.pool(candidates)
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Tables from horizontal and vertical ruling lines.
///
/// Consecutive horizontal lines (top to bottom) bound the rows and
/// consecutive vertical lines (left to right) bound the columns.
pub fn grid_line_tables(page: &Page, config: &TableDetectorConfig) -> Vec<TableCandidate> {
    let lines: Vec<&BBox> = page
        .metadata
        .drawings
        .iter()
        .filter(|d| d.kind == DrawingKind::Line)
        .map(|d| &d.bbox)
        .collect();

    let mut horizontal: Vec<BBox> = lines
        .iter()
        .filter(|b| b.is_horizontal_line(MAX_RULE_THICKNESS))
        .map(|b| **b)
        .collect();
    let mut vertical: Vec<BBox> = lines
        .iter()
        .filter(|b| !b.is_horizontal_line(MAX_RULE_THICKNESS))
        .filter(|b| b.is_vertical_line(MAX_RULE_THICKNESS))
        .map(|b| **b)
        .collect();

    horizontal.sort_by(|a, b| {
        b.center_y()
            .partial_cmp(&a.center_y())
            .unwrap_or(Ordering::Equal)
    });
    vertical.sort_by(|a, b| {
        a.center_x()
            .partial_cmp(&b.center_x())
            .unwrap_or(Ordering::Equal)
    });
    let rows = collapse_rules(horizontal, config.border_tolerance, |b| b.center_y());
    let cols = collapse_rules(vertical, config.border_tolerance, |b| b.center_x());

    if rows.len() < 2 || cols.len() < 2 {
        return Vec::new();
    }

    let mut members = Vec::new();
    let mut table_rows = Vec::with_capacity(rows.len() - 1);
    for pair in rows.windows(2) {
        let (top, bottom) = (pair[0].center_y(), pair[1].center_y());
        let mut row = Vec::with_capacity(cols.len() - 1);
        for col in cols.windows(2) {
            let (left, right) = (col[0].center_x(), col[1].center_x());
            let text = match BBox::new(left, bottom, right, top) {
                Ok(cell) => cell_text(&cell, &page.blocks, &mut members),
                Err(_) => String::new(),
            };
            row.push(text);
        }
        table_rows.push(row);
    }

    let mut table = TableCandidate::new(table_rows, TableSource::GridLines, GRID_CONFIDENCE);
    table.bbox = merge_bboxes(rows.iter().chain(cols.iter()));
    table.block_indices = members;
    vec![table]
}

/// Tables from filled cell rectangles.
pub fn rectangle_tables(page: &Page, config: &TableDetectorConfig) -> Vec<TableCandidate> {
    let tolerance = config.alignment_tolerance;
    if tolerance <= 0.0 {
        return Vec::new();
    }

    let mut rects: Vec<BBox> = page
        .metadata
        .drawings
        .iter()
        .filter(|d| d.kind == DrawingKind::Rectangle && d.fill.is_some())
        .map(|d| d.bbox)
        .collect();
    if rects.is_empty() {
        return Vec::new();
    }

    let bucket = |v: f32| (v / tolerance).round() as i64;
    let row_buckets: HashSet<i64> = rects.iter().map(|r| bucket(r.center_y())).collect();
    let col_buckets: HashSet<i64> = rects.iter().map(|r| bucket(r.center_x())).collect();
    if row_buckets.len() < config.min_rows || col_buckets.len() < config.min_columns {
        return Vec::new();
    }

    rects.sort_by(|a, b| {
        b.center_y()
            .partial_cmp(&a.center_y())
            .unwrap_or(Ordering::Equal)
            .then(
                a.center_x()
                    .partial_cmp(&b.center_x())
                    .unwrap_or(Ordering::Equal),
            )
    });

    let mut grouped: Vec<Vec<BBox>> = Vec::new();
    let mut row_y = f32::NAN;
    for rect in &rects {
        match grouped.last_mut() {
            Some(row) if (rect.center_y() - row_y).abs() <= tolerance => row.push(*rect),
            _ => {
                row_y = rect.center_y();
                grouped.push(vec![*rect]);
            }
        }
    }

    let mut members = Vec::new();
    let table_rows = grouped
        .iter_mut()
        .map(|row| {
            row.sort_by(|a, b| {
                a.center_x()
                    .partial_cmp(&b.center_x())
                    .unwrap_or(Ordering::Equal)
            });
            row.iter()
                .map(|cell| cell_text(cell, &page.blocks, &mut members))
                .collect()
        })
        .collect();

    let mut table = TableCandidate::new(table_rows, TableSource::Rectangles, RECTANGLE_CONFIDENCE);
    table.bbox = merge_bboxes(rects.iter());
    table.block_indices = members;
    vec![table]
}

/// Tables from blocks arranged in evenly spaced rows.
///
/// Blocks are grouped into rows while they stay horizontally aligned with
/// the row's first block. A row qualifies with enough blocks and center
/// spacings within half of the row's mean spacing. Column slots come from
/// merging nearby block centers across all qualifying rows.
pub fn alignment_tables(page: &Page, config: &TableDetectorConfig) -> Vec<TableCandidate> {
    let tolerance = config.alignment_tolerance;
    let mut positioned: Vec<(usize, BBox)> = page
        .blocks
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.bbox().map(|bb| (i, bb)))
        .collect();
    positioned.sort_by(|a, b| {
        b.1.center_y()
            .partial_cmp(&a.1.center_y())
            .unwrap_or(Ordering::Equal)
    });

    let mut rows: Vec<Vec<(usize, BBox)>> = Vec::new();
    for item in positioned {
        match rows.last_mut() {
            Some(row) if row[0].1.horizontally_aligned(&item.1, tolerance) => row.push(item),
            _ => rows.push(vec![item]),
        }
    }

    let qualifying: Vec<Vec<(usize, BBox)>> = rows
        .into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| {
                a.1.center_x()
                    .partial_cmp(&b.1.center_x())
                    .unwrap_or(Ordering::Equal)
            });
            row
        })
        .filter(|row| is_tabular_row(row, config.min_columns))
        .collect();

    if qualifying.len() < config.min_rows {
        return Vec::new();
    }

    let centers: Vec<f32> = qualifying
        .iter()
        .flatten()
        .map(|(_, bb)| bb.center_x())
        .collect();
    let slots = column_slots(centers, tolerance);

    let mut members = Vec::new();
    let table_rows = qualifying
        .iter()
        .map(|row| {
            let mut cells = vec![String::new(); slots.len()];
            for (idx, bb) in row {
                let Some(slot) = nearest_slot(bb.center_x(), &slots) else {
                    continue;
                };
                let text = page.blocks[*idx].text();
                if cells[slot].is_empty() {
                    cells[slot] = text;
                } else {
                    cells[slot].push(' ');
                    cells[slot].push_str(&text);
                }
                members.push(*idx);
            }
            cells
        })
        .collect();

    let mut table = TableCandidate::new(table_rows, TableSource::Alignment, ALIGNMENT_CONFIDENCE);
    table.bbox = merge_bboxes(qualifying.iter().flatten().map(|(_, bb)| bb));
    table.block_indices = members;
    vec![table]
}

/// Keep the first of any run of rules whose positions are within tolerance.
fn collapse_rules(sorted: Vec<BBox>, tolerance: f32, pos: impl Fn(&BBox) -> f32) -> Vec<BBox> {
    let mut kept: Vec<BBox> = Vec::with_capacity(sorted.len());
    for rule in sorted {
        let duplicate = kept
            .last()
            .is_some_and(|last| (pos(last) - pos(&rule)).abs() <= tolerance);
        if !duplicate {
            kept.push(rule);
        }
    }
    kept
}

/// Text of every block overlapping the cell, joined by spaces.
fn cell_text(cell: &BBox, blocks: &[Block], members: &mut Vec<usize>) -> String {
    let mut parts = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if block.bbox().is_some_and(|bb| bb.overlaps(cell, 0.0)) {
            parts.push(block.text());
            if !members.contains(&i) {
                members.push(i);
            }
        }
    }
    parts.join(" ").trim().to_string()
}

fn is_tabular_row(row: &[(usize, BBox)], min_columns: usize) -> bool {
    if row.len() < min_columns || row.len() < 2 {
        return false;
    }
    let spacings: Vec<f32> = row
        .windows(2)
        .map(|w| w[1].1.center_x() - w[0].1.center_x())
        .collect();
    let mean = spacings.iter().sum::<f32>() / spacings.len() as f32;
    spacings.iter().all(|s| (s - mean).abs() < mean * 0.5)
}

/// Sorted distinct positions, each merged into the previous slot (by
/// averaging) when within tolerance of it.
fn column_slots(mut positions: Vec<f32>, tolerance: f32) -> Vec<f32> {
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    positions.dedup();

    let mut slots: Vec<f32> = Vec::new();
    for pos in positions {
        match slots.last_mut() {
            Some(last) if (pos - *last).abs() <= tolerance => *last = (*last + pos) / 2.0,
            _ => slots.push(pos),
        }
    }
    slots
}

fn nearest_slot(x: f32, slots: &[f32]) -> Option<usize> {
    slots
        .iter()
        .enumerate()
        .min_by(|a, b| {
            (a.1 - x)
                .abs()
                .partial_cmp(&(b.1 - x).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Drawing, FontDescriptor, FontStyle, Word};

    fn block(text: &str, x0: f32, y0: f32) -> Block {
        Block::new(vec![Word::new(
            text,
            BBox::new(x0, y0, x0 + 30.0, y0 + 10.0).unwrap(),
            FontDescriptor::new("Helvetica", 10.0, FontStyle::Normal),
        )
        .unwrap()])
    }

    fn drawing(kind: DrawingKind, bbox: [f32; 4], fill: bool) -> Drawing {
        Drawing {
            kind,
            bbox: BBox::from_array(bbox).unwrap(),
            stroke: Some("#000000".to_string()),
            fill: fill.then(|| "#eeeeee".to_string()),
            width: 1.0,
        }
    }

    /// 3 horizontal and 3 vertical rules forming a 2x2 grid, one block per cell.
    fn grid_page() -> Page {
        let mut page = Page::new(0);
        for y in [300.0, 250.0, 200.0] {
            page.add_drawing(drawing(DrawingKind::Line, [100.0, y, 300.0, y + 1.0], false));
        }
        for x in [100.0, 200.0, 300.0] {
            page.add_drawing(drawing(DrawingKind::Line, [x, 200.0, x + 1.0, 301.0], false));
        }
        page.add_block(block("A1", 120.0, 270.0));
        page.add_block(block("B1", 220.0, 270.0));
        page.add_block(block("A2", 120.0, 220.0));
        page.add_block(block("B2", 220.0, 220.0));
        page
    }

    #[test]
    fn test_grid_lines_build_two_by_two() {
        let page = grid_page();
        let tables = grid_line_tables(&page, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.confidence, 0.9);
        assert_eq!(table.source, TableSource::GridLines);
        assert_eq!(
            table.rows,
            vec![vec!["A1", "B1"], vec!["A2", "B2"]]
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );
        assert_eq!(table.block_indices.len(), 4);
    }

    #[test]
    fn test_detector_ranks_grid_first() {
        let tables = TableDetector::new().detect(&grid_page());
        assert!(!tables.is_empty());
        assert_eq!(tables[0].source, TableSource::GridLines);
        assert!(tables.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_near_duplicate_rules_collapse() {
        let mut page = grid_page();
        page.add_drawing(drawing(DrawingKind::Line, [100.0, 251.0, 300.0, 252.0], false));
        let tables = grid_line_tables(&page, &TableDetectorConfig::default());
        assert_eq!(tables[0].row_count(), 2);
    }

    #[test]
    fn test_grid_needs_two_rules_each_way() {
        let mut page = Page::new(0);
        page.add_drawing(drawing(DrawingKind::Line, [0.0, 100.0, 200.0, 101.0], false));
        page.add_drawing(drawing(DrawingKind::Line, [0.0, 50.0, 200.0, 51.0], false));
        page.add_drawing(drawing(DrawingKind::Line, [0.0, 50.0, 1.0, 101.0], false));
        assert!(grid_line_tables(&page, &TableDetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_rectangle_cells() {
        let mut page = Page::new(0);
        for (y, row) in [(250.0, ["Name", "Age"]), (220.0, ["Ada", "36"])] {
            for (x, text) in [(100.0, row[0]), (200.0, row[1])] {
                page.add_drawing(drawing(DrawingKind::Rectangle, [x, y, x + 90.0, y + 25.0], true));
                page.add_block(block(text, x + 5.0, y + 5.0));
            }
        }
        // Unfilled rectangles are ignored
        page.add_drawing(drawing(DrawingKind::Rectangle, [0.0, 0.0, 10.0, 10.0], false));

        let tables = rectangle_tables(&page, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].confidence, 0.8);
        assert_eq!(tables[0].rows[0], vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(tables[0].rows[1], vec!["Ada".to_string(), "36".to_string()]);
    }

    #[test]
    fn test_alignment_rows() {
        let mut page = Page::new(0);
        for (i, y) in [500.0, 480.0, 460.0].iter().enumerate() {
            page.add_block(block(&format!("a{}", i), 50.0, *y));
            page.add_block(block(&format!("b{}", i), 150.0, *y));
            page.add_block(block(&format!("c{}", i), 250.0, *y));
        }
        page.add_block(block("lonely", 50.0, 100.0));

        let tables = alignment_tables(&page, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.confidence, 0.7);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[2], vec!["a2", "b2", "c2"]);
        assert_eq!(table.block_indices.len(), 9);
    }

    #[test]
    fn test_alignment_rejects_uneven_spacing() {
        let mut page = Page::new(0);
        for y in [500.0, 480.0] {
            page.add_block(block("x", 0.0, y));
            page.add_block(block("y", 20.0, y));
            page.add_block(block("z", 400.0, y));
        }
        assert!(alignment_tables(&page, &TableDetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_no_table_is_empty_result() {
        let mut page = Page::new(0);
        page.add_block(block("Only text", 10.0, 10.0));
        assert!(TableDetector::new().detect(&page).is_empty());
    }

    #[test]
    fn test_pooling_drops_weak_candidates() {
        let pooled = ConfidencePooling::default().pool(vec![
            TableCandidate::new(Vec::new(), TableSource::Alignment, 0.4),
            TableCandidate::new(Vec::new(), TableSource::Alignment, 0.7),
            TableCandidate::new(Vec::new(), TableSource::GridLines, 0.9),
        ]);
        let confidences: Vec<f32> = pooled.iter().map(|t| t.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7]);
    }

    #[test]
    fn test_column_slots_average() {
        assert_eq!(column_slots(vec![10.0, 12.0, 50.0, 10.0], 5.0), vec![11.0, 50.0]);
        assert_eq!(nearest_slot(45.0, &[11.0, 50.0]), Some(1));
        assert_eq!(nearest_slot(1.0, &[]), None);
    }
}
