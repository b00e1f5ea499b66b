//! Reading order and column detection.

use std::cmp::Ordering;

use crate::model::{Block, Page};

/// Default horizontal tolerance for column membership (points).
pub const DEFAULT_COLUMN_TOLERANCE: f32 = 10.0;

/// Orders blocks for reading and groups them into columns.
#[derive(Debug, Clone)]
pub struct LayoutAnalyzer {
    column_tolerance: f32,
}

impl LayoutAnalyzer {
    /// Create an analyzer with the default column tolerance.
    pub fn new() -> Self {
        Self::with_tolerance(DEFAULT_COLUMN_TOLERANCE)
    }

    /// Create an analyzer with a custom column tolerance.
    pub fn with_tolerance(column_tolerance: f32) -> Self {
        Self { column_tolerance }
    }

    pub fn column_tolerance(&self) -> f32 {
        self.column_tolerance
    }

    /// Stable sort of the page's blocks into reading order.
    ///
    /// Top-to-bottom by center y, then left-to-right by center x. Blocks
    /// without a bounding box come first, in their original order.
    pub fn sort_reading_order(&self, page: &mut Page) {
        page.blocks.sort_by(compare_reading_order);
    }

    /// Block indices in reading order, leaving the blocks where they are.
    pub fn reading_order(&self, blocks: &[Block]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by(|&a, &b| compare_reading_order(&blocks[a], &blocks[b]));
        order
    }

    /// Group blocks into columns.
    ///
    /// Blocks are visited left-to-right by center x; each joins the first
    /// column holding any member whose center x is within tolerance, or
    /// opens a new column. Returns block indices per column, columns in
    /// creation order and members top-to-bottom. Blocks without a bounding
    /// box are not assigned to any column.
    pub fn detect_columns(&self, blocks: &[Block]) -> Vec<Vec<usize>> {
        let mut positioned: Vec<(usize, f32, f32)> = blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.bbox().map(|bb| (i, bb.center_x(), bb.center_y())))
            .collect();
        positioned.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let mut columns: Vec<Vec<(usize, f32, f32)>> = Vec::new();
        for item in positioned {
            let target = columns.iter().position(|col| {
                col.iter()
                    .any(|member| (member.1 - item.1).abs() <= self.column_tolerance)
            });
            match target {
                Some(idx) => columns[idx].push(item),
                None => columns.push(vec![item]),
            }
        }

        columns
            .into_iter()
            .map(|mut col| {
                col.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
                col.into_iter().map(|(i, _, _)| i).collect()
            })
            .collect()
    }

    /// Two or more columns detected.
    pub fn is_multi_column(&self, blocks: &[Block]) -> bool {
        self.detect_columns(blocks).len() >= 2
    }
}

impl Default for LayoutAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reading-order comparator: no bbox first, then (-center_y, center_x).
pub fn compare_reading_order(a: &Block, b: &Block) -> Ordering {
    match (a.bbox(), b.bbox()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b
            .center_y()
            .partial_cmp(&a.center_y())
            .unwrap_or(Ordering::Equal)
            .then(
                a.center_x()
                    .partial_cmp(&b.center_x())
                    .unwrap_or(Ordering::Equal),
            ),
    }
}
