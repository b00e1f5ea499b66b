//! Table candidates produced by the table reconstructor.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// Strategy that produced a table candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSource {
    /// Ruled grid of horizontal and vertical lines
    GridLines,
    /// Filled cell rectangles
    Rectangles,
    /// Text blocks aligned in rows and columns
    Alignment,
}

/// A reconstructed table: a rectangular-ish grid of cell strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCandidate {
    /// Cell text, row-major, top row first
    pub rows: Vec<Vec<String>>,

    /// Producing strategy
    pub source: TableSource,

    /// Strategy confidence
    pub confidence: f32,

    /// Region covered by the table
    pub bbox: Option<BBox>,

    /// Indices of page blocks whose text landed in a cell
    pub block_indices: Vec<usize>,
}

impl TableCandidate {
    /// Create a candidate with no region or member blocks.
    pub fn new(rows: Vec<Vec<String>>, source: TableSource, confidence: f32) -> Self {
        Self {
            rows,
            source,
            confidence,
            bbox: None,
            block_indices: Vec::new(),
        }
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Check if the table has no rows or only empty cells.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|c| c.trim().is_empty())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
