//! Error types for layoutmd.

use std::io;
use thiserror::Error;

/// Result type alias for layoutmd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document could not be loaded at all.
    #[error("Failed to load {document}: {reason}")]
    LoadFailure { document: String, reason: String },

    /// The quality gate rejected the document.
    #[error("Quality gate rejected {document} (score {score:.2}): {}", issues.join("; "))]
    QualityRejection {
        document: String,
        score: f32,
        issues: Vec<String>,
    },

    /// A single page could not be processed. The pipeline skips the page.
    #[error("Page {page} could not be processed: {reason}")]
    PageProcessing { page: u32, reason: String },

    /// A span, drawing or box with invalid data.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether the pipeline recovers from this error by dropping the
    /// offending item or page.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PageProcessing { .. } | Error::MalformedInput(_)
        )
    }
}
