//! Document model for reconstructed page layouts.
//!
//! The model is a single-owner tree: a [`Document`] owns its [`Page`]s, a
//! page owns its [`Block`]s, and a block owns its [`Word`]s. Derived values
//! (block text, bounding boxes, dominant fonts) are computed on read.

mod block;
mod document;
mod font;
mod page;
mod table;
mod word;

pub use block::{Block, BlockMetadata, Role};
pub use document::{
    Diagnostics, Document, Metadata, QualityReport, TypographyLevel, TypographyRole,
    PAGE_SEPARATOR,
};
pub use font::{color_to_hex, FontDescriptor, FontKey, FontStyle};
pub use page::{Drawing, DrawingKind, ImageInfo, Page, PageMetadata};
pub use table::{TableCandidate, TableSource};
pub use word::Word;
