//! Rendering of structured documents to Markdown, plain text and JSON.

mod json;
mod markdown;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::{heading_level, to_markdown, wrap_text, MarkdownRenderer, COLUMN_BREAK};
pub use options::{HeadingStyle, PageSelection, RenderOptions};
pub use text::to_text;
