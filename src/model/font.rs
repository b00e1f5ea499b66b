//! Font descriptors attached to words.

use serde::{Deserialize, Serialize};

/// Typographic style of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Build a style from independent bold/italic flags.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontStyle::BoldItalic,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (false, false) => FontStyle::Normal,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

/// Font used to draw a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font name (e.g., "Helvetica-Bold")
    pub name: String,

    /// Font size in points
    pub size: f32,

    /// Style derived from backend flags or the font name
    pub style: FontStyle,

    /// Fill color as `#rrggbb`
    pub color: Option<String>,
}

/// Hashable grouping key for a font: name, size bits and style.
pub type FontKey = (String, u32, FontStyle);

impl FontDescriptor {
    /// Create a new font descriptor with no color.
    pub fn new(name: impl Into<String>, size: f32, style: FontStyle) -> Self {
        Self {
            name: name.into(),
            size,
            style,
            color: None,
        }
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Grouping key `(name, size, style)` used for dominant-font counting.
    pub fn key(&self) -> FontKey {
        (self.name.clone(), self.size.to_bits(), self.style)
    }

    pub fn is_bold(&self) -> bool {
        self.style.is_bold()
    }

    pub fn is_italic(&self) -> bool {
        self.style.is_italic()
    }

    /// Heuristic check for fixed-pitch fonts.
    pub fn is_monospace(&self) -> bool {
        let name = self.name.to_lowercase();
        ["courier", "mono", "consolas", "menlo", "inconsolata"]
            .iter()
            .any(|m| name.contains(m))
    }
}

/// Format a packed RGB integer as `#rrggbb`.
pub fn color_to_hex(color: u32) -> String {
    format!("#{:06x}", color & 0x00ff_ffff)
}
