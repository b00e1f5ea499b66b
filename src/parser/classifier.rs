//! Block classification from typography and text shape.
//!
//! Every decision looks at one block in isolation, so classifying a page
//! is order-independent and running it twice changes nothing.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Block, Document, Page, Role};

/// Thresholds for block classification.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Font size at or above which a block counts as large (points)
    pub heading_min_size: f32,
    /// Word count at or below which a block counts as short
    pub heading_max_words: usize,
    /// Number of heading signals required
    pub heading_min_score: usize,
    /// Font size at or below which italic text is a caption (points)
    pub caption_max_size: f32,
    /// Lowercase prefixes that mark a caption
    pub caption_prefixes: Vec<String>,
    /// Recognize bullet and numbered list items
    pub detect_lists: bool,
    /// Recognize monospaced blocks as code
    pub detect_code: bool,
    /// Promote the document's leading, largest heading to a title
    pub promote_title: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heading_min_size: 14.0,
            heading_max_words: 10,
            heading_min_score: 2,
            caption_max_size: 10.0,
            caption_prefixes: ["figure", "table", "image", "chart", "graph", "diagram"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            detect_lists: true,
            detect_code: true,
            promote_title: true,
        }
    }
}

/// Assigns a [`Role`] to each block.
#[derive(Debug, Clone, Default)]
pub struct BlockClassifier {
    config: ClassifierConfig,
}

impl BlockClassifier {
    /// Create a classifier with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with custom thresholds.
    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify every block on a page in place.
    pub fn classify_page(&self, page: &mut Page) {
        for block in &mut page.blocks {
            block.role = self.classify(block);
        }
    }

    /// Role for one block.
    ///
    /// A block already promoted to [`Role::Title`] keeps it; that role is
    /// assigned at document level and cannot be recovered from one block.
    pub fn classify(&self, block: &Block) -> Role {
        if block.role == Role::Title {
            return Role::Title;
        }
        if block.is_empty() {
            return Role::Text;
        }
        if self.heading_score(block) >= self.config.heading_min_score {
            Role::Heading
        } else if self.is_caption(block) {
            Role::Caption
        } else if self.config.detect_lists && is_list_item(&block.text()) {
            Role::ListItem
        } else if self.config.detect_code && block.dominant_font().is_some_and(|f| f.is_monospace())
        {
            Role::Code
        } else {
            Role::Paragraph
        }
    }

    /// Count of heading signals: large, bold, short, all caps.
    pub fn heading_score(&self, block: &Block) -> usize {
        let Some(font) = block.dominant_font() else {
            return 0;
        };
        [
            font.size >= self.config.heading_min_size,
            font.is_bold(),
            block.word_count() <= self.config.heading_max_words,
            block.is_all_caps(),
        ]
        .iter()
        .filter(|&&signal| signal)
        .count()
    }

    pub fn is_caption(&self, block: &Block) -> bool {
        let Some(font) = block.dominant_font() else {
            return false;
        };
        if font.size <= self.config.caption_max_size && font.is_italic() {
            return true;
        }
        let text = block.text().to_lowercase();
        self.config
            .caption_prefixes
            .iter()
            .any(|p| text.starts_with(p.as_str()))
    }
}

/// Mark the first heading of the first page as the document title when it
/// is set in the largest font of the whole document.
///
/// Does nothing if a title already exists. Returns whether a block was
/// promoted.
pub fn promote_title(doc: &mut Document) -> bool {
    let has_title = doc
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .any(|b| b.role == Role::Title);
    if has_title {
        return false;
    }

    let max_size = doc
        .pages
        .iter()
        .flat_map(|p| p.all_words())
        .map(|w| w.font().size)
        .fold(f32::NEG_INFINITY, f32::max);

    let Some(page) = doc.pages.first_mut() else {
        return false;
    };
    let candidate = page.blocks.iter_mut().find(|b| b.role == Role::Heading);
    match candidate {
        Some(block) if block.dominant_font().is_some_and(|f| f.size >= max_size) => {
            log::debug!("promoting {:?} to title", block.text());
            block.role = Role::Title;
            true
        }
        _ => false,
    }
}

/// Text opens with a list marker followed by content.
pub fn is_list_item(text: &str) -> bool {
    static ORDERED: OnceLock<Option<Regex>> = OnceLock::new();
    let text = text.trim_start();
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    if first.len() == text.len() {
        return false;
    }
    if is_bullet_marker(first) {
        return true;
    }
    ORDERED
        .get_or_init(|| Regex::new(r"^(\d{1,3}|[a-zA-Z])[.)]\s+\S").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Strip a leading bullet glyph, if any.
pub fn strip_bullet(text: &str) -> &str {
    let trimmed = text.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((marker, rest)) if is_bullet_marker(marker) => rest.trim_start(),
        _ => trimmed,
    }
}

/// Check if text is a bullet-style list marker.
fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "□"
            | "◆" | "◇" | "▶" | "▷" | "➤" | "➜"
    )
}
