//! Blocks: ordered groups of words with a semantic role.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{FontDescriptor, Word};
use crate::error::{Error, Result};
use crate::geometry::{merge_bboxes, BBox};

/// Semantic role of a block or word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unclassified text
    #[default]
    Text,
    Title,
    Heading,
    Paragraph,
    Caption,
    ListItem,
    Code,
}

/// Provenance attached to a block by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Backend block ids merged into this block
    pub source_blocks: Vec<u32>,

    /// Indices into the page's drawings that overlap this block
    pub drawing_refs: Vec<usize>,
}

impl BlockMetadata {
    fn absorb(&mut self, other: BlockMetadata) {
        for id in other.source_blocks {
            if !self.source_blocks.contains(&id) {
                self.source_blocks.push(id);
            }
        }
        for idx in other.drawing_refs {
            if !self.drawing_refs.contains(&idx) {
                self.drawing_refs.push(idx);
            }
        }
    }
}

/// A group of words, kept in extraction order.
///
/// Text, bounding box and font statistics are derived from the words on
/// every read, so they can never go stale after a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    /// Words in extraction order
    pub words: Vec<Word>,

    /// Classified role
    pub role: Role,

    /// Confidence of the role assignment
    confidence: f32,

    /// Pipeline provenance
    pub metadata: BlockMetadata,
}

#[derive(Deserialize)]
struct RawBlock {
    words: Vec<Word>,
    #[serde(default)]
    role: Role,
    confidence: f32,
    #[serde(default)]
    metadata: BlockMetadata,
}

impl TryFrom<RawBlock> for Block {
    type Error = Error;

    fn try_from(raw: RawBlock) -> Result<Self> {
        let mut block = Block::new(raw.words)
            .with_role(raw.role)
            .with_confidence(raw.confidence)?;
        block.metadata = raw.metadata;
        Ok(block)
    }
}

impl Block {
    /// Create a new block with full confidence.
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            words,
            role: Role::Text,
            confidence: 1.0,
            metadata: BlockMetadata::default(),
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the confidence, failing outside [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::MalformedInput(format!(
                "block confidence {} outside [0, 1]",
                confidence
            )));
        }
        self.confidence = confidence;
        Ok(self)
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Append a word at the end.
    pub fn add_word(&mut self, word: Word) {
        self.words.push(word);
    }

    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Union of the word boxes, `None` when the block is empty.
    pub fn bbox(&self) -> Option<BBox> {
        merge_bboxes(self.words.iter().map(|w| w.bbox()))
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Most frequent font; ties go to the font seen first.
    pub fn dominant_font(&self) -> Option<&FontDescriptor> {
        let mut counts: HashMap<_, (usize, usize)> = HashMap::new();
        for (i, word) in self.words.iter().enumerate() {
            let entry = counts.entry(word.font().key()).or_insert((0, i));
            entry.0 += 1;
        }
        counts
            .values()
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|&(_, first)| self.words[first].font())
    }

    /// Distinct fonts in order of first appearance.
    pub fn fonts(&self) -> Vec<&FontDescriptor> {
        let mut seen = Vec::new();
        let mut fonts = Vec::new();
        for word in &self.words {
            let key = word.font().key();
            if !seen.contains(&key) {
                seen.push(key);
                fonts.push(word.font());
            }
        }
        fonts
    }

    /// Mean font size, 0 for an empty block.
    pub fn avg_font_size(&self) -> f32 {
        if self.words.is_empty() {
            return 0.0;
        }
        let total: f32 = self.words.iter().map(|w| w.font().size).sum();
        total / self.words.len() as f32
    }

    /// Any word is bold.
    pub fn has_bold(&self) -> bool {
        self.words.iter().any(|w| w.font().is_bold())
    }

    /// Any word is italic.
    pub fn has_italic(&self) -> bool {
        self.words.iter().any(|w| w.font().is_italic())
    }

    /// Every word is bold.
    pub fn is_bold(&self) -> bool {
        !self.words.is_empty() && self.words.iter().all(|w| w.font().is_bold())
    }

    /// Every word is italic.
    pub fn is_italic(&self) -> bool {
        !self.words.is_empty() && self.words.iter().all(|w| w.font().is_italic())
    }

    /// Text has cased letters and none of them are lowercase.
    pub fn is_all_caps(&self) -> bool {
        let text = self.text();
        let mut has_cased = false;
        for c in text.chars() {
            if c.is_lowercase() {
                return false;
            }
            if c.is_uppercase() {
                has_cased = true;
            }
        }
        has_cased
    }

    /// Concatenate two blocks.
    ///
    /// The result keeps the role and confidence of the more confident side
    /// (ties keep `self`) and the union of both metadata records.
    pub fn merge_with(mut self, other: Block) -> Block {
        if other.confidence > self.confidence {
            self.role = other.role;
            self.confidence = other.confidence;
        }
        self.words.extend(other.words);
        self.metadata.absorb(other.metadata);
        self
    }
}
