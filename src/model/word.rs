//! Words: the smallest positioned text unit.

use serde::{Deserialize, Serialize};

use super::{FontDescriptor, Role};
use crate::error::{Error, Result};
use crate::geometry::BBox;

/// A positioned run of non-whitespace text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWord")]
pub struct Word {
    text: String,
    bbox: BBox,
    font: FontDescriptor,
    confidence: f32,
    /// Role tag; words inherit their block's role only when asked to
    pub role: Role,
}

#[derive(Deserialize)]
struct RawWord {
    text: String,
    bbox: BBox,
    font: FontDescriptor,
    confidence: f32,
    #[serde(default)]
    role: Role,
}

impl TryFrom<RawWord> for Word {
    type Error = Error;

    fn try_from(raw: RawWord) -> Result<Self> {
        let mut word = Word::new(raw.text, raw.bbox, raw.font)?.with_confidence(raw.confidence)?;
        word.role = raw.role;
        Ok(word)
    }
}

impl Word {
    /// Create a word with full confidence.
    ///
    /// Fails when the text is empty after trimming.
    pub fn new(text: impl Into<String>, bbox: BBox, font: FontDescriptor) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::MalformedInput("word text is empty".to_string()));
        }
        Ok(Self {
            text: trimmed.to_string(),
            bbox,
            font,
            confidence: 1.0,
            role: Role::Text,
        })
    }

    /// Set the extraction confidence, failing outside [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::MalformedInput(format!(
                "word confidence {} outside [0, 1]",
                confidence
            )));
        }
        self.confidence = confidence;
        Ok(self)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn font(&self) -> &FontDescriptor {
        &self.font
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// True when the word consists solely of punctuation.
    pub fn is_punctuation(&self) -> bool {
        self.text.chars().all(|c| c.is_ascii_punctuation())
    }

    /// True for numbers, allowing thousands separators, currency and percent.
    pub fn is_numeric(&self) -> bool {
        let cleaned: String = self
            .text
            .chars()
            .filter(|c| !matches!(c, ',' | '$' | '%'))
            .collect();
        cleaned.parse::<f64>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;

    fn font() -> FontDescriptor {
        FontDescriptor::new("Helvetica", 12.0, FontStyle::Normal)
    }

    fn bbox() -> BBox {
        BBox::new(0.0, 0.0, 10.0, 12.0).unwrap()
    }

    #[test]
    fn test_rejects_empty_text() {
        assert!(Word::new("   ", bbox(), font()).is_err());
        assert!(Word::new("", bbox(), font()).is_err());
        let w = Word::new(" ok ", bbox(), font()).unwrap();
        assert_eq!(w.text(), "ok");
        assert_eq!(w.role, Role::Text);
    }

    #[test]
    fn test_confidence_range() {
        let w = Word::new("a", bbox(), font()).unwrap();
        assert!(w.clone().with_confidence(1.5).is_err());
        assert!(w.clone().with_confidence(-0.1).is_err());
        assert_eq!(w.with_confidence(0.9).unwrap().confidence(), 0.9);
    }

    #[test]
    fn test_deserialize_validates() {
        let w = Word::new("ok", bbox(), font()).unwrap().with_confidence(0.9).unwrap();
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(serde_json::from_str::<Word>(&json).unwrap(), w);

        let blank = json.replace("\"ok\"", "\"   \"");
        assert!(serde_json::from_str::<Word>(&blank).is_err());
        let overconfident = json.replace("0.9", "7.5");
        assert!(serde_json::from_str::<Word>(&overconfident).is_err());
    }

    #[test]
    fn test_numeric_and_punctuation() {
        let make = |t: &str| Word::new(t, bbox(), font()).unwrap();
        assert!(make("$1,200").is_numeric());
        assert!(make("45%").is_numeric());
        assert!(!make("abc").is_numeric());
        assert!(make("...").is_punctuation());
        assert!(!make("a.").is_punctuation());
    }
}
