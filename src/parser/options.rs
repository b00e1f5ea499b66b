//! Parsing options and configuration.

use super::{ClassifierConfig, TableDetectorConfig};

/// Options for turning raw pages into a structured document.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Distance tolerance for merging fragments on one line (points)
    pub merge_tolerance: f32,

    /// Spans below this font size are dropped
    pub min_font_size: f32,

    /// Spans above this font size are dropped
    pub max_font_size: f32,

    /// Drop spans with a zero-width or zero-height box
    pub skip_invisible_text: bool,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Run the quality gate before processing
    pub check_quality: bool,

    /// Whether to run table reconstruction
    pub detect_tables: bool,

    /// Block classification thresholds
    pub classifier: ClassifierConfig,

    /// Table reconstruction thresholds
    pub tables: TableDetectorConfig,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fragment merge tolerance.
    pub fn with_merge_tolerance(mut self, tolerance: f32) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Set the accepted font size range.
    pub fn with_font_size_range(mut self, min: f32, max: f32) -> Self {
        self.min_font_size = min;
        self.max_font_size = max;
        self
    }

    /// Keep or drop invisible text.
    pub fn with_skip_invisible(mut self, skip: bool) -> Self {
        self.skip_invisible_text = skip;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Enable or disable the quality gate.
    pub fn with_quality_check(mut self, check: bool) -> Self {
        self.check_quality = check;
        self
    }

    /// Enable or disable table reconstruction.
    pub fn with_table_detection(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }

    /// Set classifier thresholds.
    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    /// Set table reconstruction thresholds.
    pub fn with_tables(mut self, config: TableDetectorConfig) -> Self {
        self.tables = config;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            merge_tolerance: 2.0,
            min_font_size: 4.0,
            max_font_size: 72.0,
            skip_invisible_text: true,
            parallel: true,
            check_quality: true,
            detect_tables: true,
            classifier: ClassifierConfig::default(),
            tables: TableDetectorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_merge_tolerance(4.0)
            .with_font_size_range(6.0, 48.0)
            .with_quality_check(false)
            .sequential();

        assert_eq!(options.merge_tolerance, 4.0);
        assert_eq!(options.min_font_size, 6.0);
        assert_eq!(options.max_font_size, 48.0);
        assert!(!options.check_quality);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.merge_tolerance, 2.0);
        assert!(options.skip_invisible_text);
        assert!(options.parallel);
        assert!(options.detect_tables);
        assert_eq!(options.tables.min_rows, 2);
    }
}
