//! Layout reconstruction from raw page content.

mod assembler;
mod classifier;
mod input;
mod layout;
mod layout_parser;
mod options;
mod quality;
mod table_detector;

pub use assembler::FragmentAssembler;
pub use classifier::{is_list_item, promote_title, strip_bullet, BlockClassifier, ClassifierConfig};
pub use input::{
    parse_date, DocumentInput, PageInput, PageSource, RawDrawing, RawImage, RawMetadata, RawSpan,
    SourceInfo, FLAG_BOLD, FLAG_ITALIC,
};
pub use layout::{compare_reading_order, LayoutAnalyzer, DEFAULT_COLUMN_TOLERANCE};
pub use layout_parser::LayoutParser;
pub use options::ParseOptions;
pub use quality::{HeuristicQualityGate, QualityGate, MIN_QUALITY_SCORE};
pub use table_detector::{
    alignment_tables, grid_line_tables, rectangle_tables, ConfidencePooling, TableDetector,
    TableDetectorConfig, TablePooling, ALIGNMENT_CONFIDENCE, GRID_CONFIDENCE,
    RECTANGLE_CONFIDENCE,
};
