pub mod geometry;
pub mod types;

pub use geometry::{BBox, TextBlock, TextLine, TextSpan};
pub use types::{DataBlock, DocumentMetadata, ExtractionReport, PageLayout, PageRecord};
