// Coordinate mapping and polygon annotation

pub mod annotator;
pub mod mapper;
pub mod types;

pub use annotator::{AnnotationSnapshot, MaskAnnotator};
pub use mapper::DisplayGeometry;
pub use types::{DisplayPoint, NativePoint, Polygon, Resolution};
