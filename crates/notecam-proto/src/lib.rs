pub mod detection;

pub use detection::{BoundingBox, Detection, DetectionReport};
