use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pixel-space box, corners inclusive-exclusive: start <= end on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl BoundingBox {
    pub fn new(start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Self {
        Self {
            start_x: start_x.min(end_x),
            start_y: start_y.min(end_y),
            end_x: start_x.max(end_x),
            end_y: start_y.max(end_y),
        }
    }

    /// Also correct for boxes built without `new`.
    pub fn width(&self) -> u32 {
        self.end_x.abs_diff(self.start_x)
    }

    pub fn height(&self) -> u32 {
        self.end_y.abs_diff(self.start_y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// 0..1
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self { label: label.into(), confidence, bbox }
    }
}

/// One detector pass over a frame.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub detections: Vec<Detection>,
    pub duration: Duration,
}
