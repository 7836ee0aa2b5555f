use anyhow::Result;
use image::RgbImage;
use notecam_proto::DetectionReport;

use crate::Detector;

/// Detects nothing. Lets camera and viewer be checked without a model.
#[derive(Debug, Default)]
pub struct NullDetector {
    labels: Vec<String>,
}

impl Detector for NullDetector {
    fn model_id(&self) -> &str {
        "none"
    }

    fn engine(&self) -> &str {
        "none"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn detect(&mut self, _frame: &RgbImage, _confidence: f32) -> Result<DetectionReport> {
        Ok(DetectionReport::default())
    }
}
