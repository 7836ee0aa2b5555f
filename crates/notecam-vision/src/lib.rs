mod nms;
pub mod camera;
pub mod fps;
pub mod null;
#[cfg(feature = "vision-tflite")]
pub mod tflite;

use anyhow::Result;
use image::RgbImage;
use notecam_proto::{BoundingBox, Detection, DetectionReport};
use serde::Deserialize;

pub use camera::{Camera, CameraConfig, FrameSource};
pub use fps::FpsCounter;
pub use null::NullDetector;

/// Detections below this confidence are dropped.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    pub backend: String, // "tflite"
    /// Shown in the viewer sidebar; defaults to the model file stem.
    pub model_id: Option<String>,
    #[serde(default)]
    pub use_coral: bool,
    pub model_path: String,
    pub model_path_edgetpu: Option<String>,

    pub img_w: u32,
    pub img_h: u32,
    pub class_names: Vec<String>,

    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default = "default_nms_iou")]
    pub nms_iou_threshold: f32,
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
    #[serde(default = "default_output_layout")]
    pub output_layout: String, // "ultralytics"
}

fn default_confidence() -> f32 { DEFAULT_CONFIDENCE }
fn default_nms_iou() -> f32 { 0.45 }
fn default_max_detections() -> usize { 100 }
fn default_output_layout() -> String { "ultralytics".into() }

impl DetectorConfig {
    pub fn resolved_model_id(&self) -> String {
        self.model_id.clone().unwrap_or_else(|| {
            std::path::Path::new(&self.model_path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.model_path.clone())
        })
    }
}

pub trait Detector {
    fn model_id(&self) -> &str;
    fn engine(&self) -> &str;
    fn labels(&self) -> &[String];
    fn detect(&mut self, frame: &RgbImage, confidence: f32) -> Result<DetectionReport>;
}

/// Model-space candidate, box normalized 0..1 and centre-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub conf: f32,
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl Candidate {
    /// Pixel corner box in a `frame_w` x `frame_h` frame, clamped to the frame.
    pub fn to_detection(&self, class_names: &[String], frame_w: u32, frame_h: u32) -> Detection {
        let fw = frame_w as f32;
        let fh = frame_h as f32;
        let x0 = ((self.cx - self.w / 2.0) * fw).clamp(0.0, fw);
        let y0 = ((self.cy - self.h / 2.0) * fh).clamp(0.0, fh);
        let x1 = ((self.cx + self.w / 2.0) * fw).clamp(0.0, fw);
        let y1 = ((self.cy + self.h / 2.0) * fh).clamp(0.0, fh);
        let label = class_names
            .get(self.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class{}", self.class_id));
        Detection::new(
            label,
            self.conf,
            BoundingBox::new(x0.round() as i32, y0.round() as i32, x1.round() as i32, y1.round() as i32),
        )
    }
}

pub fn postprocess_ultralytics(
    raw: &[f32],
    num_preds: usize,
    num_classes: usize,
    conf_th: f32,
) -> Vec<Candidate> {
    // Ultralytics common export:
    // [cx, cy, w, h, obj, cls0..]
    let stride = 5 + num_classes;
    let mut out = Vec::new();

    for i in 0..num_preds {
        let base = i * stride;
        if base + stride > raw.len() { break; }
        let row = &raw[base..base + stride];
        let obj = row[4];

        let mut best_c = 0usize;
        let mut best_p = 0.0f32;
        for (c, &p) in row[5..].iter().enumerate() {
            if p > best_p { best_p = p; best_c = c; }
        }
        let conf = obj * best_p;
        if conf >= conf_th {
            out.push(Candidate { class_id: best_c, conf, cx: row[0], cy: row[1], w: row[2], h: row[3] });
        }
    }
    out
}

pub fn nms_filter(mut cands: Vec<Candidate>, iou_th: f32, max_det: usize) -> Vec<Candidate> {
    cands.sort_by(|a, b| b.conf.partial_cmp(&a.conf).unwrap_or(std::cmp::Ordering::Equal));
    let mut kept: Vec<Candidate> = Vec::new();

    'outer: for c in cands {
        for k in &kept {
            if k.class_id == c.class_id && nms::iou(&c, k) >= iou_th {
                continue 'outer;
            }
        }
        kept.push(c);
        if kept.len() >= max_det { break; }
    }
    kept
}
