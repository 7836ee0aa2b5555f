pub mod annotate;
pub mod assets;
pub mod composite;
pub mod markup;
pub mod remap;
pub mod report;
pub mod select;
pub mod text;

use serde::Deserialize;
use std::{collections::BTreeMap, path::PathBuf};

pub use annotate::{Annotated, FrameAnnotator};
pub use composite::{composite, placement, Placement};
pub use remap::LabelMap;
pub use select::OverlaySelector;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("overlay {width}x{height} at ({x},{y}) does not fit a {frame_w}x{frame_h} frame")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        frame_w: u32,
        frame_h: u32,
    },
    #[error("load overlay asset {path}")]
    Asset {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("read font {path}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font file {path}")]
    Font { path: PathBuf },
    #[error("scale factors must be > 0 (got w={w}, h={h})")]
    BadScale { w: f32, h: f32 },
}

/// Per-axis resize factors applied once when an asset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Scale {
    pub w: f32,
    pub h: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self { w: 0.23, h: 0.23 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextStyle {
    #[serde(default = "default_text_x")]
    pub x: i32,
    /// Baseline of the first line.
    #[serde(default = "default_text_y")]
    pub y: i32,
    #[serde(default = "default_line_step")]
    pub line_step: i32,
    #[serde(default = "default_text_px")]
    pub size_px: f32,
    #[serde(default = "default_text_color")]
    pub color: [u8; 3],
}

fn default_text_x() -> i32 { 10 }
fn default_text_y() -> i32 { 10 }
fn default_line_step() -> i32 { 20 }
fn default_text_px() -> f32 { 11.0 }
fn default_text_color() -> [u8; 3] { [0, 0, 255] }

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            x: default_text_x(),
            y: default_text_y(),
            line_step: default_line_step(),
            size_px: default_text_px(),
            color: default_text_color(),
        }
    }
}

/// `[overlay]` table. Relative paths resolve against the config file's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum OverlayConfig {
    /// One shared note for every detection.
    Single {
        image: PathBuf,
        #[serde(default)]
        scale: Scale,
    },
    /// Display label -> note image. Labels without an entry get no note.
    PerLabel {
        #[serde(default)]
        scale: Scale,
        assets: BTreeMap<String, PathBuf>,
    },
    /// Label words written one per line onto a copy of `template`.
    DynamicText {
        template: PathBuf,
        #[serde(default)]
        scale: Scale,
        font_path: PathBuf,
        #[serde(default)]
        text: TextStyle,
    },
}
