pub mod mjpeg;
pub mod snapshot;

use anyhow::{Context, Result};
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, RgbImage};
use serde::Deserialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub use mjpeg::MjpegStreamer;
pub use snapshot::SnapshotSink;

/// Where annotated frames go. `check_exit` is polled once per completed frame.
pub trait FrameSink {
    fn send_data(&mut self, frame: &RgbImage, text: &[String]) -> Result<()>;
    fn check_exit(&self) -> bool;
}

/// Shared stop request, set by the viewer or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(Arc<AtomicBool>);

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_mode")]
    pub mode: String, // "mjpeg" | "snapshot"
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    #[serde(default = "default_quality")]
    pub jpeg_quality: u8,
}

fn default_mode() -> String { "mjpeg".into() }
fn default_bind() -> String { "0.0.0.0:5000".into() }
fn default_snapshot_dir() -> String { "notecam-out".into() }
fn default_quality() -> u8 { 80 }

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bind: default_bind(),
            snapshot_dir: default_snapshot_dir(),
            jpeg_quality: default_quality(),
        }
    }
}

pub enum Sink {
    Mjpeg(MjpegStreamer),
    Snapshot(SnapshotSink),
}

impl Sink {
    /// Must be called inside a tokio runtime (the mjpeg server is spawned onto it).
    pub async fn open(cfg: &StreamConfig, exit: ExitFlag) -> Result<Self> {
        match cfg.mode.as_str() {
            "mjpeg" => Ok(Self::Mjpeg(MjpegStreamer::bind(&cfg.bind, cfg.jpeg_quality, exit).await?)),
            "snapshot" => Ok(Self::Snapshot(SnapshotSink::new(&cfg.snapshot_dir, cfg.jpeg_quality, exit)?)),
            other => anyhow::bail!("unknown stream.mode: {}", other),
        }
    }
}

impl FrameSink for Sink {
    fn send_data(&mut self, frame: &RgbImage, text: &[String]) -> Result<()> {
        match self {
            Self::Mjpeg(s) => s.send_data(frame, text),
            Self::Snapshot(s) => s.send_data(frame, text),
        }
    }

    fn check_exit(&self) -> bool {
        match self {
            Self::Mjpeg(s) => s.check_exit(),
            Self::Snapshot(s) => s.check_exit(),
        }
    }
}

pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(frame.as_raw().len() / 8);
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(frame)
        .context("encode jpeg")?;
    Ok(Bytes::from(buf))
}
