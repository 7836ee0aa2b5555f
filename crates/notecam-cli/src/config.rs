use anyhow::{Context, Result};
use notecam_overlay::{markup::MarkupStyle, FrameAnnotator, LabelMap, OverlayConfig, OverlaySelector};
use notecam_stream::StreamConfig;
use notecam_vision::{CameraConfig, DetectorConfig};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub detector: Option<DetectorConfig>,
    pub camera: CameraConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub markup: MarkupStyle,
    #[serde(default)]
    pub report: ReportCfg,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportCfg {
    #[serde(default)]
    pub show_remapped_labels: bool,
}

/// Parsed config plus the directory its relative paths resolve against.
pub struct Loaded {
    pub cfg: Config,
    pub base_dir: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Loaded> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg = parse_config(&s)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Loaded { cfg, base_dir })
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

/// Loads every overlay asset once; the result is read-only for the rest of the run.
pub fn build_annotator(cfg: &Config, base_dir: &Path) -> Result<FrameAnnotator> {
    let selector = OverlaySelector::load(&cfg.overlay, base_dir).context("load overlay assets")?;
    let labels: LabelMap = cfg.labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    Ok(FrameAnnotator::new(labels, selector)
        .with_markup(cfg.markup.clone())
        .report_remapped(cfg.report.show_remapped_labels))
}

/// Static checks that need no camera, model or network.
pub fn validate(cfg: &Config) -> Result<()> {
    anyhow::ensure!(
        matches!(cfg.camera.mode.as_str(), "ffmpeg-raw" | "libcamera-jpeg"),
        "unknown camera.mode: {}",
        cfg.camera.mode
    );
    anyhow::ensure!(cfg.camera.width > 0 && cfg.camera.height > 0, "camera.width/height must be > 0");
    anyhow::ensure!(cfg.camera.warmup_s >= 0.0, "camera.warmup_s must be >= 0");
    anyhow::ensure!(
        matches!(cfg.stream.mode.as_str(), "mjpeg" | "snapshot"),
        "unknown stream.mode: {}",
        cfg.stream.mode
    );
    if let Some(d) = &cfg.detector {
        anyhow::ensure!(d.backend == "tflite", "unknown detector.backend: {}", d.backend);
        anyhow::ensure!(!d.class_names.is_empty(), "detector.class_names is empty");
        anyhow::ensure!(d.confidence > 0.0 && d.confidence <= 1.0, "detector.confidence must be in (0, 1]");
        anyhow::ensure!(d.img_w > 0 && d.img_h > 0, "detector.img_w/img_h must be > 0");
    }
    Ok(())
}
