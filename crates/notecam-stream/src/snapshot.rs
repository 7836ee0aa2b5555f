use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{encode_jpeg, ExitFlag, FrameSink};

/// Headless sink: keeps `latest.jpg` and `latest.txt` up to date in a directory.
pub struct SnapshotSink {
    dir: PathBuf,
    quality: u8,
    exit: ExitFlag,
    frames: u64,
}

impl SnapshotSink {
    pub fn new(dir: impl AsRef<Path>, quality: u8, exit: ExitFlag) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).with_context(|| format!("create snapshot dir {}", dir.display()))?;
        info!("stream: writing snapshots to {}", dir.display());
        Ok(Self { dir, quality, exit, frames: 0 })
    }

    pub fn frame_path(&self) -> PathBuf {
        self.dir.join("latest.jpg")
    }

    pub fn text_path(&self) -> PathBuf {
        self.dir.join("latest.txt")
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }
}

/// Readers never see a half-written file.
fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}

impl FrameSink for SnapshotSink {
    fn send_data(&mut self, frame: &RgbImage, text: &[String]) -> Result<()> {
        let jpg = encode_jpeg(frame, self.quality)?;
        replace_file(&self.frame_path(), &jpg)?;
        let mut body = text.join("\n");
        body.push('\n');
        replace_file(&self.text_path(), body.as_bytes())?;
        self.frames += 1;
        Ok(())
    }

    fn check_exit(&self) -> bool {
        self.exit.is_requested()
    }
}
