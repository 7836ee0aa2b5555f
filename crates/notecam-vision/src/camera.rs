use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use std::process::Stdio;
use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStdout, Command},
};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_mode")]
    pub mode: String, // "ffmpeg-raw" | "libcamera-jpeg"
    /// Camera number; ffmpeg-raw reads /dev/video{index} unless `device` is set.
    #[serde(default)]
    pub index: u32,
    pub device: Option<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_warmup")]
    pub warmup_s: f32,
}

fn default_mode() -> String { "ffmpeg-raw".into() }
fn default_fps() -> u32 { 30 }
fn default_warmup() -> f32 { 2.0 }

impl CameraConfig {
    pub fn device_path(&self) -> String {
        self.device.clone().unwrap_or_else(|| format!("/dev/video{}", self.index))
    }
}

/// Endless source of RGB frames.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn next_frame(&mut self) -> Result<RgbImage>;
}

/// Reads fixed-size rgb24 frames from a child process's stdout. The child dies with this value.
pub struct RawVideoSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
}

impl RawVideoSource {
    pub fn spawn(mut cmd: Command, width: u32, height: u32) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "camera size must be non-zero");
        cmd.stdin(Stdio::null()).stdout(Stdio::piped());
        let mut child = cmd.spawn().context("spawn capture process")?;
        let stdout = child.stdout.take().context("capture process has no stdout")?;
        Ok(Self { child, stdout, width, height })
    }

    pub fn frame_len(&self) -> usize {
        (self.width * self.height * 3) as usize
    }
}

impl FrameSource for RawVideoSource {
    async fn next_frame(&mut self) -> Result<RgbImage> {
        let mut buf = vec![0u8; self.frame_len()];
        self.stdout.read_exact(&mut buf).await.context("capture stream ended")?;
        RgbImage::from_raw(self.width, self.height, buf).context("frame buffer size mismatch")
    }
}

impl Drop for RawVideoSource {
    fn drop(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!("capture: kill: {}", e);
        }
    }
}

pub fn ffmpeg_args(cfg: &CameraConfig) -> Vec<String> {
    let size = format!("{}x{}", cfg.width, cfg.height);
    let args: Vec<String> = [
        "-hide_banner", "-loglevel", "error",
        "-f", "video4linux2",
        "-framerate", &cfg.fps.to_string(),
        "-video_size", &size,
        "-i", &cfg.device_path(),
        "-vf", &format!("scale={}:{}", cfg.width, cfg.height),
        "-f", "rawvideo",
        "-pix_fmt", "rgb24",
        "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args
}

/// One `libcamera-still` run per frame.
pub struct LibcameraSource {
    cfg: CameraConfig,
}

impl FrameSource for LibcameraSource {
    async fn next_frame(&mut self) -> Result<RgbImage> {
        let mut cmd = Command::new("libcamera-still");
        cmd.args([
            "-n",                 // no preview
            "-t", "1",            // 1ms
            "--camera", &self.cfg.index.to_string(),
            "--width", &self.cfg.width.to_string(),
            "--height", &self.cfg.height.to_string(),
            "-o", "-",            // stdout
        ]);

        let out = cmd.output().await.context("run libcamera-still")?;
        anyhow::ensure!(out.status.success(), "libcamera-still failed");
        let img = image::load_from_memory(&out.stdout).context("decode jpeg")?;
        Ok(img.to_rgb8())
    }
}

pub enum Camera {
    Raw(RawVideoSource),
    Libcamera(LibcameraSource),
}

impl Camera {
    pub fn open(cfg: &CameraConfig) -> Result<Self> {
        match cfg.mode.as_str() {
            "ffmpeg-raw" => {
                let mut cmd = Command::new("ffmpeg");
                cmd.args(ffmpeg_args(cfg));
                info!("camera: ffmpeg {} {}x{}@{}", cfg.device_path(), cfg.width, cfg.height, cfg.fps);
                Ok(Self::Raw(RawVideoSource::spawn(cmd, cfg.width, cfg.height)?))
            }
            "libcamera-jpeg" => {
                info!("camera: libcamera-still camera={}", cfg.index);
                Ok(Self::Libcamera(LibcameraSource { cfg: cfg.clone() }))
            }
            other => anyhow::bail!("unknown camera.mode: {}", other),
        }
    }
}

impl FrameSource for Camera {
    async fn next_frame(&mut self) -> Result<RgbImage> {
        match self {
            Self::Raw(s) => s.next_frame().await,
            Self::Libcamera(s) => s.next_frame().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CameraConfig {
        CameraConfig {
            mode: default_mode(),
            index: 1,
            device: None,
            width: 640,
            height: 480,
            fps: 15,
            warmup_s: 0.0,
        }
    }

    #[test]
    fn device_follows_index_unless_overridden() {
        let mut c = cfg();
        assert_eq!(c.device_path(), "/dev/video1");
        c.device = Some("/dev/v4l/by-id/usb-cam".into());
        assert_eq!(c.device_path(), "/dev/v4l/by-id/usb-cam");
    }

    #[test]
    fn ffmpeg_emits_raw_rgb_at_configured_size() {
        let args = ffmpeg_args(&cfg());
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-i") + 1], "/dev/video1");
        assert_eq!(args[pos("-video_size") + 1], "640x480");
        assert_eq!(args[pos("-pix_fmt") + 1], "rgb24");
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let c = CameraConfig { mode: "gstreamer".into(), ..cfg() };
        assert!(Camera::open(&c).is_err());
    }
}
