mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use notecam_stream::{ExitFlag, Sink};
use notecam_vision::{Camera, Detector, FpsCounter, NullDetector, DEFAULT_CONFIDENCE};

use config::{build_annotator, load_config, validate, Config};

#[cfg(feature = "vision-tflite")]
use notecam_vision::tflite::TfliteDetector;

#[derive(Debug, Parser)]
#[command(name = "notecam", version, about = "notecam - sticky notes on live object detections")]
struct Cli {
    #[arg(long, default_value = "notecam.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture, detect, annotate and stream until stopped.
    Run,
    /// Validate the config and load every overlay asset.
    Doctor,
    /// Write the note that would be drawn for a detector label.
    Preview {
        #[arg(long)]
        label: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the detector model's tensor layout.
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let loaded = load_config(&cli.config)?;
    let (cfg, base_dir) = (loaded.cfg, loaded.base_dir);

    match cli.cmd {
        Command::Run => run(&cfg, &base_dir).await?,
        Command::Doctor => doctor(&cfg, &base_dir)?,
        Command::Preview { label, out } => preview(&cfg, &base_dir, &label, &out)?,
        Command::Inspect => inspect(&cfg)?,
    }
    Ok(())
}

fn doctor(cfg: &Config, base_dir: &Path) -> Result<()> {
    info!("doctor: starting");
    validate(cfg)?;
    let annotator = build_annotator(cfg, base_dir)?;
    info!(
        "doctor: {} label mapping(s), overlay policy {} with {} asset(s)",
        annotator.labels().len(),
        annotator.selector().policy_name(),
        annotator.selector().asset_count()
    );
    if cfg.detector.is_none() {
        warn!("doctor: no [detector] section, run will stream without detections");
    }
    info!("doctor: OK");
    Ok(())
}

fn preview(cfg: &Config, base_dir: &Path, label: &str, out: &Path) -> Result<()> {
    let annotator = build_annotator(cfg, base_dir)?;
    let shown = annotator.labels().display(label);
    let note = annotator
        .selector()
        .select(shown)
        .with_context(|| format!("no note for label {:?} (displayed as {:?})", label, shown))?;
    note.save(out).with_context(|| format!("write {}", out.display()))?;
    info!("preview: {:?} -> {} ({}x{})", shown, out.display(), note.width(), note.height());
    Ok(())
}

fn inspect(cfg: &Config) -> Result<()> {
    let d = cfg.detector.clone().context("no [detector] config section")?;

    #[cfg(not(feature = "vision-tflite"))]
    {
        let _ = d;
        anyhow::bail!("detector backend not available; build with --features vision-tflite");
    }

    #[cfg(feature = "vision-tflite")]
    {
        print!("{}", TfliteDetector::new(d)?.inspect()?);
        Ok(())
    }
}

async fn run(cfg: &Config, base_dir: &Path) -> Result<()> {
    info!("run: starting");
    validate(cfg)?;

    let annotator = build_annotator(cfg, base_dir)?;
    let mut detector = init_detector(cfg)?;
    let confidence = cfg.detector.as_ref().map(|d| d.confidence).unwrap_or(DEFAULT_CONFIDENCE);

    info!("run: model {}", detector.model_id());
    info!("run: engine {}", detector.engine());
    info!("run: labels {:?}", detector.labels());

    let exit = ExitFlag::new();
    {
        let exit = exit.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("run: interrupt, stopping after this frame");
                exit.request();
            }
        });
    }

    let mut fps = FpsCounter::new();
    // camera and sink live only inside this block and are released however it ends
    let result = async {
        let mut camera = Camera::open(&cfg.camera)?;
        let mut sink = Sink::open(&cfg.stream, exit.clone()).await?;
        tokio::time::sleep(std::time::Duration::from_secs_f32(cfg.camera.warmup_s)).await;
        fps.start();
        pipeline::run_loop(&mut camera, detector.as_mut(), &mut sink, &annotator, &mut fps, confidence).await
    }
    .await;

    fps.stop();
    println!("elapsed time: {:.2}", fps.elapsed().as_secs_f64());
    println!("approx. FPS: {:.2}", fps.fps());
    println!("Program Ending");
    result
}

fn init_detector(cfg: &Config) -> Result<Box<dyn Detector>> {
    let Some(d) = &cfg.detector else {
        warn!("run: no [detector] section, streaming without detections");
        return Ok(Box::new(NullDetector::default()));
    };

    #[cfg(not(feature = "vision-tflite"))]
    {
        let _ = d;
        anyhow::bail!("detector configured but binary not built with --features vision-tflite");
    }

    #[cfg(feature = "vision-tflite")]
    {
        Ok(Box::new(TfliteDetector::new(d.clone())?))
    }
}
