use anyhow::{Context, Result};
use notecam_overlay::{report::sidebar_lines, FrameAnnotator};
use notecam_stream::FrameSink;
use notecam_vision::{Detector, FpsCounter, FrameSource};
use tracing::{debug, info};

/// capture -> detect -> annotate -> stream until the sink asks to stop or something fails.
///
/// `fps` must already be started; it is updated once per completed frame.
pub async fn run_loop<C, D, S>(
    source: &mut C,
    detector: &mut D,
    sink: &mut S,
    annotator: &FrameAnnotator,
    fps: &mut FpsCounter,
    confidence: f32,
) -> Result<()>
where
    C: FrameSource,
    D: Detector + ?Sized,
    S: FrameSink,
{
    loop {
        let mut frame = source.next_frame().await.context("read frame")?;
        let mut report = detector.detect(&frame, confidence).context("detect")?;

        let out = annotator.annotate(&mut frame, &mut report.detections);
        if out.skipped > 0 {
            debug!("frame {}: {} note(s) off-frame", fps.frames(), out.skipped);
        }

        let text = sidebar_lines(detector.model_id(), report.duration, fps.fps(), &out.entries);
        sink.send_data(&frame, &text).context("send frame")?;
        fps.update();

        if sink.check_exit() {
            info!("run: exit requested after {} frames", fps.frames());
            return Ok(());
        }
    }
}
