use std::time::{Duration, Instant};

/// Frames-per-second counter: frames completed since `start`, over wall time.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    started: Option<Instant>,
    stopped: Option<Instant>,
    frames: u64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = Some(now);
        self.stopped = None;
        self.frames = 0;
    }

    /// Call once per completed frame.
    pub fn update(&mut self) {
        self.frames += 1;
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        if self.started.is_some() && self.stopped.is_none() {
            self.stopped = Some(now);
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.started {
            Some(s) => self.stopped.unwrap_or(now).saturating_duration_since(s),
            None => Duration::ZERO,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps_at(Instant::now())
    }

    pub fn fps_at(&self, now: Instant) -> f64 {
        let secs = self.elapsed_at(now).as_secs_f64();
        if secs <= 0.0 { 0.0 } else { self.frames as f64 / secs }
    }
}
