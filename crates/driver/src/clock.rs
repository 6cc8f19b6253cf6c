use framecore_behavior::FrameTime;

/// Frame timing. `begin` reads the current time and produces the clamped
/// delta; `end` makes that time the new "last frame".
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_delta: f32,
    last: Option<f64>,
    current: f64,
    elapsed: f64,
    frame: u64,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            max_delta,
            last: None,
            current: 0.0,
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Set the reference time before the first frame.
    pub fn start(&mut self, now: f64) {
        self.last = Some(now);
        self.current = now;
    }

    pub fn begin(&mut self, now: f64) -> FrameTime {
        let last = *self.last.get_or_insert(now);
        self.current = now;
        let raw = (now - last).max(0.0) as f32;
        let delta = raw.min(self.max_delta);
        if raw > self.max_delta {
            tracing::debug!(raw, clamped = delta, "frame delta clamped");
        }
        self.elapsed += f64::from(delta);
        FrameTime {
            delta,
            elapsed: self.elapsed,
            frame: self.frame,
        }
    }

    pub fn end(&mut self) {
        self.last = Some(self.current);
        self.frame += 1;
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
