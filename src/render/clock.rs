use std::time::{Duration, Instant};

/// Blocks callers so consecutive ticks are at least one frame apart.
#[derive(Debug)]
pub struct FrameClock {
    frame_duration: Duration,
    last_tick: Option<Instant>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            last_tick: None,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Sleeps out the remainder of the current frame. The first tick returns immediately.
    pub fn tick(&mut self) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < self.frame_duration {
                std::thread::sleep(self.frame_duration - elapsed);
            }
        }
        self.last_tick = Some(Instant::now());
    }
}
