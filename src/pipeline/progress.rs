use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    pub position_s: f32,
    pub duration_s: f32,
}

impl Playhead {
    // clamped to 0..=1, 0 when the duration is unknown
    pub fn fraction(&self) -> f32 {
        if !(self.duration_s.is_finite() && self.duration_s > 0.0) {
            return 0.0;
        }
        let f = self.position_s / self.duration_s;
        if f.is_finite() { f.clamp(0.0, 1.0) } else { 0.0 }
    }
}

// polled once per ui frame; the pad cancels it on destroy
#[derive(Debug)]
pub struct ProgressTask {
    last_emit: Option<Instant>,
    min_interval: Duration,
    cancelled: bool,
}

impl ProgressTask {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn poll(
        &mut self,
        now: Instant,
        alive: bool,
        playing: bool,
        playhead: Option<Playhead>,
    ) -> Option<f32> {
        if self.cancelled || !alive {
            return None;
        }
        if !playing {
            return None;
        }
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.min_interval {
                return None;
            }
        }
        self.last_emit = Some(now);
        Some(playhead.map(|p| p.fraction()).unwrap_or(0.0))
    }
}
