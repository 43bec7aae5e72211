// live pad handlers by default; a capture swaps in for the triggers it
// listens to, and every way out of it puts the live route back

use std::time::{Duration, Instant};

use super::capture::{Capture, CaptureKind, Captured};
use super::Trigger;
use crate::errors::CaptureError;

#[derive(Debug)]
enum Route {
    Live,
    Capturing(Capture),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureOutcome {
    pub kind: CaptureKind,
    pub target: (usize, usize),
    pub result: Result<Captured, CaptureError>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dispatched {
    pub live: Option<Trigger>,
    pub capture: Option<CaptureOutcome>,
}

#[derive(Debug)]
pub struct InputDispatcher {
    route: Route,
    timeout: Duration,
}

impl InputDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self { route: Route::Live, timeout }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.route, Route::Live)
    }

    pub fn capturing(&self) -> Option<CaptureKind> {
        match &self.route {
            Route::Capturing(c) => Some(c.kind()),
            Route::Live => None,
        }
    }

    // a capture already in flight is cancelled and returned
    pub fn begin_capture(
        &mut self,
        kind: CaptureKind,
        target: (usize, usize),
        now: Instant,
    ) -> Option<CaptureOutcome> {
        let replaced = self.cancel_capture();
        self.route = Route::Capturing(Capture::new(kind, target, now, self.timeout));
        log::debug!("capturing {kind:?} for pad {target:?}");
        replaced
    }

    pub fn cancel_capture(&mut self) -> Option<CaptureOutcome> {
        self.finish(Err(CaptureError::Cancelled))
    }

    // once per tick
    pub fn poll_timeout(&mut self, now: Instant) -> Option<CaptureOutcome> {
        match &self.route {
            Route::Capturing(c) if c.is_expired(now) => {
                let waited = c.timeout();
                self.finish(Err(CaptureError::TimedOut(waited)))
            }
            _ => None,
        }
    }

    pub fn dispatch(&mut self, trigger: Trigger, now: Instant) -> Dispatched {
        let expired = self.poll_timeout(now);
        if let Some(outcome) = expired {
            // the deadline passed before this arrived, so it belongs to the live handlers
            return Dispatched { live: Some(trigger), capture: Some(outcome) };
        }

        let won = match &mut self.route {
            Route::Capturing(capture) if capture.claims(&trigger) => capture.feed(&trigger),
            _ => return Dispatched { live: Some(trigger), capture: None },
        };
        Dispatched {
            live: None,
            capture: won.and_then(|captured| self.finish(Ok(captured))),
        }
    }

    // put the live route back and report how the capture went
    fn finish(&mut self, result: Result<Captured, CaptureError>) -> Option<CaptureOutcome> {
        match std::mem::replace(&mut self.route, Route::Live) {
            Route::Capturing(capture) => Some(CaptureOutcome {
                kind: capture.kind(),
                target: capture.target(),
                result,
            }),
            Route::Live => None,
        }
    }
}
