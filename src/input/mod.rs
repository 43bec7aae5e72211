// Keyboard and MIDI both end up as the same three triggers; the dispatcher
// decides whether they drive pads or feed a key capture.

pub mod capture;
pub mod dispatch;
pub mod midi;

use crate::shared::KeyBinding;

pub use capture::{CaptureKind, Captured};
pub use dispatch::{CaptureOutcome, Dispatched, InputDispatcher};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    Down(KeyBinding),
    Up(KeyBinding),
    Control { controller: u8, value: u8 },
}
