// "assign next key": keyboard and MIDI-note listeners race for a key
// binding, a MIDI controller listener takes a control binding

use std::time::{Duration, Instant};

use super::Trigger;
use crate::shared::KeyBinding;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureKind {
    Key,
    Control,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Captured {
    Key(KeyBinding),
    Control(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Keyboard,
    MidiNote,
    MidiControl,
}

#[derive(Debug)]
struct Listener {
    source: Source,
    pressed: Option<KeyBinding>,
}

impl Listener {
    fn new(source: Source) -> Self {
        Self { source, pressed: None }
    }

    fn accepts(&self, key: &KeyBinding) -> bool {
        matches!(
            (self.source, key),
            (Source::Keyboard, KeyBinding::Key(_)) | (Source::MidiNote, KeyBinding::Note(_))
        )
    }

    fn claims(&self, trigger: &Trigger) -> bool {
        match trigger {
            Trigger::Down(key) | Trigger::Up(key) => self.accepts(key),
            Trigger::Control { .. } => self.source == Source::MidiControl,
        }
    }

    // key captures need a down followed by an up; an up on its own (say,
    // releasing the key that opened the capture) is ignored
    fn feed(&mut self, trigger: &Trigger) -> Option<Captured> {
        match trigger {
            Trigger::Down(key) if self.accepts(key) => {
                if self.pressed.is_none() {
                    self.pressed = Some(key.clone());
                }
                None
            }
            Trigger::Up(key) if self.accepts(key) => self.pressed.take().map(Captured::Key),
            Trigger::Control { controller, .. } if self.source == Source::MidiControl => {
                Some(Captured::Control(*controller))
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Capture {
    kind: CaptureKind,
    target: (usize, usize),
    deadline: Instant,
    timeout: Duration,
    listeners: Vec<Listener>,
}

impl Capture {
    pub fn new(kind: CaptureKind, target: (usize, usize), now: Instant, timeout: Duration) -> Self {
        let listeners = match kind {
            CaptureKind::Key => vec![Listener::new(Source::Keyboard), Listener::new(Source::MidiNote)],
            CaptureKind::Control => vec![Listener::new(Source::MidiControl)],
        };
        Self {
            kind,
            target,
            deadline: now + timeout,
            timeout,
            listeners,
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    pub fn target(&self) -> (usize, usize) {
        self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    // whether some listener wants this trigger; the rest stay live
    pub fn claims(&self, trigger: &Trigger) -> bool {
        self.listeners.iter().any(|l| l.claims(trigger))
    }

    // first listener to resolve wins, the rest are cancelled
    pub fn feed(&mut self, trigger: &Trigger) -> Option<Captured> {
        let won = self.listeners.iter_mut().find_map(|l| l.feed(trigger));
        if won.is_some() {
            self.listeners.clear();
        }
        won
    }

    pub fn listening(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> KeyBinding {
        KeyBinding::Key(k.into())
    }

    #[test]
    fn key_capture_needs_down_then_up() {
        let now = Instant::now();
        let mut cap = Capture::new(CaptureKind::Key, (0, 0), now, Duration::from_secs(5));
        assert_eq!(cap.feed(&Trigger::Up(key("enter"))), None);
        assert_eq!(cap.feed(&Trigger::Down(key("q"))), None);
        assert_eq!(cap.feed(&Trigger::Down(key("w"))), None);
        assert_eq!(cap.feed(&Trigger::Up(key("w"))), Some(Captured::Key(key("q"))));
        assert_eq!(cap.listening(), 0);
    }

    #[test]
    fn first_source_to_finish_wins() {
        let now = Instant::now();
        let mut cap = Capture::new(CaptureKind::Key, (1, 2), now, Duration::from_secs(5));
        assert_eq!(cap.listening(), 2);
        cap.feed(&Trigger::Down(key("a")));
        cap.feed(&Trigger::Down(KeyBinding::Note(36)));
        assert_eq!(cap.feed(&Trigger::Up(KeyBinding::Note(36))), Some(Captured::Key(KeyBinding::Note(36))));
        // the keyboard half was cancelled with it
        assert_eq!(cap.feed(&Trigger::Up(key("a"))), None);
    }

    #[test]
    fn control_capture_takes_the_first_controller() {
        let now = Instant::now();
        let mut cap = Capture::new(CaptureKind::Control, (0, 0), now, Duration::from_secs(5));
        assert_eq!(cap.feed(&Trigger::Down(KeyBinding::Note(40))), None);
        assert_eq!(cap.feed(&Trigger::Up(KeyBinding::Note(40))), None);
        assert_eq!(
            cap.feed(&Trigger::Control { controller: 7, value: 90 }),
            Some(Captured::Control(7))
        );
    }

    #[test]
    fn key_capture_ignores_controllers() {
        let now = Instant::now();
        let mut cap = Capture::new(CaptureKind::Key, (0, 0), now, Duration::from_secs(5));
        assert_eq!(cap.feed(&Trigger::Control { controller: 1, value: 1 }), None);
        assert_eq!(cap.listening(), 2);
    }

    #[test]
    fn each_kind_claims_only_its_own_sources() {
        let now = Instant::now();
        let keys = Capture::new(CaptureKind::Key, (0, 0), now, Duration::from_secs(5));
        assert!(keys.claims(&Trigger::Down(key("q"))));
        assert!(keys.claims(&Trigger::Up(KeyBinding::Note(60))));
        assert!(!keys.claims(&Trigger::Control { controller: 7, value: 127 }));

        let controls = Capture::new(CaptureKind::Control, (0, 0), now, Duration::from_secs(5));
        assert!(controls.claims(&Trigger::Control { controller: 7, value: 0 }));
        assert!(!controls.claims(&Trigger::Down(key("q"))));
        assert!(!controls.claims(&Trigger::Down(KeyBinding::Note(60))));
    }

    #[test]
    fn expiry() {
        let now = Instant::now();
        let cap = Capture::new(CaptureKind::Key, (0, 0), now, Duration::from_secs(5));
        assert!(!cap.is_expired(now + Duration::from_secs(4)));
        assert!(cap.is_expired(now + Duration::from_secs(5)));
    }
}
