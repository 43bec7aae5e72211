// Types shared between the tui, the middle layer and the input dispatch.
//
// The rendering plan:
//   - Only the middle layer owns the board, the pads and their playback state.
//   - Each frame the tui calls `middle.display_state()` to get a `DisplayState`
//     and draws it. It never reaches into a pad directly.
//   - Per pad the renderer gets colour, key/control label, play mode glyph,
//     playing flag, live progress fraction and live volume fraction.
//
// Default keys (settings mode is toggled with Tab):
//   any unreserved key   //  pad key down / key up
//   mouse left on a pad  //  push / release (settings mode: select)
//   wheel on a pad       //  volume +-1% (Shift: +-10%)
//   Ctrl+R / Ctrl+L      //  add row / add column
//   Ctrl+S / Ctrl+O      //  export / import a .soundboard file
//   Ctrl+X               //  clear the board
//   Ctrl+Q, Ctrl+C, Esc  //  quit (Esc cancels a prompt or capture first)
//   settings mode:
//     arrows             //  move selection
//     r / o / g          //  retrigger / one-shot / gate
//     c                  //  next colour
//     k / m              //  assign key / assign midi control
//     a                  //  assign an audio file (or paste a path)
//     d, Delete          //  delete pad
//     + / -              //  master volume

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::Trigger;
use crate::input::CaptureKind;
use crate::pipeline::PlayMode;

pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 5;

// terminal cells per pad when fitting the board to the screen
pub const PAD_CELL_WIDTH: u16 = 16;
pub const PAD_CELL_HEIGHT: u16 = 6;

// A pad's key binding: a keyboard key identifier or a midi note number.
// Untagged so the saved file keeps the plain string/number shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyBinding {
    Note(u8),
    Key(String),
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyBinding::Note(note) => write!(f, "{}", note_name(*note)),
            KeyBinding::Key(key) => write!(f, "{}", key.to_uppercase()),
        }
    }
}

// midi note number to a name like C4 / F#2
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}

// how many rows and columns fit nicely in a terminal of this size
pub fn rows_and_cols(width: u16, height: u16) -> (usize, usize) {
    let rows = (height.saturating_sub(2) / PAD_CELL_HEIGHT).max(1);
    let cols = (width / PAD_CELL_WIDTH).max(1);
    (rows as usize, cols as usize)
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // key / note / control events, keyboard ones come from the tui and midi
    // ones from the midi thread
    Pad(Trigger),

    // mouse on a grid cell
    PadMouseDown { x: usize, y: usize },
    PadMouseUp { x: usize, y: usize },
    PadWheel { x: usize, y: usize, delta_x: f32, delta_y: f32 },
    Select { x: usize, y: usize },
    MoveSelection { dx: i32, dy: i32 },

    // settings for the selected pad
    ToggleSettings,
    SetPlayMode(PlayMode),
    CycleColour,
    AssignKey,
    AssignControl,
    AssignFile,
    DeleteSound,
    MasterVolume(f32), // step up/down, applied to every pad

    // board
    AddRow,
    AddColumn,
    Clear,
    SaveAs,
    Load,

    // prompt line
    PromptChar(char),
    PromptBackspace,
    PromptSubmit,

    // a dropped/pasted file path, or text for the prompt
    Paste(String),
    Resize { width: u16, height: u16 },
    Cancel,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PadView {
    pub x: usize,
    pub y: usize,
    pub colour: String,
    pub label: String, // key and/or control binding
    pub name: String,  // asset file name
    pub mode: PlayMode,
    pub playing: bool,
    pub progress: f32, // 0..=1
    pub volume: f32,   // 0..=1
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub rows: usize,
    pub cols: usize,
    pub pads: Vec<PadView>, // occupied cells only, row-major
    pub settings: bool,
    pub selected: (usize, usize),
    pub prompt: Option<(String, String)>, // (label, current text)
    pub capturing: Option<CaptureKind>,
    pub status: String,
    pub master_volume: f32,
}

impl DisplayState {
    pub fn pad_at(&self, x: usize, y: usize) -> Option<&PadView> {
        self.pads.iter().find(|p| p.x == x && p.y == y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bindings_keep_their_json_shape() {
        let note = serde_json::to_value(KeyBinding::Note(60)).unwrap();
        let key = serde_json::to_value(KeyBinding::Key("q".into())).unwrap();
        assert_eq!(note, serde_json::json!(60));
        assert_eq!(key, serde_json::json!("q"));

        let back: KeyBinding = serde_json::from_value(serde_json::json!(36)).unwrap();
        assert_eq!(back, KeyBinding::Note(36));
        let back: KeyBinding = serde_json::from_value(serde_json::json!("a")).unwrap();
        assert_eq!(back, KeyBinding::Key("a".into()));
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(42), "F#2");
        assert_eq!(KeyBinding::Key("q".into()).to_string(), "Q");
    }

    #[test]
    fn fits_at_least_one_pad() {
        assert_eq!(rows_and_cols(0, 0), (1, 1));
        assert_eq!(rows_and_cols(80, 26), (4, 5));
    }
}
