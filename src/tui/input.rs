use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use super::grid;
use super::mode::TuiState;
use crate::input::Trigger;
use crate::pipeline::PlayMode;
use crate::shared::{InputEvent, KeyBinding};

const MASTER_VOLUME_STEP: f32 = 0.05;
// wheel deltas above 100 count as a big step
const SMALL_WHEEL: f32 = 1.0;
const BIG_WHEEL: f32 = 120.0;

// poll for input from the terminal and resolve it into input events for the
// middle layer, using tuistate to know which mode we're in
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    let events = match event::read()? {
        Event::Key(key) => handle_key(key, ts),
        Event::Mouse(mouse) => handle_mouse(mouse, ts),
        Event::Paste(text) => vec![InputEvent::Paste(text)],
        Event::Resize(width, height) => vec![InputEvent::Resize { width, height }],
        _ => vec![],
    };
    Ok(events)
}

fn handle_key(key: KeyEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    let pressed = key.kind == KeyEventKind::Press;

    // typing into the prompt, repeats welcome
    if ts.prompt_open {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        return match key.code {
            KeyCode::Esc => vec![InputEvent::Cancel],
            KeyCode::Enter => vec![InputEvent::PromptSubmit],
            KeyCode::Backspace => vec![InputEvent::PromptBackspace],
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![InputEvent::PromptChar(c)]
            }
            _ => vec![],
        };
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if !pressed {
            return vec![];
        }
        return match key.code {
            KeyCode::Char('c' | 'q') => vec![InputEvent::Quit],
            KeyCode::Char('r') => vec![InputEvent::AddRow],
            KeyCode::Char('l') => vec![InputEvent::AddColumn],
            KeyCode::Char('s') => vec![InputEvent::SaveAs],
            KeyCode::Char('o') => vec![InputEvent::Load],
            KeyCode::Char('x') => vec![InputEvent::Clear],
            _ => vec![],
        };
    }

    if key.code == KeyCode::Esc {
        if !pressed {
            return vec![];
        }
        if ts.capturing || ts.settings {
            return vec![InputEvent::Cancel];
        }
        return vec![InputEvent::Quit];
    }

    // while capturing, every other key belongs to the capture
    if !ts.capturing {
        let command = match key.code {
            KeyCode::Tab => Some(InputEvent::ToggleSettings),
            code if ts.settings => settings_key(code),
            _ => None,
        };
        if let Some(event) = command {
            // a command key's release and repeats never reach the pads
            return if pressed { vec![event] } else { vec![] };
        }
    }

    pad_key(key, ts)
}

// keys with a meaning in settings mode; anything else still plays pads
fn settings_key(code: KeyCode) -> Option<InputEvent> {
    let event = match code {
        KeyCode::Left => InputEvent::MoveSelection { dx: -1, dy: 0 },
        KeyCode::Right => InputEvent::MoveSelection { dx: 1, dy: 0 },
        KeyCode::Up => InputEvent::MoveSelection { dx: 0, dy: -1 },
        KeyCode::Down => InputEvent::MoveSelection { dx: 0, dy: 1 },
        KeyCode::Char('r') => InputEvent::SetPlayMode(PlayMode::Retrigger),
        KeyCode::Char('o') => InputEvent::SetPlayMode(PlayMode::OneShot),
        KeyCode::Char('g') => InputEvent::SetPlayMode(PlayMode::Gate),
        KeyCode::Char('c') => InputEvent::CycleColour,
        KeyCode::Char('k') => InputEvent::AssignKey,
        KeyCode::Char('m') => InputEvent::AssignControl,
        KeyCode::Char('a') => InputEvent::AssignFile,
        KeyCode::Char('d') | KeyCode::Delete => InputEvent::DeleteSound,
        KeyCode::Char('+' | '=') => InputEvent::MasterVolume(MASTER_VOLUME_STEP),
        KeyCode::Char('-') => InputEvent::MasterVolume(-MASTER_VOLUME_STEP),
        _ => return None,
    };
    Some(event)
}

// key down / key up for a pad binding. Without real releases from the
// terminal a press is sent as down+up straight away
fn pad_key(key: KeyEvent, ts: &TuiState) -> Vec<InputEvent> {
    let Some(id) = key_identifier(key.code) else {
        return vec![];
    };
    let binding = KeyBinding::Key(id);
    match key.kind {
        KeyEventKind::Press if ts.key_releases => vec![InputEvent::Pad(Trigger::Down(binding))],
        KeyEventKind::Press => vec![
            InputEvent::Pad(Trigger::Down(binding.clone())),
            InputEvent::Pad(Trigger::Up(binding)),
        ],
        KeyEventKind::Release => vec![InputEvent::Pad(Trigger::Up(binding))],
        KeyEventKind::Repeat => vec![],
    }
}

// stable name for a physical key: lower-cased character, or the key's name
pub fn key_identifier(code: KeyCode) -> Option<String> {
    let id = match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_lowercase().collect(),
        KeyCode::F(n) => format!("f{n}"),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Delete => "delete".to_string(),
        _ => return None,
    };
    Some(id)
}

fn handle_mouse(mouse: MouseEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    let hit = grid::hit_test(ts.grid_area, ts.rows, ts.cols, mouse.column, mouse.row);
    let big = mouse.modifiers.contains(KeyModifiers::SHIFT);
    let wheel = if big { BIG_WHEEL } else { SMALL_WHEEL };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match hit {
            Some((x, y)) => {
                ts.mouse_pad = Some((x, y));
                vec![InputEvent::PadMouseDown { x, y }]
            }
            None => vec![],
        },
        MouseEventKind::Up(MouseButton::Left) => match ts.mouse_pad.take() {
            Some((x, y)) => vec![InputEvent::PadMouseUp { x, y }],
            None => vec![],
        },
        MouseEventKind::ScrollUp => wheel_event(hit, 0.0, -wheel),
        MouseEventKind::ScrollDown => wheel_event(hit, 0.0, wheel),
        MouseEventKind::ScrollRight => wheel_event(hit, wheel, 0.0),
        MouseEventKind::ScrollLeft => wheel_event(hit, -wheel, 0.0),
        _ => vec![],
    }
}

fn wheel_event(hit: Option<(usize, usize)>, delta_x: f32, delta_y: f32) -> Vec<InputEvent> {
    match hit {
        Some((x, y)) => vec![InputEvent::PadWheel { x, y, delta_x, delta_y }],
        None => vec![],
    }
}
