// The middle layer owns everything: the board, the input dispatcher, the store
// and the bits of ui state (selection, settings mode, prompt, status line).
// The tui sends it InputEvents and draws whatever display_state() returns;
// the audio thread only ever sees the AudioCommands coming out of here.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::audio_api::{AudioCommand, AudioEvent};
use crate::core::player_commands_to_audio;
use crate::input::{CaptureKind, CaptureOutcome, Captured, InputDispatcher, Trigger};
use crate::pipeline::board::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::pipeline::pad::{wheel_step, PALETTE};
use crate::pipeline::persistence::{self, KeyValueStore, AUTOSAVE_KEY};
use crate::pipeline::{Board, Mp3File, Pad, PlayerCommand, Playhead};
use crate::shared::{self, DisplayState, InputEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PromptKind {
    AssignFile { x: usize, y: usize },
    Export,
    Import,
}

#[derive(Clone, Debug)]
struct Prompt {
    kind: PromptKind,
    buffer: String,
}

impl Prompt {
    fn label(&self) -> String {
        match self.kind {
            PromptKind::AssignFile { x, y } => format!("audio file for pad {x},{y}"),
            PromptKind::Export => "save board as".to_string(),
            PromptKind::Import => "load board from".to_string(),
        }
    }
}

pub struct Middle {
    board: Board,
    dispatcher: InputDispatcher,
    store: Box<dyn KeyValueStore>,
    sample_rate: u32,
    master_volume: f32,
    selected: (usize, usize),
    settings: bool,
    prompt: Option<Prompt>,
    status: String,
    // what fits on screen, and the size forced on the command line if any
    screen: (usize, usize),
    fixed_size: Option<(usize, usize)>,
}

impl Middle {
    pub fn new(board: Board, store: Box<dyn KeyValueStore>, sample_rate: u32) -> Self {
        Self {
            board,
            dispatcher: InputDispatcher::new(Duration::from_secs(shared::DEFAULT_CAPTURE_TIMEOUT_SECS)),
            store,
            sample_rate,
            master_volume: 1.0,
            selected: (0, 0),
            settings: false,
            prompt: None,
            status: String::new(),
            screen: (DEFAULT_ROWS, DEFAULT_COLS),
            fixed_size: None,
        }
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher = InputDispatcher::new(timeout);
        self
    }

    // stop fitting empty boards to the terminal; clearing goes back to this size
    pub fn with_fixed_size(mut self, rows: usize, cols: usize) -> Self {
        self.fixed_size = Some((rows, cols));
        self
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> Vec<AudioCommand> {
        match event {
            InputEvent::Pad(trigger) => {
                let dispatched = self.dispatcher.dispatch(trigger, now);
                if let Some(outcome) = dispatched.capture {
                    self.apply_capture(outcome);
                }
                match dispatched.live {
                    Some(trigger) => self.live_trigger(trigger),
                    None => vec![],
                }
            }

            InputEvent::PadMouseDown { x, y } => {
                if self.settings {
                    self.select(x, y);
                    return vec![];
                }
                self.with_pad(x, y, Pad::push)
            }
            InputEvent::PadMouseUp { x, y } => {
                if self.settings {
                    return vec![];
                }
                self.with_pad(x, y, Pad::release)
            }
            InputEvent::PadWheel { x, y, delta_x, delta_y } => {
                let step = wheel_step(delta_x, delta_y);
                self.with_pad(x, y, |pad| pad.set_volume_increment(step))
            }
            InputEvent::Select { x, y } => {
                self.select(x, y);
                vec![]
            }
            InputEvent::MoveSelection { dx, dy } => {
                let (x, y) = self.selected;
                let x = (x as i64 + dx as i64).clamp(0, self.board.cols() as i64 - 1) as usize;
                let y = (y as i64 + dy as i64).clamp(0, self.board.rows() as i64 - 1) as usize;
                self.selected = (x, y);
                vec![]
            }

            InputEvent::ToggleSettings => {
                self.settings = !self.settings;
                if !self.settings {
                    self.prompt = None;
                    if let Some(outcome) = self.dispatcher.cancel_capture() {
                        self.apply_capture(outcome);
                    }
                }
                vec![]
            }
            InputEvent::SetPlayMode(mode) => {
                if self.edit_selected(|pad| pad.set_play_mode(mode)) {
                    self.status = format!("play mode: {}", mode.label());
                }
                vec![]
            }
            InputEvent::CycleColour => {
                self.edit_selected(|pad| {
                    let next = PALETTE
                        .iter()
                        .position(|c| c.eq_ignore_ascii_case(pad.colour()))
                        .map_or(0, |i| (i + 1) % PALETTE.len());
                    pad.set_colour(PALETTE[next]);
                });
                vec![]
            }
            InputEvent::AssignKey => {
                self.begin_capture(CaptureKind::Key, now);
                vec![]
            }
            InputEvent::AssignControl => {
                self.begin_capture(CaptureKind::Control, now);
                vec![]
            }
            InputEvent::AssignFile => {
                let (x, y) = self.selected;
                self.open_prompt(PromptKind::AssignFile { x, y }, String::new());
                vec![]
            }
            InputEvent::DeleteSound => self.delete_selected(),
            InputEvent::MasterVolume(step) => self.set_master_volume(self.master_volume + step),

            InputEvent::AddRow => {
                self.board.add_row();
                self.save();
                vec![]
            }
            InputEvent::AddColumn => {
                self.board.add_column();
                self.save();
                vec![]
            }
            InputEvent::Clear => self.clear(),
            InputEvent::SaveAs => {
                self.open_prompt(PromptKind::Export, format!("Untitled.{}", persistence::FILE_EXTENSION));
                vec![]
            }
            InputEvent::Load => {
                self.open_prompt(PromptKind::Import, String::new());
                vec![]
            }

            InputEvent::PromptChar(c) => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.push(c);
                }
                vec![]
            }
            InputEvent::PromptBackspace => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.pop();
                }
                vec![]
            }
            InputEvent::PromptSubmit => match self.prompt.take() {
                Some(prompt) => self.submit_prompt(prompt),
                None => vec![],
            },

            InputEvent::Paste(text) => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.push_str(text.trim_end_matches(['\r', '\n']));
                    return vec![];
                }
                let (x, y) = self.selected;
                self.assign_file(&clean_path(&text), x, y)
            }
            InputEvent::Resize { width, height } => {
                self.screen = shared::rows_and_cols(width, height);
                if self.fixed_size.is_none() && self.board.resize_if_empty(self.screen.0, self.screen.1) {
                    self.clamp_selection();
                }
                vec![]
            }
            InputEvent::Cancel => {
                if self.prompt.take().is_some() {
                    self.status.clear();
                } else if let Some(outcome) = self.dispatcher.cancel_capture() {
                    self.apply_capture(outcome);
                } else {
                    self.settings = false;
                }
                vec![]
            }
            // main saves and leaves before this gets here
            InputEvent::Quit => vec![],
        }
    }

    // one pass of the main loop. Engine events go first so an Ended left over
    // from before a retrigger can't stop the pad it just restarted.
    pub fn frame<E, I>(&mut self, engine: E, inputs: I, now: Instant) -> Vec<AudioCommand>
    where
        E: IntoIterator<Item = AudioEvent>,
        I: IntoIterator<Item = InputEvent>,
    {
        for event in engine {
            self.on_audio_event(event);
        }
        let mut out = vec![];
        for event in inputs {
            out.extend(self.handle_input(event, now));
        }
        self.tick(now);
        out
    }

    // stale captures and pad progress
    pub fn tick(&mut self, now: Instant) {
        if let Some(outcome) = self.dispatcher.poll_timeout(now) {
            self.apply_capture(outcome);
        }
        for pad in self.board.all_sounds_mut() {
            pad.poll_progress(now);
        }
    }

    pub fn on_audio_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Playhead { voice, position_s, duration_s } => {
                if let Some(pad) = self.board.find_by_voice_mut(voice) {
                    pad.on_playhead(Playhead { position_s, duration_s });
                }
            }
            AudioEvent::Ended { voice } => {
                if let Some(pad) = self.board.find_by_voice_mut(voice) {
                    pad.on_ended();
                }
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            rows: self.board.rows(),
            cols: self.board.cols(),
            pads: self.board.all_sounds().map(Pad::view).collect(),
            settings: self.settings,
            selected: self.selected,
            prompt: self.prompt.as_ref().map(|p| (p.label(), p.buffer.clone())),
            capturing: self.dispatcher.capturing(),
            status: self.status.clone(),
            master_volume: self.master_volume,
        }
    }

    // failures are logged and otherwise ignored
    pub fn save(&mut self) {
        if let Err(e) = persistence::save_autosave(self.store.as_ref(), &self.board) {
            log::warn!("autosave failed: {e:#}");
            self.status = "autosave failed, see the log".to_string();
        }
    }

    // Pads

    fn live_trigger(&mut self, trigger: Trigger) -> Vec<AudioCommand> {
        let rate = self.sample_rate;
        match trigger {
            Trigger::Down(key) => match self.board.get_by_key_mut(&key) {
                Some(pad) => {
                    let cmds = pad.push();
                    player_commands_to_audio(pad, cmds, rate)
                }
                None => vec![],
            },
            Trigger::Up(key) => match self.board.get_by_key_mut(&key) {
                Some(pad) => {
                    let cmds = pad.release();
                    player_commands_to_audio(pad, cmds, rate)
                }
                None => vec![],
            },
            Trigger::Control { controller, value } => match self.board.get_by_control_mut(controller) {
                Some(pad) => {
                    let cmds = pad.set_midi_volume(value);
                    player_commands_to_audio(pad, cmds, rate)
                }
                None => vec![],
            },
        }
    }

    // run a pad transition on the pad at (x, y), if there is one
    fn with_pad<F>(&mut self, x: usize, y: usize, f: F) -> Vec<AudioCommand>
    where
        F: FnOnce(&mut Pad) -> Vec<PlayerCommand>,
    {
        let rate = self.sample_rate;
        match self.board.get_sound_mut(x, y) {
            Ok(Some(pad)) => {
                let cmds = f(pad);
                player_commands_to_audio(pad, cmds, rate)
            }
            Ok(None) => vec![],
            Err(e) => {
                log::debug!("ignoring pad event: {e}");
                vec![]
            }
        }
    }

    // change a setting on the selected pad and autosave; false if the cell is empty
    fn edit_selected<F: FnOnce(&mut Pad)>(&mut self, f: F) -> bool {
        let (x, y) = self.selected;
        match self.board.get_sound_mut(x, y) {
            Ok(Some(pad)) => f(pad),
            _ => {
                self.status = "no sound on this pad".to_string();
                return false;
            }
        }
        self.save();
        true
    }

    fn select(&mut self, x: usize, y: usize) {
        if x < self.board.cols() && y < self.board.rows() {
            self.selected = (x, y);
        }
    }

    fn clamp_selection(&mut self) {
        let (x, y) = self.selected;
        self.selected = (x.min(self.board.cols() - 1), y.min(self.board.rows() - 1));
    }

    fn delete_selected(&mut self) -> Vec<AudioCommand> {
        let (x, y) = self.selected;
        let mut pad = match self.board.remove_sound(x, y) {
            Ok(Some(pad)) => pad,
            _ => return vec![],
        };
        let cmds = pad.destroy();
        let out = player_commands_to_audio(&mut pad, cmds, self.sample_rate);
        self.status = format!("removed pad {x},{y}");
        self.save();
        out
    }

    fn set_master_volume(&mut self, volume: f32) -> Vec<AudioCommand> {
        self.master_volume = volume.clamp(0.0, 1.0);
        let rate = self.sample_rate;
        let mut out = vec![];
        for pad in self.board.all_sounds_mut() {
            let cmds = pad.set_volume(self.master_volume);
            out.extend(player_commands_to_audio(pad, cmds, rate));
        }
        self.status = format!("volume {:.0}%", self.master_volume * 100.0);
        out
    }

    // creates the pad if the cell is empty
    fn assign_file(&mut self, path: &Path, x: usize, y: usize) -> Vec<AudioCommand> {
        let asset = match Mp3File::read(path) {
            Ok(asset) => asset,
            Err(e) => {
                log::warn!("can't read {}: {e}", path.display());
                self.status = format!("can't read {}", path.display());
                return vec![];
            }
        };
        let name = asset.name().to_string();

        let existing = match self.board.remove_sound(x, y) {
            Ok(existing) => existing,
            Err(e) => {
                self.status = e.to_string();
                return vec![];
            }
        };
        let mut pad = existing.unwrap_or_default();
        let mut cmds = pad.set_asset(asset);
        cmds.extend(pad.set_volume(self.master_volume));
        let out = player_commands_to_audio(&mut pad, cmds, self.sample_rate);

        if let Err(e) = self.board.place_sound(x, y, pad) {
            self.status = e.to_string();
            return out;
        }
        log::info!("loaded {name} onto pad {x},{y}");
        self.status = format!("loaded {name}");
        self.save();
        out
    }

    // Capture

    fn begin_capture(&mut self, kind: CaptureKind, now: Instant) {
        let (x, y) = self.selected;
        if !matches!(self.board.get_sound(x, y), Ok(Some(_))) {
            self.status = "no sound on this pad".to_string();
            return;
        }
        if let Some(replaced) = self.dispatcher.begin_capture(kind, (x, y), now) {
            log::debug!("capture for pad {:?} replaced", replaced.target);
        }
        self.status = match kind {
            CaptureKind::Key => "press a key or MIDI note...".to_string(),
            CaptureKind::Control => "move a MIDI control...".to_string(),
        };
    }

    fn apply_capture(&mut self, outcome: CaptureOutcome) {
        let (x, y) = outcome.target;
        let captured = match outcome.result {
            Ok(captured) => captured,
            Err(e) => {
                log::info!("capture for pad {x},{y} ended: {e}");
                self.status = e.to_string();
                return;
            }
        };
        let Ok(Some(pad)) = self.board.get_sound_mut(x, y) else {
            log::debug!("pad {x},{y} went away during capture");
            self.status.clear();
            return;
        };
        match captured {
            Captured::Key(key) => {
                self.status = format!("pad {x},{y} bound to {key}");
                pad.set_key(key);
            }
            Captured::Control(control) => {
                self.status = format!("pad {x},{y} bound to CC{control}");
                pad.set_control(control);
            }
        }
        self.save();
    }

    // Board

    fn fit_size(&self) -> (usize, usize) {
        self.fixed_size.unwrap_or(self.screen)
    }

    // destroy every pad on the current board
    fn release_all(&mut self) -> Vec<AudioCommand> {
        let rate = self.sample_rate;
        self.board
            .clear()
            .into_iter()
            .flat_map(|(mut pad, cmds)| player_commands_to_audio(&mut pad, cmds, rate))
            .collect()
    }

    fn clear(&mut self) -> Vec<AudioCommand> {
        if let Some(outcome) = self.dispatcher.cancel_capture() {
            log::debug!("capture for pad {:?} dropped by clear", outcome.target);
        }
        let out = self.release_all();
        let (rows, cols) = self.fit_size();
        self.board = Board::with_size(rows, cols);
        self.selected = (0, 0);
        self.prompt = None;
        if let Err(e) = self.store.remove_item(AUTOSAVE_KEY) {
            log::warn!("could not remove autosave: {e:#}");
        }
        self.status = "board cleared".to_string();
        out
    }

    fn open_prompt(&mut self, kind: PromptKind, initial: String) {
        self.prompt = Some(Prompt { kind, buffer: initial });
    }

    fn submit_prompt(&mut self, prompt: Prompt) -> Vec<AudioCommand> {
        let path = clean_path(&prompt.buffer);
        if path.as_os_str().is_empty() {
            self.status.clear();
            return vec![];
        }
        match prompt.kind {
            PromptKind::AssignFile { x, y } => self.assign_file(&path, x, y),
            PromptKind::Export => {
                match persistence::export_board(&path, &self.board) {
                    Ok(written) => {
                        log::info!("exported board to {}", written.display());
                        self.status = format!("saved {}", written.display());
                    }
                    Err(e) => {
                        log::warn!("export failed: {e:#}");
                        self.status = format!("{e}");
                    }
                }
                vec![]
            }
            PromptKind::Import => self.import(&path),
        }
    }

    // the old board is only torn down once the new one has loaded; a bad file
    // just lands in the status line
    pub fn import(&mut self, path: &Path) -> Vec<AudioCommand> {
        let board = match persistence::import_board(path) {
            Ok(board) => board,
            Err(e) => {
                log::warn!("import of {} failed: {e:#}", path.display());
                self.status = format!("{e}");
                return vec![];
            }
        };
        if let Some(outcome) = self.dispatcher.cancel_capture() {
            log::debug!("capture for pad {:?} dropped by load", outcome.target);
        }
        let out = self.release_all();
        self.board = board;
        self.settings = false;
        self.clamp_selection();
        log::info!("loaded board from {} ({} pads)", path.display(), self.board.len());
        self.status = format!("loaded {}", path.display());
        self.save();
        out
    }
}

// pasted paths can come quoted or as file:// urls
fn clean_path(text: &str) -> PathBuf {
    let text = text.trim();
    let text = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(text);
    let text = text.strip_prefix("file://").unwrap_or(text);
    PathBuf::from(text)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;
    use crate::errors::CaptureError;
    use crate::pipeline::persistence::MemoryStore;
    use crate::pipeline::PlayMode;
    use crate::shared::KeyBinding;

    const RATE: u32 = 8000;

    fn wav_bytes() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..800 {
                w.write_sample((i % 100) as i16 * 100).unwrap();
            }
            w.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn setup() -> (Middle, Arc<MemoryStore>, tempfile::TempDir) {
        let store = Arc::new(MemoryStore::default());
        let middle = Middle::new(Board::with_size(2, 2), Box::new(store.clone()), RATE);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kick.wav"), wav_bytes()).unwrap();
        (middle, store, dir)
    }

    fn load_kick(middle: &mut Middle, dir: &tempfile::TempDir, x: usize, y: usize) {
        middle.handle_input(InputEvent::Select { x, y }, Instant::now());
        let path = dir.path().join("kick.wav");
        middle.handle_input(InputEvent::Paste(path.display().to_string()), Instant::now());
    }

    fn key(k: &str) -> InputEvent {
        InputEvent::Pad(Trigger::Down(KeyBinding::Key(k.into())))
    }

    fn key_up(k: &str) -> InputEvent {
        InputEvent::Pad(Trigger::Up(KeyBinding::Key(k.into())))
    }

    #[test]
    fn pasting_a_path_creates_a_pad_and_autosaves() {
        let (mut middle, store, dir) = setup();
        load_kick(&mut middle, &dir, 1, 0);

        let ds = middle.display_state();
        let pad = ds.pad_at(1, 0).unwrap();
        assert_eq!(pad.name, "kick.wav");
        assert!(ds.status.contains("kick.wav"));

        let saved = store.get_item(AUTOSAVE_KEY).unwrap().unwrap();
        assert_eq!(saved["sounds"][0]["x"], 1);
        assert_eq!(saved["version"], "1.0");
    }

    #[test]
    fn missing_file_only_sets_the_status() {
        let (mut middle, store, _dir) = setup();
        middle.handle_input(InputEvent::Paste("/no/such/file.mp3".into()), Instant::now());
        assert!(middle.display_state().pads.is_empty());
        assert!(middle.display_state().status.starts_with("can't read"));
        assert!(store.get_item(AUTOSAVE_KEY).unwrap().is_none());
    }

    #[test]
    fn mouse_pushes_outside_settings_and_selects_inside() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let now = Instant::now();

        let cmds = middle.handle_input(InputEvent::PadMouseDown { x: 0, y: 0 }, now);
        assert!(matches!(cmds[0], AudioCommand::Register { .. }));
        assert!(matches!(cmds.last(), Some(AudioCommand::Play { restart: true, .. })));
        assert!(middle.display_state().pad_at(0, 0).unwrap().playing);

        middle.handle_input(InputEvent::ToggleSettings, now);
        let cmds = middle.handle_input(InputEvent::PadMouseDown { x: 1, y: 1 }, now);
        assert!(cmds.is_empty());
        assert_eq!(middle.display_state().selected, (1, 1));
    }

    #[test]
    fn key_capture_binds_and_then_triggers() {
        let (mut middle, store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 1);
        let now = Instant::now();

        middle.handle_input(InputEvent::AssignKey, now);
        assert_eq!(middle.display_state().capturing, Some(CaptureKind::Key));

        // swallowed by the capture, nothing plays
        assert!(middle.handle_input(key("j"), now).is_empty());
        assert!(middle.handle_input(key_up("j"), now).is_empty());
        let ds = middle.display_state();
        assert_eq!(ds.capturing, None);
        assert_eq!(ds.pad_at(0, 1).unwrap().label, "J");

        let saved = store.get_item(AUTOSAVE_KEY).unwrap().unwrap();
        assert_eq!(saved["sounds"][0]["key"], "j");

        let cmds = middle.handle_input(key("j"), now);
        assert!(!cmds.is_empty());
        assert!(middle.display_state().pad_at(0, 1).unwrap().playing);
    }

    // pad (0,0) on key q and CC7 at half volume, kick also on (1,0) and selected
    fn two_pads_with_bindings(middle: &mut Middle, dir: &tempfile::TempDir) {
        let now = Instant::now();
        load_kick(middle, dir, 1, 0);
        load_kick(middle, dir, 0, 0);
        middle.handle_input(InputEvent::MasterVolume(-0.5), now);
        middle.handle_input(InputEvent::AssignKey, now);
        middle.handle_input(key("q"), now);
        middle.handle_input(key_up("q"), now);
        middle.handle_input(InputEvent::AssignControl, now);
        middle.handle_input(InputEvent::Pad(Trigger::Control { controller: 7, value: 127 }), now);
        let pad = middle.display_state().pad_at(0, 0).cloned().unwrap();
        assert_eq!((pad.label.as_str(), pad.volume), ("Q · CC7", 0.5));
        middle.handle_input(InputEvent::Select { x: 1, y: 0 }, now);
    }

    #[test]
    fn controllers_stay_live_during_a_key_capture() {
        let (mut middle, _store, dir) = setup();
        two_pads_with_bindings(&mut middle, &dir);
        let now = Instant::now();

        middle.handle_input(InputEvent::AssignKey, now);
        middle.handle_input(InputEvent::Pad(Trigger::Control { controller: 7, value: 127 }), now);
        let ds = middle.display_state();
        assert!(ds.pad_at(0, 0).unwrap().volume > 0.5);
        assert_eq!(ds.capturing, Some(CaptureKind::Key));
    }

    #[test]
    fn keys_stay_live_during_a_control_capture() {
        let (mut middle, _store, dir) = setup();
        two_pads_with_bindings(&mut middle, &dir);
        let now = Instant::now();

        middle.handle_input(InputEvent::AssignControl, now);
        let cmds = middle.handle_input(key("q"), now);
        assert!(!cmds.is_empty());
        let ds = middle.display_state();
        assert!(ds.pad_at(0, 0).unwrap().playing);
        assert_eq!(ds.capturing, Some(CaptureKind::Control));
    }

    #[test]
    fn capture_times_out_on_tick() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let start = Instant::now();
        middle.handle_input(InputEvent::AssignControl, start);
        middle.tick(start + Duration::from_secs(1));
        assert_eq!(middle.display_state().capturing, Some(CaptureKind::Control));

        middle.tick(start + Duration::from_secs(5));
        let ds = middle.display_state();
        assert_eq!(ds.capturing, None);
        assert_eq!(ds.status, CaptureError::TimedOut(Duration::from_secs(5)).to_string());
        assert_eq!(ds.pad_at(0, 0).unwrap().label, "");
    }

    #[test]
    fn capture_on_an_empty_pad_is_refused() {
        let (mut middle, _store, _dir) = setup();
        middle.handle_input(InputEvent::AssignKey, Instant::now());
        assert_eq!(middle.display_state().capturing, None);
    }

    #[test]
    fn control_change_moves_the_bound_pad_volume() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let now = Instant::now();
        middle.handle_input(InputEvent::MasterVolume(-0.5), now);
        middle.handle_input(InputEvent::AssignControl, now);
        middle.handle_input(InputEvent::Pad(Trigger::Control { controller: 7, value: 3 }), now);
        assert_eq!(middle.display_state().pad_at(0, 0).unwrap().label, "CC7");

        middle.handle_input(InputEvent::Pad(Trigger::Control { controller: 7, value: 64 }), now);
        assert_eq!(middle.display_state().pad_at(0, 0).unwrap().volume, 0.5);
        middle.handle_input(InputEvent::Pad(Trigger::Control { controller: 7, value: 74 }), now);
        assert!((middle.display_state().pad_at(0, 0).unwrap().volume - 0.6).abs() < 1e-5);
    }

    #[test]
    fn gate_pad_follows_key_down_and_up() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let now = Instant::now();
        middle.handle_input(InputEvent::SetPlayMode(PlayMode::Gate), now);
        middle.handle_input(InputEvent::AssignKey, now);
        middle.handle_input(key("g"), now);
        middle.handle_input(key_up("g"), now);

        let cmds = middle.handle_input(key("g"), now);
        assert!(matches!(cmds.last(), Some(AudioCommand::Play { looping: true, .. })));
        let cmds = middle.handle_input(key_up("g"), now);
        assert!(matches!(cmds[..], [AudioCommand::Pause { .. }]));
        assert!(!middle.display_state().pad_at(0, 0).unwrap().playing);
    }

    #[test]
    fn engine_events_reach_the_pad() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let now = Instant::now();
        let cmds = middle.handle_input(InputEvent::PadMouseDown { x: 0, y: 0 }, now);
        let voice = match cmds[0] {
            AudioCommand::Register { voice, .. } => voice,
            ref other => panic!("expected register, got {other:?}"),
        };

        middle.on_audio_event(AudioEvent::Playhead { voice, position_s: 0.25, duration_s: 1.0 });
        middle.tick(now);
        assert_eq!(middle.display_state().pad_at(0, 0).unwrap().progress, 0.25);

        middle.on_audio_event(AudioEvent::Ended { voice });
        assert!(!middle.display_state().pad_at(0, 0).unwrap().playing);
    }

    #[test]
    fn frame_applies_engine_events_before_input() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let now = Instant::now();
        middle.handle_input(InputEvent::SetPlayMode(PlayMode::OneShot), now);
        let cmds = middle.handle_input(InputEvent::PadMouseDown { x: 0, y: 0 }, now);
        let voice = match cmds[0] {
            AudioCommand::Register { voice, .. } => voice,
            ref other => panic!("expected register, got {other:?}"),
        };

        // the sample ran out just as the pad was hit again
        let cmds = middle.frame(
            [AudioEvent::Ended { voice }],
            [InputEvent::PadMouseDown { x: 0, y: 0 }],
            now,
        );
        assert!(matches!(cmds.last(), Some(AudioCommand::Play { restart: true, .. })));
        assert!(middle.display_state().pad_at(0, 0).unwrap().playing);
    }

    #[test]
    fn delete_releases_the_voice() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 1, 1);
        let now = Instant::now();
        middle.handle_input(InputEvent::PadMouseDown { x: 1, y: 1 }, now);
        let cmds = middle.handle_input(InputEvent::DeleteSound, now);
        assert!(matches!(cmds[..], [AudioCommand::Pause { .. }, AudioCommand::Unload { .. }]));
        assert!(middle.display_state().pads.is_empty());
    }

    #[test]
    fn clear_drops_the_autosave_and_refits() {
        let (mut middle, store, dir) = setup();
        middle.handle_input(InputEvent::Resize { width: 80, height: 26 }, Instant::now());
        load_kick(&mut middle, &dir, 0, 0);
        assert!(store.get_item(AUTOSAVE_KEY).unwrap().is_some());

        middle.handle_input(InputEvent::Clear, Instant::now());
        let ds = middle.display_state();
        assert!(ds.pads.is_empty());
        assert_eq!((ds.rows, ds.cols), (4, 5));
        assert!(store.get_item(AUTOSAVE_KEY).unwrap().is_none());
    }

    #[test]
    fn rows_and_columns_are_saved() {
        let (mut middle, store, dir) = setup();
        load_kick(&mut middle, &dir, 1, 1);
        middle.handle_input(InputEvent::AddRow, Instant::now());
        middle.handle_input(InputEvent::AddColumn, Instant::now());
        let saved = store.get_item(AUTOSAVE_KEY).unwrap().unwrap();
        assert_eq!(saved["rows"], 3);
        assert_eq!(saved["cols"], 3);
        assert_eq!(saved["sounds"][0]["x"], 1);
    }

    #[test]
    fn resize_only_touches_an_empty_board() {
        let (mut middle, _store, dir) = setup();
        middle.handle_input(InputEvent::Resize { width: 80, height: 26 }, Instant::now());
        assert_eq!(middle.display_state().cols, 5);

        load_kick(&mut middle, &dir, 4, 3);
        middle.handle_input(InputEvent::Resize { width: 20, height: 10 }, Instant::now());
        let ds = middle.display_state();
        assert_eq!((ds.rows, ds.cols), (4, 5));
    }

    #[test]
    fn export_then_import_through_the_prompt() {
        let (mut middle, store, dir) = setup();
        load_kick(&mut middle, &dir, 1, 0);
        middle.handle_input(InputEvent::CycleColour, Instant::now());
        let colour = middle.display_state().pad_at(1, 0).unwrap().colour.clone();

        let target = dir.path().join("set");
        middle.handle_input(InputEvent::SaveAs, Instant::now());
        // the prompt starts with a suggested name; replace it
        for _ in 0.."Untitled.soundboard".len() {
            middle.handle_input(InputEvent::PromptBackspace, Instant::now());
        }
        middle.handle_input(InputEvent::Paste(target.display().to_string()), Instant::now());
        middle.handle_input(InputEvent::PromptSubmit, Instant::now());
        let written = dir.path().join("set.soundboard");
        assert!(written.exists());

        middle.handle_input(InputEvent::Clear, Instant::now());
        assert!(middle.display_state().pads.is_empty());

        middle.handle_input(InputEvent::Load, Instant::now());
        middle.handle_input(InputEvent::Paste(written.display().to_string()), Instant::now());
        middle.handle_input(InputEvent::PromptSubmit, Instant::now());
        let ds = middle.display_state();
        assert_eq!(ds.pad_at(1, 0).unwrap().colour, colour);
        assert!(store.get_item(AUTOSAVE_KEY).unwrap().is_some());
    }

    #[test]
    fn bad_import_keeps_the_current_board() {
        let (mut middle, _store, dir) = setup();
        load_kick(&mut middle, &dir, 0, 0);
        let bad = dir.path().join("old.soundboard");
        std::fs::write(&bad, r#"{"version":"0.9","rows":1,"cols":1,"sounds":[]}"#).unwrap();

        middle.handle_input(InputEvent::Load, Instant::now());
        middle.handle_input(InputEvent::Paste(bad.display().to_string()), Instant::now());
        let cmds = middle.handle_input(InputEvent::PromptSubmit, Instant::now());
        assert!(cmds.is_empty());
        let ds = middle.display_state();
        assert_eq!(ds.pads.len(), 1);
        assert!(ds.status.contains("can't read this file"));
    }

    #[test]
    fn startup_import_of_a_huge_board_falls_back() {
        let (mut middle, store, dir) = setup();
        load_kick(&mut middle, &dir, 1, 1);
        let huge = dir.path().join("huge.soundboard");
        std::fs::write(&huge, r#"{"version":"1.0","rows":100000,"cols":100000,"sounds":[]}"#).unwrap();

        assert!(middle.import(&huge).is_empty());
        let ds = middle.display_state();
        assert_eq!((ds.rows, ds.cols, ds.pads.len()), (2, 2, 1));
        assert!(ds.status.contains("can't read this file"));
        let saved = store.get_item(AUTOSAVE_KEY).unwrap().unwrap();
        assert_eq!(saved["rows"], 2);
    }

    #[test]
    fn cancel_closes_the_prompt_first() {
        let (mut middle, _store, _dir) = setup();
        middle.handle_input(InputEvent::ToggleSettings, Instant::now());
        middle.handle_input(InputEvent::AssignFile, Instant::now());
        middle.handle_input(InputEvent::PromptChar('x'), Instant::now());
        assert_eq!(middle.display_state().prompt.unwrap().1, "x");

        middle.handle_input(InputEvent::Cancel, Instant::now());
        let ds = middle.display_state();
        assert!(ds.prompt.is_none());
        assert!(ds.settings);
        middle.handle_input(InputEvent::Cancel, Instant::now());
        assert!(!middle.display_state().settings);
    }

    #[test]
    fn selection_stays_on_the_board() {
        let (mut middle, _store, _dir) = setup();
        middle.handle_input(InputEvent::MoveSelection { dx: 5, dy: -3 }, Instant::now());
        assert_eq!(middle.display_state().selected, (1, 0));
        middle.handle_input(InputEvent::Select { x: 9, y: 9 }, Instant::now());
        assert_eq!(middle.display_state().selected, (1, 0));
    }

    #[test]
    fn pasted_paths_are_unquoted() {
        assert_eq!(clean_path("  '/tmp/a b.mp3'\n"), PathBuf::from("/tmp/a b.mp3"));
        assert_eq!(clean_path("\"/tmp/x.wav\""), PathBuf::from("/tmp/x.wav"));
        assert_eq!(clean_path("file:///tmp/y.wav"), PathBuf::from("/tmp/y.wav"));
    }
}
