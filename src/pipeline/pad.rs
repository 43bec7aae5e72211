use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use super::mp3_file::Mp3File;
use super::play_mode::PlayMode;
use super::progress::{Playhead, ProgressTask};
use crate::audio::{next_voice_id, VoiceId};
use crate::shared::{KeyBinding, PadView};

pub const PALETTE: [&str; 7] = [
    "#26748E", "#D35528", "#934873", "#00B9AE", "#F9C80E", "#48BA66", "#FF9C4C",
];

pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(16);

const BIG_WHEEL_DELTA: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Idle,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerCommand {
    // decode and register with the engine, first use only
    Materialize,
    Play { restart: bool, looping: bool },
    Pause,
    Volume(f32),
    Release,
}

#[derive(Debug)]
pub struct Pad {
    voice: VoiceId,
    asset: Option<Mp3File>,
    colour: String,
    play_mode: PlayMode,
    key: Option<KeyBinding>,
    control: Option<u8>,
    volume: f32,
    // stamped by the board on placement
    pub(crate) x: usize,
    pub(crate) y: usize,

    transport: Transport,
    materialized: bool,
    alive: bool,
    playhead: Option<Playhead>,
    progress: ProgressTask,
    progress_fraction: f32,
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

impl Pad {
    pub fn new() -> Self {
        let colour = PALETTE
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PALETTE[0]);
        Self::with_colour(colour)
    }

    pub fn with_colour(colour: impl Into<String>) -> Self {
        Self {
            voice: next_voice_id(),
            asset: None,
            colour: colour.into(),
            play_mode: PlayMode::Retrigger,
            key: None,
            control: None,
            volume: 1.0,
            x: 0,
            y: 0,
            transport: Transport::Idle,
            materialized: false,
            alive: true,
            playhead: None,
            progress: ProgressTask::new(PROGRESS_INTERVAL),
            progress_fraction: 0.0,
        }
    }

    // Getters

    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    pub fn asset(&self) -> Option<&Mp3File> {
        self.asset.as_ref()
    }

    pub fn colour(&self) -> &str {
        &self.colour
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn key(&self) -> Option<&KeyBinding> {
        self.key.as_ref()
    }

    pub fn control(&self) -> Option<u8> {
        self.control
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn progress(&self) -> f32 {
        self.progress_fraction
    }

    // Setters

    // stops playback; the next push decodes the new asset
    pub fn set_asset(&mut self, asset: Mp3File) -> Vec<PlayerCommand> {
        if !self.alive {
            return vec![];
        }
        let mut cmds = vec![];
        if self.materialized && self.is_playing() {
            cmds.push(PlayerCommand::Pause);
        }
        self.asset = Some(asset);
        self.materialized = false;
        self.enter_idle();
        self.playhead = None;
        cmds
    }

    pub fn set_colour(&mut self, colour: impl Into<String>) {
        let colour = colour.into();
        if !colour.is_empty() {
            self.colour = colour;
        }
    }

    pub fn set_key(&mut self, key: KeyBinding) {
        self.key = Some(key);
    }

    pub fn set_control(&mut self, control: u8) {
        self.control = Some(control);
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    // Volume

    pub fn set_volume(&mut self, volume: f32) -> Vec<PlayerCommand> {
        if !self.alive {
            return vec![];
        }
        let volume = if volume.is_nan() { self.volume } else { volume };
        self.volume = volume.clamp(0.0, 1.0);
        if self.materialized {
            vec![PlayerCommand::Volume(self.volume)]
        } else {
            vec![] // picked up when the player is materialized
        }
    }

    pub fn set_volume_increment(&mut self, delta: f32) -> Vec<PlayerCommand> {
        self.set_volume(self.volume + delta)
    }

    // controller centred on 64, exactly 64 is a no-op
    pub fn set_midi_volume(&mut self, value: u8) -> Vec<PlayerCommand> {
        if value == 64 {
            return vec![];
        }
        self.set_volume_increment((value as f32 - 64.0) / 100.0)
    }

    // Playback

    pub fn push(&mut self) -> Vec<PlayerCommand> {
        if !self.alive {
            log::debug!("push on a destroyed pad ignored");
            return vec![];
        }
        if self.asset.is_none() {
            return vec![];
        }

        let mut cmds = vec![];
        if !self.materialized {
            self.materialized = true;
            cmds.push(PlayerCommand::Materialize);
        }

        match (self.play_mode, self.transport) {
            (PlayMode::Retrigger, _) => {
                cmds.push(PlayerCommand::Play { restart: true, looping: false });
                self.enter_playing();
            }
            (PlayMode::OneShot, Transport::Idle) => {
                cmds.push(PlayerCommand::Play { restart: true, looping: false });
                self.enter_playing();
            }
            (PlayMode::OneShot, Transport::Playing) => {
                cmds.push(PlayerCommand::Pause);
                self.enter_idle();
            }
            (PlayMode::Gate, Transport::Idle) => {
                cmds.push(PlayerCommand::Play { restart: true, looping: true });
                self.enter_playing();
            }
            (PlayMode::Gate, Transport::Playing) => {
                // every push starts from the top, held or not
                cmds.push(PlayerCommand::Play { restart: true, looping: true });
            }
        }
        cmds
    }

    pub fn release(&mut self) -> Vec<PlayerCommand> {
        if !self.alive {
            return vec![];
        }
        match (self.play_mode, self.transport) {
            (PlayMode::Gate, Transport::Playing) => {
                self.enter_idle();
                vec![PlayerCommand::Pause]
            }
            _ => vec![],
        }
    }

    pub fn destroy(&mut self) -> Vec<PlayerCommand> {
        if !self.alive {
            return vec![];
        }
        let mut cmds = vec![];
        if self.materialized {
            cmds.push(PlayerCommand::Pause);
            cmds.push(PlayerCommand::Release);
        }
        self.enter_idle();
        self.progress.cancel();
        self.alive = false;
        self.materialized = false;
        cmds
    }

    // Engine feedback

    pub fn on_load_failed(&mut self) {
        self.materialized = false;
        self.enter_idle();
    }

    pub fn on_ended(&mut self) {
        if self.alive && self.play_mode != PlayMode::Gate {
            self.enter_idle();
        }
    }

    pub fn on_playhead(&mut self, playhead: Playhead) {
        if self.alive {
            self.playhead = Some(playhead);
        }
    }

    pub fn poll_progress(&mut self, now: Instant) -> Option<f32> {
        let reported = self
            .progress
            .poll(now, self.alive, self.is_playing(), self.playhead)?;
        self.progress_fraction = reported;
        Some(reported)
    }

    fn enter_playing(&mut self) {
        self.transport = Transport::Playing;
        self.playhead = None;
        self.progress_fraction = 0.0;
    }

    fn enter_idle(&mut self) {
        self.transport = Transport::Idle;
    }

    pub fn label(&self) -> String {
        match (&self.key, self.control) {
            (Some(k), Some(c)) => format!("{k} · CC{c}"),
            (Some(k), None) => k.to_string(),
            (None, Some(c)) => format!("CC{c}"),
            (None, None) => String::new(),
        }
    }

    pub fn view(&self) -> PadView {
        PadView {
            x: self.x,
            y: self.y,
            colour: self.colour.clone(),
            label: self.label(),
            name: self.asset.as_ref().map(|a| a.name().to_string()).unwrap_or_default(),
            mode: self.play_mode,
            playing: self.is_playing(),
            progress: self.progress_fraction,
            volume: self.volume,
        }
    }
}

// horizontal scroll wins; right or up turns it up
pub fn wheel_step(delta_x: f32, delta_y: f32) -> f32 {
    let step = |d: f32| if d.abs() > BIG_WHEEL_DELTA { 0.1 } else { 0.01 };
    if delta_x != 0.0 {
        if delta_x > 0.0 { step(delta_x) } else { -step(delta_x) }
    } else if delta_y != 0.0 {
        if delta_y > 0.0 { -step(delta_y) } else { step(delta_y) }
    } else {
        0.0
    }
}
