use std::sync::Arc;

pub use crate::audio::{SampleBuffer, VoiceId};

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't decode assets (that would stall the audio thread), so
    // the middle layer decodes first (see loader/sample_loader.rs) and then
    // registers the finished buffer under the pad's voice id.
    Register { voice: VoiceId, buffer: Arc<SampleBuffer>, volume: f32 },

    // restart = jump back to frame 0 before playing
    Play { voice: VoiceId, restart: bool, looping: bool, volume: f32 },

    // keeps the position
    Pause { voice: VoiceId },

    SetVolume { voice: VoiceId, volume: f32 },

    // drops the voice and its buffer
    Unload { voice: VoiceId },
}

// What the engine reports back to the ui thread
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioEvent {
    // best-effort, low rate, only while the voice is playing
    Playhead { voice: VoiceId, position_s: f32, duration_s: f32 },

    // a non-looping voice ran off the end of its buffer
    Ended { voice: VoiceId },
}
