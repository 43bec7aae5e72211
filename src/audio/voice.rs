use std::sync::Arc;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::voice_id::VoiceId;

// One pad's playback state on the audio thread. Stays around while paused so
// a one-shot can keep its position.
#[derive(Clone, Debug)]
pub struct Voice {
    pub id: VoiceId,
    buffer: Arc<SampleBuffer>,
    pub pos: usize,
    pub volume: f32,
    pub looping: bool,
    pub playing: bool,
}

impl Voice {
    pub fn new(id: VoiceId, buffer: Arc<SampleBuffer>, volume: f32) -> Self {
        Self {
            id,
            buffer,
            pos: 0,
            volume: volume.clamp(0.0, 1.0),
            looping: false,
            playing: false,
        }
    }

    pub fn play(&mut self, restart: bool, looping: bool, volume: f32) {
        if restart {
            self.pos = 0;
        }
        self.looping = looping;
        self.volume = volume.clamp(0.0, 1.0);
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn position_s(&self) -> f32 {
        if self.buffer.sample_rate == 0 {
            return 0.0;
        }
        self.pos as f32 / self.buffer.sample_rate as f32
    }

    pub fn duration_s(&self) -> f32 {
        self.buffer.duration_s()
    }

    // Mix this voice into `out`. Returns true when a non-looping voice just
    // ran off the end of its buffer.
    pub fn render_into(&mut self, out: &mut [StereoFrame]) -> bool {
        if !self.playing {
            return false;
        }
        let data = &self.buffer.data;
        if data.is_empty() {
            self.playing = false;
            return true;
        }

        for frame in out.iter_mut() {
            if self.pos >= data.len() {
                if self.looping {
                    self.pos = 0;
                } else {
                    // park at the start like a finished media element would on replay
                    self.playing = false;
                    self.pos = 0;
                    return true;
                }
            }
            let sample = data[self.pos];
            frame.left += sample.left * self.volume;
            frame.right += sample.right * self.volume;
            self.pos += 1;
        }

        if !self.looping && self.pos >= data.len() {
            self.playing = false;
            self.pos = 0;
            return true;
        }
        false
    }
}
