use crossbeam_channel::Sender;

use super::frame::StereoFrame;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, AudioEvent};

const RESERVED_VOICES: usize = 64; // one per pad; only Register ever grows past this
const PLAYHEAD_RATE_HZ: u32 = 30;

pub struct Engine {
    voices: Vec<Voice>,
    events_tx: Option<Sender<AudioEvent>>,
    report_every: usize, // frames between playhead reports
    since_report: usize,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            voices: Vec::with_capacity(RESERVED_VOICES),
            events_tx: None,
            report_every: (sample_rate / PLAYHEAD_RATE_HZ).max(1) as usize,
            since_report: 0,
        }
    }

    pub fn set_events_tx(&mut self, tx: Sender<AudioEvent>) {
        self.events_tx = Some(tx);
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Register { voice, buffer, volume } => {
                if let Some(v) = self.voice_mut(voice.0) {
                    *v = Voice::new(voice, buffer, volume);
                } else {
                    self.voices.push(Voice::new(voice, buffer, volume));
                }
            }
            AudioCommand::Play { voice, restart, looping, volume } => {
                if let Some(v) = self.voice_mut(voice.0) {
                    v.play(restart, looping, volume);
                }
            }
            AudioCommand::Pause { voice } => {
                if let Some(v) = self.voice_mut(voice.0) {
                    v.pause();
                }
            }
            AudioCommand::SetVolume { voice, volume } => {
                if let Some(v) = self.voice_mut(voice.0) {
                    v.volume = volume.clamp(0.0, 1.0);
                }
            }
            AudioCommand::Unload { voice } => {
                self.voices.retain(|v| v.id != voice);
            }
        }
    }

    fn voice_mut(&mut self, id: u64) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id.0 == id)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.playing).count()
    }

    // Fill `frames` with the mix of every playing voice, then report
    // endings and (every so often) playheads back to the ui thread.
    pub fn render_block(&mut self, frames: &mut [StereoFrame]) {
        for f in frames.iter_mut() {
            *f = StereoFrame::zero();
        }

        for v in self.voices.iter_mut() {
            if v.render_into(frames) {
                if let Some(tx) = &self.events_tx {
                    let _ = tx.try_send(AudioEvent::Ended { voice: v.id });
                }
            }
        }

        self.since_report += frames.len();
        if self.since_report < self.report_every {
            return;
        }
        self.since_report = 0;
        if let Some(tx) = &self.events_tx {
            for v in self.voices.iter().filter(|v| v.playing) {
                let _ = tx.try_send(AudioEvent::Playhead {
                    voice: v.id,
                    position_s: v.position_s(),
                    duration_s: v.duration_s(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::SampleBuffer;
    use crate::audio::voice_id::next_voice_id;

    fn register(engine: &mut Engine, len: usize) -> crate::audio::VoiceId {
        let voice = next_voice_id();
        let buffer = Arc::new(SampleBuffer {
            data: vec![StereoFrame { left: 0.5, right: 0.25 }; len],
            sample_rate: 300,
        });
        engine.handle_cmd(AudioCommand::Register { voice, buffer, volume: 1.0 });
        voice
    }

    #[test]
    fn registered_voice_is_silent_until_played() {
        let mut engine = Engine::new(300);
        let voice = register(&mut engine, 100);
        let mut block = [StereoFrame::zero(); 16];
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame::zero());

        engine.handle_cmd(AudioCommand::Play { voice, restart: true, looping: false, volume: 0.5 });
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame { left: 0.25, right: 0.125 });
        assert_eq!(engine.active_voices(), 1);
    }

    #[test]
    fn reports_end_of_one_shot() {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let mut engine = Engine::new(300);
        engine.set_events_tx(tx);
        let voice = register(&mut engine, 8);
        engine.handle_cmd(AudioCommand::Play { voice, restart: true, looping: false, volume: 1.0 });

        let mut block = [StereoFrame::zero(); 16];
        engine.render_block(&mut block);
        let events: Vec<AudioEvent> = rx.try_iter().collect();
        assert!(events.contains(&AudioEvent::Ended { voice }));
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn voices_past_the_reserve_still_play_and_end() {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let mut engine = Engine::new(300);
        engine.set_events_tx(tx);
        let mut last = None;
        for _ in 0..=RESERVED_VOICES {
            last = Some(register(&mut engine, 8));
        }
        let voice = last.unwrap();
        engine.handle_cmd(AudioCommand::Play { voice, restart: true, looping: false, volume: 1.0 });

        let mut block = [StereoFrame::zero(); 16];
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame { left: 0.5, right: 0.25 });
        let events: Vec<AudioEvent> = rx.try_iter().collect();
        assert!(events.contains(&AudioEvent::Ended { voice }));
    }

    #[test]
    fn reports_playheads_at_a_low_rate() {
        let (tx, rx) = crossbeam_channel::bounded(64);
        let mut engine = Engine::new(300); // report every 10 frames
        engine.set_events_tx(tx);
        let voice = register(&mut engine, 1000);
        engine.handle_cmd(AudioCommand::Play { voice, restart: true, looping: true, volume: 1.0 });

        let mut block = [StereoFrame::zero(); 4];
        engine.render_block(&mut block);
        assert!(rx.try_recv().is_err());
        engine.render_block(&mut block);
        engine.render_block(&mut block);
        match rx.try_recv() {
            Ok(AudioEvent::Playhead { voice: v, position_s, duration_s }) => {
                assert_eq!(v, voice);
                assert!((position_s - 12.0 / 300.0).abs() < 1e-6);
                assert!((duration_s - 1000.0 / 300.0).abs() < 1e-4);
            }
            other => panic!("expected a playhead, got {other:?}"),
        }
    }

    #[test]
    fn unload_and_volume() {
        let mut engine = Engine::new(300);
        let voice = register(&mut engine, 100);
        engine.handle_cmd(AudioCommand::Play { voice, restart: true, looping: true, volume: 1.0 });
        engine.handle_cmd(AudioCommand::SetVolume { voice, volume: 2.0 });
        let mut block = [StereoFrame::zero(); 2];
        engine.render_block(&mut block);
        assert_eq!(block[0].left, 0.5); // clamped to 1.0

        engine.handle_cmd(AudioCommand::Unload { voice });
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame::zero());
        assert_eq!(engine.active_voices(), 0);
    }
}
