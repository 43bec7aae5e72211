use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, AudioEvent};

mod engine;
mod frame;
mod sample_buffer;
mod voice;
mod voice_id;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use voice_id::{next_voice_id, VoiceId};

use engine::Engine;

const MAX_BLOCK_FRAMES: usize = 8192;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    events_rx: Receiver<AudioEvent>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!("audio command queue full, dropping command");
        }
    }

    pub fn poll_event(&self) -> Option<AudioEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (events_tx, events_rx) = crossbeam_channel::bounded::<AudioEvent>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate: u32 = config.sample_rate();
    let channels = config.channels() as usize;
    log::info!("audio output: {} ch @ {} Hz", channels, sample_rate);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(
                &device, &config.into(), rx, events_tx, sample_rate, channels,
            )?;
            output_stream.play().context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                events_rx,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    events_tx: Sender<AudioEvent>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);
    engine.set_events_tx(events_tx);
    let mut scratch = vec![StereoFrame::zero(); MAX_BLOCK_FRAMES];

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::zero()); // only if the host hands us a huge block
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);
            write_interleaved(frames, data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// stereo frames -> the device's interleaved layout; extra channels get silence
fn write_interleaved(frames: &[StereoFrame], data: &mut [f32], channels: usize) {
    match channels {
        0 => {}
        1 => {
            for (out, f) in data.iter_mut().zip(frames) {
                *out = f.mono();
            }
        }
        n => {
            for (chunk, f) in data.chunks_exact_mut(n).zip(frames) {
                chunk[0] = f.left;
                chunk[1] = f.right;
                for extra in &mut chunk[2..] {
                    *extra = 0.0;
                }
            }
        }
    }
}
