use std::io::Cursor;

use super::frame::StereoFrame;
use crate::errors::SampleLoadError;

#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // the audio data, already at the output rate
    pub sample_rate: u32,
}

impl SampleBuffer {
    // Read WAV bytes into a stereo buffer at `target_rate`
    pub fn from_wav_bytes(bytes: &[u8], target_rate: u32) -> Result<Self, SampleLoadError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader // float, just pass it through
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => { // int, scale down to -1..1
                let max = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Self::from_interleaved(&samples, spec.channels as usize, spec.sample_rate, target_rate)
    }

    // Interleaved samples from any decoder -> stereo frames at `target_rate`
    pub fn from_interleaved(
        samples: &[f32],
        channels: usize,
        source_rate: u32,
        target_rate: u32,
    ) -> Result<Self, SampleLoadError> {
        let frames: Vec<StereoFrame> = match channels {
            1 => samples
                .iter()
                .map(|&x| StereoFrame { left: x, right: x }) // mono, duplicate
                .collect(),
            2 => samples
                .chunks_exact(2)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect(),
            n => return Err(SampleLoadError::UnsupportedChannels(n)),
        };

        if frames.is_empty() {
            return Err(SampleLoadError::Empty);
        }

        Ok(Self {
            data: resample_linear(&frames, source_rate, target_rate),
            sample_rate: target_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn duration_s(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f32 / self.sample_rate as f32
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    // plain linear interpolation, good enough for one-shot pads
    if source_rate == target_rate || source_rate == 0 || target_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio; // ex. 3.7
        let idx = src_pos.floor() as usize; // ex. 3
        let frac = (src_pos - idx as f64) as f32; // ex. 0.7
        if idx >= frames.len().saturating_sub(1) { // past the last pair, hold the tail
            out.push(*frames.last().unwrap_or(&StereoFrame::zero()));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            });
        }
    }
    out
}
