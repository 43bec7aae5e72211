use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio::SampleBuffer;
use crate::errors::SampleLoadError;
use crate::pipeline::Mp3File;

// wav through hound, anything else through symphonia
pub fn decode(asset: &Mp3File, target_rate: u32) -> Result<SampleBuffer, SampleLoadError> {
    if asset.extension().as_deref() == Some("wav") {
        return SampleBuffer::from_wav_bytes(asset.bytes(), target_rate);
    }
    decode_with_symphonia(asset, target_rate)
}

fn decode_with_symphonia(asset: &Mp3File, target_rate: u32) -> Result<SampleBuffer, SampleLoadError> {
    let cursor = Cursor::new(Arc::clone(asset.data()));
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = asset.extension() {
        hint.with_extension(&ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut decoded: Vec<f32> = Vec::new();
    let mut channels = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            // a corrupt frame in an mp3 isn't worth dropping the whole file over
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("skipping undecodable packet in {}: {msg}", asset.name());
                continue;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };
        let spec = *audio_buf.spec();
        channels = spec.channels.count();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());
    }

    if channels == 0 {
        return Err(SampleLoadError::Empty);
    }
    SampleBuffer::from_interleaved(&decoded, channels, file_rate_hz, target_rate)
}
