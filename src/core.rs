use std::sync::Arc;

use crate::audio_api::AudioCommand;
use crate::loader::sample_loader;
use crate::pipeline::{Pad, PlayerCommand};

// Turn a pad's player commands into engine commands. `Materialize` decodes the
// asset here on the ui thread; if that fails the pad goes back to idle and the
// rest of the batch is dropped.
pub fn player_commands_to_audio(
    pad: &mut Pad,
    cmds: Vec<PlayerCommand>,
    sample_rate: u32,
) -> Vec<AudioCommand> {
    let voice = pad.voice();
    let mut out = Vec::with_capacity(cmds.len());

    for cmd in cmds {
        match cmd {
            PlayerCommand::Materialize => {
                let Some(asset) = pad.asset() else {
                    pad.on_load_failed();
                    return out;
                };
                match sample_loader::decode(asset, sample_rate) {
                    Ok(buffer) => out.push(AudioCommand::Register {
                        voice,
                        buffer: Arc::new(buffer),
                        volume: pad.volume(),
                    }),
                    Err(e) => {
                        log::warn!("can't play {}: {e}", asset.name());
                        pad.on_load_failed();
                        return out;
                    }
                }
            }
            PlayerCommand::Play { restart, looping } => out.push(AudioCommand::Play {
                voice,
                restart,
                looping,
                volume: pad.volume(),
            }),
            PlayerCommand::Pause => out.push(AudioCommand::Pause { voice }),
            PlayerCommand::Volume(volume) => out.push(AudioCommand::SetVolume { voice, volume }),
            PlayerCommand::Release => out.push(AudioCommand::Unload { voice }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::pipeline::{Mp3File, PlayMode};

    fn wav(frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..frames {
                w.write_sample(1000i16).unwrap();
            }
            w.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn first_push_registers_then_plays() {
        let mut pad = Pad::with_colour("#fff");
        pad.set_asset(Mp3File::new("tone.wav", wav(80)));
        pad.set_volume(0.7);
        let cmds = pad.push();
        let audio = player_commands_to_audio(&mut pad, cmds, 8000);

        assert_eq!(audio.len(), 2);
        match &audio[0] {
            AudioCommand::Register { voice, buffer, volume } => {
                assert_eq!(*voice, pad.voice());
                assert_eq!(buffer.len(), 80);
                assert!((volume - 0.7).abs() < 1e-6);
            }
            other => panic!("expected register, got {other:?}"),
        }
        assert!(matches!(
            audio[1],
            AudioCommand::Play { restart: true, looping: false, .. }
        ));
        assert!(pad.is_playing());
    }

    #[test]
    fn undecodable_asset_leaves_the_pad_idle() {
        let mut pad = Pad::with_colour("#fff");
        pad.set_asset(Mp3File::new("broken.wav", vec![0u8; 10]));
        pad.set_play_mode(PlayMode::Gate);
        let cmds = pad.push();
        let audio = player_commands_to_audio(&mut pad, cmds, 8000);
        assert!(audio.is_empty());
        assert!(!pad.is_playing());
        assert!(!pad.is_materialized());
    }

    #[test]
    fn destroy_maps_to_pause_and_unload() {
        let mut pad = Pad::with_colour("#fff");
        pad.set_asset(Mp3File::new("tone.wav", wav(8)));
        let cmds = pad.push();
        player_commands_to_audio(&mut pad, cmds, 8000);
        let voice = pad.voice();
        let cmds = pad.destroy();
        let audio = player_commands_to_audio(&mut pad, cmds, 8000);
        assert!(matches!(audio[0], AudioCommand::Pause { voice: v } if v == voice));
        assert!(matches!(audio[1], AudioCommand::Unload { voice: v } if v == voice));
    }
}
