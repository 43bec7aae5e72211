use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoardError {
    #[error("position ({x}, {y}) is out of bounds for a {cols}x{rows} board")]
    OutOfBounds {
        x: usize,
        y: usize,
        cols: usize,
        rows: usize,
    },

    #[error("can't read this file: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("waited too long for a key press ({0:?})")]
    TimedOut(Duration),

    #[error("key capture was cancelled")]
    Cancelled,
}

// none of these are fatal; keyboard and mouse keep working
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI not available: {0}")]
    Unavailable(String),

    #[error("failed to connect MIDI input {port}: {reason}")]
    Connect { port: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("failed to decode audio file: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("failed to read wav data: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio file has no default track")]
    NoDefaultTrack,

    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    #[error("unsupported channel count: {0} (only mono and stereo)")]
    UnsupportedChannels(usize),

    #[error("audio file contains no samples")]
    Empty,
}
