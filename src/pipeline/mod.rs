// The data model: board, pads, their assets, and how they're saved.

pub mod board;
pub mod mp3_file;
pub mod pad;
pub mod persistence;
pub mod play_mode;
pub mod progress;
pub mod record;

pub use board::Board;
pub use mp3_file::Mp3File;
pub use pad::{Pad, PlayerCommand, Transport};
pub use play_mode::PlayMode;
pub use progress::Playhead;
