use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::shared::DEFAULT_CAPTURE_TIMEOUT_SECS;

#[derive(Parser, Debug)]
#[command(name = "soundgrid")]
#[command(about = "A grid of audio pads for the terminal, played with keys, mouse or MIDI", long_about = None)]
pub struct Cli {
    /// Directory holding the autosave (in .soundgrid/); defaults to the current one
    pub dir: Option<PathBuf>,

    /// Number of rows (default: whatever fits the terminal)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Number of columns (default: whatever fits the terminal)
    #[arg(long)]
    pub cols: Option<usize>,

    /// Seconds to wait for a key or control when assigning one
    #[arg(long, default_value_t = DEFAULT_CAPTURE_TIMEOUT_SECS)]
    pub capture_timeout: u64,

    /// Only connect MIDI inputs whose name contains this
    #[arg(long)]
    pub midi_port: Option<String>,

    /// Don't open any MIDI inputs
    #[arg(long)]
    pub no_midi: bool,

    /// Where to write the log (default: <dir>/.soundgrid/soundgrid.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start from this .soundboard file instead of the autosave
    #[arg(long)]
    pub import: Option<PathBuf>,
}

impl Cli {
    pub fn board_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout.max(1))
    }

    /// Rows and columns forced on the command line. Either one on its own
    /// keeps the default for the other.
    pub fn fixed_size(&self) -> Option<(usize, usize)> {
        match (self.rows, self.cols) {
            (None, None) => None,
            (rows, cols) => Some((rows.unwrap_or(0), cols.unwrap_or(0))),
        }
    }
}
