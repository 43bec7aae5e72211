// rows x cols cells; a pad's stamped position always matches its cell

use super::mp3_file::Mp3File;
use super::pad::{Pad, PlayerCommand};
use super::record::{BoardRecord, RECORD_VERSION, SoundRecord};
use crate::audio::VoiceId;
use crate::errors::BoardError;
use crate::shared::KeyBinding;

pub const DEFAULT_ROWS: usize = 3;
pub const DEFAULT_COLS: usize = 3;
// records asking for more cells than this are refused
pub const MAX_GRID_CELLS: usize = 4096;

#[derive(Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<Option<Pad>>>, // grid[y][x]
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_ROWS, DEFAULT_COLS)
    }

    pub fn with_size(rows: usize, cols: usize) -> Self {
        let mut board = Self { rows: DEFAULT_ROWS, cols: DEFAULT_COLS, grid: Vec::new() };
        board.rows = if rows == 0 { DEFAULT_ROWS } else { rows };
        board.cols = if cols == 0 { DEFAULT_COLS } else { cols };
        board.make_grid();
        board
    }

    // fill in any missing cells, never drops existing ones
    fn make_grid(&mut self) {
        self.grid.resize_with(self.rows, Vec::new);
        for row in self.grid.iter_mut() {
            row.resize_with(self.cols, || None);
        }
    }

    fn validate(&self, x: usize, y: usize) -> Result<(), BoardError> {
        if x >= self.cols || y >= self.rows {
            return Err(BoardError::OutOfBounds { x, y, cols: self.cols, rows: self.rows });
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    // Sizing

    // zero keeps the current value; never shrinks
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.set_rows(rows);
        self.set_cols(cols);
    }

    pub fn set_rows(&mut self, rows: usize) {
        self.rows = self.rows.max(rows);
        self.make_grid();
    }

    pub fn set_cols(&mut self, cols: usize) {
        self.cols = self.cols.max(cols);
        self.make_grid();
    }

    pub fn add_row(&mut self) {
        self.rows += 1;
        self.make_grid();
    }

    pub fn add_column(&mut self) {
        self.cols += 1;
        self.make_grid();
    }

    // returns whether anything changed
    pub fn resize_if_empty(&mut self, rows: usize, cols: usize) -> bool {
        if !self.is_empty() || rows == 0 || cols == 0 {
            return false;
        }
        if rows == self.rows && cols == self.cols {
            return false;
        }
        self.rows = rows;
        self.cols = cols;
        self.grid.truncate(rows);
        for row in self.grid.iter_mut() {
            row.truncate(cols);
        }
        self.make_grid();
        true
    }

    // Cells

    // hands back whatever was there; releasing it is up to the caller
    pub fn place_sound(&mut self, x: usize, y: usize, mut pad: Pad) -> Result<Option<Pad>, BoardError> {
        self.validate(x, y)?;
        pad.x = x;
        pad.y = y;
        Ok(self.grid[y][x].replace(pad))
    }

    pub fn remove_sound(&mut self, x: usize, y: usize) -> Result<Option<Pad>, BoardError> {
        self.validate(x, y)?;
        Ok(self.grid[y][x].take())
    }

    pub fn get_sound(&self, x: usize, y: usize) -> Result<Option<&Pad>, BoardError> {
        self.validate(x, y)?;
        Ok(self.grid[y][x].as_ref())
    }

    pub fn get_sound_mut(&mut self, x: usize, y: usize) -> Result<Option<&mut Pad>, BoardError> {
        self.validate(x, y)?;
        Ok(self.grid[y][x].as_mut())
    }

    pub fn get_by_key(&self, key: &KeyBinding) -> Option<&Pad> {
        self.all_sounds().find(|p| p.key() == Some(key))
    }

    pub fn get_by_key_mut(&mut self, key: &KeyBinding) -> Option<&mut Pad> {
        self.all_sounds_mut().find(|p| p.key() == Some(key))
    }

    pub fn get_by_control(&self, control: u8) -> Option<&Pad> {
        self.all_sounds().find(|p| p.control() == Some(control))
    }

    pub fn get_by_control_mut(&mut self, control: u8) -> Option<&mut Pad> {
        self.all_sounds_mut().find(|p| p.control() == Some(control))
    }

    pub fn find_by_voice_mut(&mut self, voice: VoiceId) -> Option<&mut Pad> {
        self.all_sounds_mut().find(|p| p.voice() == voice)
    }

    pub fn all_sounds(&self) -> impl Iterator<Item = &Pad> {
        self.grid.iter().flatten().flatten()
    }

    pub fn all_sounds_mut(&mut self) -> impl Iterator<Item = &mut Pad> {
        self.grid.iter_mut().flatten().flatten()
    }

    pub fn len(&self) -> usize {
        self.all_sounds().count()
    }

    pub fn is_empty(&self) -> bool {
        self.all_sounds().next().is_none()
    }

    pub fn clear(&mut self) -> Vec<(Pad, Vec<PlayerCommand>)> {
        let mut released = Vec::new();
        for cell in self.grid.iter_mut().flatten() {
            if let Some(mut pad) = cell.take() {
                let cmds = pad.destroy();
                released.push((pad, cmds));
            }
        }
        released
    }

    // Saving and loading

    pub fn to_record(&self) -> BoardRecord {
        let sounds = self
            .all_sounds()
            .map(|pad| SoundRecord {
                x: pad.x,
                y: pad.y,
                colour: pad.colour().to_string(),
                play_mode: pad.play_mode(),
                key: pad.key().cloned(),
                control: pad.control(),
                file: pad.asset().map(Mp3File::to_record),
            })
            .collect();

        BoardRecord {
            version: RECORD_VERSION.to_string(),
            rows: self.rows,
            cols: self.cols,
            sounds,
        }
    }

    // nothing is built unless the whole record checks out
    pub fn from_record(record: &BoardRecord) -> Result<Self, BoardError> {
        if record.version != RECORD_VERSION {
            return Err(BoardError::InvalidFormat(if record.version.is_empty() {
                "missing version".to_string()
            } else {
                format!("unsupported version {:?}", record.version)
            }));
        }
        match record.rows.checked_mul(record.cols) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(BoardError::InvalidFormat(format!(
                    "board of {}x{} is too large",
                    record.rows, record.cols
                )));
            }
        }

        // decode everything first so a bad sound can't leave a half-built board
        let mut pads = Vec::with_capacity(record.sounds.len());
        for sound in &record.sounds {
            let mut pad = Pad::with_colour(sound.colour.clone());
            pad.set_play_mode(sound.play_mode);
            if let Some(key) = &sound.key {
                pad.set_key(key.clone());
            }
            if let Some(control) = sound.control {
                pad.set_control(control);
            }
            if let Some(file) = &sound.file {
                pad.set_asset(Mp3File::from_record(file)?);
            }
            pads.push((sound.x, sound.y, pad));
        }

        let mut board = Board::with_size(record.rows, record.cols);
        for (x, y, pad) in pads {
            board.place_sound(x, y, pad).map_err(|e| BoardError::InvalidFormat(e.to_string()))?;
        }
        Ok(board)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, BoardError> {
        match value.get("version") {
            Some(serde_json::Value::String(v)) if v == RECORD_VERSION => {}
            Some(v) => {
                return Err(BoardError::InvalidFormat(format!("unsupported version {v}")));
            }
            None => return Err(BoardError::InvalidFormat("missing version".to_string())),
        }
        let record: BoardRecord = serde_json::from_value(value)
            .map_err(|e| BoardError::InvalidFormat(e.to_string()))?;
        Self::from_record(&record)
    }

    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| BoardError::InvalidFormat(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_record())
    }
}
