// Autosave and .soundboard files. The board itself only knows how to turn into
// a record and back; everything touching the disk lives here.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use serde_json::Value;

use super::board::Board;

pub const AUTOSAVE_KEY: &str = "autosave";
pub const FILE_EXTENSION: &str = "soundboard";

const SOUNDGRID_DIR: &str = ".soundgrid";

// Minimal key-value storage for records
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>>;
    fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

// a shared handle works wherever the store itself does
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove_item(key)
    }
}

// <dir>/.soundgrid/<key>.json
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(dir: &Path) -> Self {
        Self { root: dir.join(SOUNDGRID_DIR) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, key: &str) -> PathBuf {
        // keys are ours ("autosave"), but keep them from walking out of the dir anyway
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for DirStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let path = self.item_path(key);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let value = serde_json::from_str(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(value))
    }

    // Save the record, making the directory if it doesn't exist already
    fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;
        let path = self.item_path(key);
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        match std::fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// in-memory store, handy when there's no disk to write to
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let items = self.items.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        let mut items = self.items.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        items.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        let mut items = self.items.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        items.remove(key);
        Ok(())
    }
}

// Load the autosave, or start fresh at rows x cols (0 = default). Any failure
// just means "no autosave".
pub fn find_or_create_board(store: &dyn KeyValueStore, rows: usize, cols: usize) -> Board {
    match store.get_item(AUTOSAVE_KEY) {
        Ok(Some(value)) => match Board::from_value(value) {
            Ok(board) => {
                log::info!("restored autosave ({} pads)", board.len());
                return board;
            }
            Err(e) => log::warn!("ignoring autosave: {e}"),
        },
        Ok(None) => {}
        Err(e) => log::warn!("could not read autosave: {e:#}"),
    }
    Board::with_size(rows, cols)
}

pub fn save_autosave(store: &dyn KeyValueStore, board: &Board) -> anyhow::Result<()> {
    let value = serde_json::to_value(board.to_record())?;
    store.set_item(AUTOSAVE_KEY, &value)
}

// "Untitled" -> "Untitled.soundboard", anything with an extension is left alone
pub fn with_board_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(FILE_EXTENSION)
    }
}

pub fn export_board(path: &Path, board: &Board) -> anyhow::Result<PathBuf> {
    let path = with_board_extension(path);
    let json = board.to_json()?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn import_board(path: &Path) -> anyhow::Result<Board> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let board = Board::from_json(&json)?;
    Ok(board)
}
