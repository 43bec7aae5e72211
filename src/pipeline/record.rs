// The versioned plain-data shape of a board, used for both autosave and
// .soundboard files. Field names follow the saved json exactly.

use serde::{Deserialize, Serialize};

use super::play_mode::PlayMode;
use crate::shared::KeyBinding;

pub const RECORD_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    // missing version deserializes as "" and is rejected by the board
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub cols: usize,
    #[serde(default)]
    pub sounds: Vec<SoundRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundRecord {
    pub x: usize,
    pub y: usize,
    pub colour: String,
    #[serde(default)]
    pub play_mode: PlayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u8>,
    // pads can exist before anything was dropped on them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub data: String, // data uri
}
