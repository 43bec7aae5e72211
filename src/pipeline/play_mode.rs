use serde::{Deserialize, Serialize};

// How a pad reacts to push / release
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Retrigger, // every push restarts from the top
    OneShot,   // push toggles play-from-start / stop
    Gate,      // loops while held, stops on release
}

impl PlayMode {
    pub fn glyph(self) -> &'static str {
        match self {
            PlayMode::Retrigger => "↻",
            PlayMode::OneShot => "1",
            PlayMode::Gate => "▮",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Retrigger => "retrigger",
            PlayMode::OneShot => "one-shot",
            PlayMode::Gate => "gate",
        }
    }
}
