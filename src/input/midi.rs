use crossbeam_channel::Sender;
use midir::{Ignore, MidiInput, MidiInputConnection};

use super::Trigger;
use crate::errors::MidiError;
use crate::shared::KeyBinding;

const CLIENT_NAME: &str = "soundgrid";

// any channel; note-on with velocity 0 counts as note-off
pub fn parse_message(bytes: &[u8]) -> Option<Trigger> {
    let (&status, rest) = bytes.split_first()?;
    let note = rest.first().copied()?;
    let value = rest.get(1).copied().unwrap_or(0);

    match status & 0xF0 {
        0x90 if value > 0 => Some(Trigger::Down(KeyBinding::Note(note))),
        0x90 | 0x80 => Some(Trigger::Up(KeyBinding::Note(note))),
        0xB0 if rest.len() >= 2 => Some(Trigger::Control { controller: note, value }),
        _ => None,
    }
}

pub struct MidiInputs {
    connections: Vec<MidiInputConnection<()>>,
}

impl MidiInputs {
    pub fn port_count(&self) -> usize {
        self.connections.len()
    }
}

// every port, or only those whose name contains `filter`
pub fn connect_all(filter: Option<&str>, tx: Sender<Trigger>) -> Result<MidiInputs, MidiError> {
    let scanner = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Unavailable(e.to_string()))?;
    let ports = scanner.ports();

    let mut connections = Vec::new();
    for port in &ports {
        let name = scanner
            .port_name(port)
            .unwrap_or_else(|_| "unknown port".to_string());
        if let Some(filter) = filter {
            if !name.contains(filter) {
                continue;
            }
        }

        // connecting consumes the MidiInput, so each port gets its own
        let mut input = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Unavailable(e.to_string()))?;
        input.ignore(Ignore::Sysex | Ignore::Time | Ignore::ActiveSense);
        let port_tx = tx.clone();
        match input.connect(
            port,
            "soundgrid-input",
            move |_stamp, message, _| {
                if let Some(trigger) = parse_message(message) {
                    let _ = port_tx.try_send(trigger);
                }
            },
            (),
        ) {
            Ok(conn) => {
                log::info!("🎹 connected MIDI input {name}");
                connections.push(conn);
            }
            Err(e) => {
                let err = MidiError::Connect { port: name, reason: e.to_string() };
                log::warn!("{err}");
            }
        }
    }

    if connections.is_empty() {
        return Err(MidiError::Unavailable("no MIDI devices found".to_string()));
    }
    Ok(MidiInputs { connections })
}
