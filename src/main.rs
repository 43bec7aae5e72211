mod shared;
mod errors;
mod config;
mod tui;
mod audio_api;
mod audio;
mod core;
mod input;
mod loader;
mod middle;
mod pipeline;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use env_logger::{Builder, Env, Target};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio_api::AudioEvent;
use config::Cli;
use input::Trigger;
use middle::Middle;
use pipeline::persistence::{self, DirStore};
use shared::InputEvent;

const LOG_FILE: &str = "soundgrid.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dir = cli.board_dir();
    let store = DirStore::new(&dir);

    // the terminal belongs to the ui, so logs go to a file
    let log_path = cli.log_file.clone().unwrap_or_else(|| store.root().join(LOG_FILE));
    if let Err(e) = init_logger(&log_path) {
        eprintln!("logging disabled: {e:#}");
    }
    log::info!("soundgrid starting in {}", dir.display());

    let audio = audio::start_audio()?;

    let (width, height) = terminal::size()?;
    let fixed_size = cli.fixed_size();
    let (rows, cols) = fixed_size.unwrap_or_else(|| shared::rows_and_cols(width, height));
    let board = persistence::find_or_create_board(&store, rows, cols);

    let mut middle = Middle::new(board, Box::new(store), audio.sample_rate())
        .with_capture_timeout(cli.capture_timeout());
    if let Some((rows, cols)) = fixed_size {
        middle = middle.with_fixed_size(rows, cols);
    }
    // a bad file keeps the autosaved board and shows up in the status line
    if let Some(path) = &cli.import {
        for cmd in middle.import(path) {
            audio.send(cmd);
        }
    }
    middle.handle_input(InputEvent::Resize { width, height }, Instant::now());

    // midi is optional; keyboard and mouse work without it
    let (midi_tx, midi_rx) = crossbeam_channel::bounded::<Trigger>(256);
    let _midi = if cli.no_midi {
        None
    } else {
        match input::midi::connect_all(cli.midi_port.as_deref(), midi_tx) {
            Ok(inputs) => {
                log::info!("listening on {} MIDI input(s)", inputs.port_count());
                Some(inputs)
            }
            Err(e) => {
                log::warn!("{e}, carrying on without MIDI");
                None
            }
        }
    };

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(
        std::io::stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    // real press/release detection where the terminal supports it,
    // otherwise every key press is a tap
    let key_releases = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
    if key_releases {
        let _ = crossterm::execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
    }
    log::info!("key releases {}", if key_releases { "available" } else { "not reported" });

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut tui_state = tui::mode::TuiState::new(key_releases);

    loop {
        let ds = middle.display_state();
        tui_state.settings = ds.settings;
        tui_state.prompt_open = ds.prompt.is_some();
        tui_state.capturing = ds.capturing.is_some();
        tui_state.rows = ds.rows;
        tui_state.cols = ds.cols;

        let mut grid_area = tui_state.grid_area;
        term.draw(|frame| {
            grid_area = tui::view::render(frame, frame.area(), &ds);
        })?;
        tui_state.grid_area = grid_area;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        if events.contains(&InputEvent::Quit) {
            // save before quitting
            middle.save();
            log::info!("bye");
            return Ok(());
        }

        let engine: Vec<AudioEvent> = std::iter::from_fn(|| audio.poll_event()).collect();
        let inputs = events.into_iter().chain(midi_rx.try_iter().map(InputEvent::Pad));
        for cmd in middle.frame(engine, inputs, Instant::now()) {
            audio.send(cmd);
        }
    }
}

fn init_logger(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
