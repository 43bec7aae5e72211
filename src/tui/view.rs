use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use ratatui::Frame;

use super::grid;
use crate::shared::{DisplayState, PadView};

const HELP: &str = "Tab settings · Ctrl+R row · Ctrl+L column · Ctrl+S save · Ctrl+O load · Ctrl+X clear · Esc quit";
const SETTINGS_HELP: &str =
    "arrows select · r/o/g mode · c colour · k key · m cc · a file · d delete · +/- volume · Esc done";

// draws the whole screen and returns where the pad grid went
pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // pad grid
            Constraint::Length(1), // status / prompt
            Constraint::Length(1), // help
        ])
        .split(area);

    draw_grid(frame, sections[0], state);
    draw_status(frame, sections[1], state);
    draw_help(frame, sections[2], state);
    sections[0]
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let cells = grid::cell_rects(area, state.rows, state.cols);
    for (y, row) in cells.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let selected = state.settings && state.selected == (x, y);
            match state.pad_at(x, y) {
                Some(pad) => draw_pad(frame, *cell, pad, selected),
                None => draw_empty(frame, *cell, selected),
            }
        }
    }
}

fn draw_pad(frame: &mut Frame, area: Rect, pad: &PadView, selected: bool) {
    let colour = parse_colour(&pad.colour);
    let (style, text_style) = if pad.playing {
        (Style::default().fg(colour).bg(colour), Style::default().fg(Color::Black).bg(colour))
    } else {
        (Style::default().fg(colour), Style::default().fg(Color::White))
    };
    let block = Block::bordered()
        .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
        .border_style(if selected { Style::default().fg(Color::White) } else { style })
        .style(style)
        .title(Span::styled(format!(" {} ", pad.mode.glyph()), text_style));

    let inner_width = area.width.saturating_sub(2) as usize;
    let lines = vec![
        Line::from(Span::styled(pad.label.clone(), text_style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(pad.name.clone(), text_style)),
        Line::from(Span::styled(bar(pad.progress, inner_width), text_style)),
        Line::from(Span::styled(bar(pad.volume, inner_width), text_style.add_modifier(Modifier::DIM))),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_empty(frame: &mut Frame, area: Rect, selected: bool) {
    let border = if selected { Color::White } else { Color::DarkGray };
    let block = Block::bordered()
        .border_type(if selected { BorderType::Thick } else { BorderType::Plain })
        .border_style(Style::default().fg(border));
    let hint = Paragraph::new(Line::from(Span::styled("+", Style::default().fg(Color::DarkGray)))).block(block);
    frame.render_widget(hint, area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let line = match &state.prompt {
        Some((label, text)) => Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow)),
            Span::raw(format!("{text}▏")),
        ]),
        None => Line::from(Span::styled(state.status.clone(), Style::default().fg(Color::Gray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_help(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let help = if state.settings {
        format!("{SETTINGS_HELP} · master {:.0}%", state.master_volume * 100.0)
    } else {
        HELP.to_string()
    };
    let line = Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(line), area);
}

// filled/empty bar for a 0..=1 fraction
fn bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

// "#26748E", "#fff" or "rgb(38, 116, 142)"
fn parse_colour(colour: &str) -> Color {
    let colour = colour.trim();
    if let Some(hex) = colour.strip_prefix('#').filter(|h| h.is_ascii()) {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let rgb = match hex.len() {
            6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            3 => (
                channel(&hex[0..1]).map(|v| v * 17),
                channel(&hex[1..2]).map(|v| v * 17),
                channel(&hex[2..3]).map(|v| v * 17),
            ),
            _ => (None, None, None),
        };
        if let (Some(r), Some(g), Some(b)) = rgb {
            return Color::Rgb(r, g, b);
        }
    } else if let Some(body) = colour.strip_prefix("rgb(").and_then(|c| c.strip_suffix(')')) {
        let parts: Vec<u8> = body.split(',').filter_map(|p| p.trim().parse().ok()).collect();
        if let [r, g, b] = parts[..] {
            return Color::Rgb(r, g, b);
        }
    }
    Color::Gray
}
