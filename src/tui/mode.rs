use ratatui::layout::Rect;

// state local to the tui, used to resolve raw key/mouse events into
// semantic inputevents. settings, prompt_open, capturing, rows and cols
// are synced from DisplayState each loop
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub settings: bool,
    pub prompt_open: bool,
    pub capturing: bool,
    pub rows: usize,
    pub cols: usize,
    // where the grid was last drawn, for mouse hit testing
    pub grid_area: Rect,
    // pad the left button went down on; the release goes to the same pad
    pub mouse_pad: Option<(usize, usize)>,
    // terminal sends real key releases (keyboard enhancement is on)
    pub key_releases: bool,
}

impl TuiState {
    pub fn new(key_releases: bool) -> Self {
        Self { key_releases, ..Self::default() }
    }
}
