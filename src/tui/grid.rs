use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

// split `area` into rows x cols equal cells, indexed [y][x]
pub fn cell_rects(area: Rect, rows: usize, cols: usize) -> Vec<Vec<Rect>> {
    if rows == 0 || cols == 0 {
        return vec![];
    }
    let row_constraints = vec![Constraint::Ratio(1, rows as u32); rows];
    let col_constraints = vec![Constraint::Ratio(1, cols as u32); cols];

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    row_areas
        .iter()
        .map(|row_area| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(col_constraints.clone())
                .split(*row_area)
                .to_vec()
        })
        .collect()
}

// which cell is under the terminal position (column, row)
pub fn hit_test(area: Rect, rows: usize, cols: usize, column: u16, row: u16) -> Option<(usize, usize)> {
    let pos = Position { x: column, y: row };
    if !area.contains(pos) {
        return None;
    }
    cell_rects(area, rows, cols)
        .iter()
        .enumerate()
        .find_map(|(y, cells)| {
            cells.iter().position(|cell| cell.contains(pos)).map(|x| (x, y))
        })
}
