use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Level;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Level>> {
    vec![
        Column::new("Level Name", Constraint::Percentage(30), |l: &Level| {
            l.name.clone()
        }),
        Column::new("Level", Constraint::Length(7), |l: &Level| {
            l.level.to_string()
        }),
        Column::new("Requirement", Constraint::Fill(1), |l: &Level| {
            l.requirement_display().to_string()
        }),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    tabs::render_table(frame, chunks[0], "Levels", &app.levels, &columns());
    tabs::render_table_hints(
        frame,
        chunks[1],
        "[n]ew [e]dit [space] select [d]elete [x]port [/] search [s]ort",
    );
}
