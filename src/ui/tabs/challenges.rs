use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Challenge;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Challenge>> {
    vec![
        Column::new("Challenge", Constraint::Percentage(22), |c: &Challenge| {
            c.name.clone()
        }),
        Column::new("Description", Constraint::Fill(1), |c: &Challenge| {
            c.description.clone()
        }),
        Column::new("Launch Date", Constraint::Length(12), |c: &Challenge| {
            c.launch_date.clone().unwrap_or_default()
        }),
        Column::new("Reward", Constraint::Length(10), |c: &Challenge| {
            c.reward.to_string()
        }),
        Column::new("Remaining", Constraint::Length(11), |c: &Challenge| {
            c.remaining_time.clone()
        }),
        Column::new("Participants", Constraint::Length(12), |c: &Challenge| {
            c.participant_count().to_string()
        }),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    tabs::render_scope_tabs(frame, app, chunks[0]);
    tabs::render_table(frame, chunks[1], "Challenges", &app.challenges, &columns());
    tabs::render_table_hints(
        frame,
        chunks[2],
        "[n]ew [e]dit [space] select [d]elete [x]port [/] search [s]ort",
    );
}
