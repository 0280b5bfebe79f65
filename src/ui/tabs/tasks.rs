use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Task;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Task>> {
    vec![
        Column::new("Task Name", Constraint::Percentage(24), |t: &Task| {
            t.task_name.clone()
        }),
        Column::new("Type", Constraint::Length(9), |t: &Task| {
            t.task_type.clone()
        }),
        Column::new("Description", Constraint::Fill(1), |t: &Task| {
            t.task_description.clone()
        }),
        Column::badge("Status", Constraint::Length(10), |t: &Task| {
            t.task_status.clone()
        }),
        Column::new("Reward", Constraint::Length(10), |t: &Task| {
            t.reward_display().to_string()
        }),
        Column::new("Participants", Constraint::Length(12), |t: &Task| {
            t.participants_display().to_string()
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
    tabs::render_table(frame, chunks[1], "Tasks", &app.tasks, &columns());
    tabs::render_table_hints(
        frame,
        chunks[2],
        "[n]ew [e]dit [space] select [d]elete [x]port [/] search [f]ilters [s]ort",
    );
}
