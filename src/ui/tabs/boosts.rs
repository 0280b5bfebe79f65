use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Boost;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Boost>> {
    vec![
        Column::new("Booster", Constraint::Percentage(20), |b: &Boost| {
            b.name.clone()
        }),
        Column::new("Description", Constraint::Fill(1), |b: &Boost| {
            b.description.clone()
        }),
        Column::new("Level", Constraint::Length(7), |b: &Boost| {
            b.level_display().to_string()
        }),
        Column::new("Effect", Constraint::Percentage(18), |b: &Boost| {
            b.effect.clone()
        }),
        Column::new("Upgrade Cost", Constraint::Length(13), |b: &Boost| {
            b.upgrade_cost_display().to_string()
        }),
        Column::new("Condition", Constraint::Percentage(15), |b: &Boost| {
            b.condition.clone()
        }),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    tabs::render_table(frame, chunks[0], "Boosts", &app.boosts, &columns());
    tabs::render_table_hints(
        frame,
        chunks[1],
        "[n]ew [e]dit [c]ost [space] select [d]elete [x]port [/] search",
    );
}
