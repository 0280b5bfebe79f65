use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Clan;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Clan>> {
    vec![
        Column::new("Clan Name", Constraint::Percentage(24), |c: &Clan| {
            c.name.clone()
        }),
        Column::new("Creator", Constraint::Percentage(18), |c: &Clan| {
            c.creator.clone()
        }),
        Column::new("Rank", Constraint::Length(6), |c: &Clan| c.rank.clone()),
        Column::new("Coins Earned", Constraint::Length(14), |c: &Clan| {
            c.coins_earned.to_string()
        }),
        Column::new("Created", Constraint::Fill(1), |c: &Clan| {
            c.created_at.clone().unwrap_or_default()
        }),
        Column::badge("Status", Constraint::Length(10), |c: &Clan| {
            c.status.clone()
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
    tabs::render_table(frame, chunks[1], "Clans", &app.clans, &columns());
    tabs::render_table_hints(
        frame,
        chunks[2],
        "[enter] detail [a]ction approve/disband/resume [x]port [/] search [f]ilters",
    );
}
