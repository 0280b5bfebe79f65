use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::Reward;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<Reward>> {
    vec![
        Column::new("Reward Title", Constraint::Percentage(24), |r: &Reward| {
            r.title.clone()
        }),
        Column::new("Amount", Constraint::Length(10), |r: &Reward| {
            r.amount_display().to_string()
        }),
        Column::new("Beneficiary", Constraint::Fill(1), |r: &Reward| {
            r.beneficiary.clone()
        }),
        Column::new("Expiry", Constraint::Length(12), |r: &Reward| {
            r.expiry_date.clone().unwrap_or_default()
        }),
        Column::badge("Status", Constraint::Length(10), |r: &Reward| {
            r.status.clone()
        }),
        Column::new("Claim Rate", Constraint::Length(11), |r: &Reward| {
            r.claim_rate_display().to_string()
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
    tabs::render_table(frame, chunks[1], "Rewards", &app.rewards, &columns());
    tabs::render_table_hints(
        frame,
        chunks[2],
        "[n]ew [e]dit [space] select [d]elete [x]port [/] search [f]ilters",
    );
}
