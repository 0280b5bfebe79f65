use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::User;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<User>> {
    vec![
        Column::new("Username", Constraint::Percentage(22), |u: &User| {
            u.username.clone()
        }),
        Column::new("Level", Constraint::Length(14), |u: &User| {
            format!("{} (Lv {})", u.level_name, u.level)
        }),
        Column::new("Coins Earned", Constraint::Length(14), |u: &User| {
            u.coins_earned.to_string()
        }),
        Column::new("Invites", Constraint::Length(8), |u: &User| {
            u.invite_count.to_string()
        }),
        Column::new("Clan", Constraint::Fill(1), |u: &User| {
            u.clan_name().to_string()
        }),
        Column::badge("Status", Constraint::Length(10), |u: &User| {
            u.status_label().to_string()
        }),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    tabs::render_table(frame, chunks[0], "Users", &app.users, &columns());
    tabs::render_table_hints(
        frame,
        chunks[1],
        "[enter] profile [a]ction suspend/resume [x]port [/] search [f]ilters [s]ort",
    );
}
