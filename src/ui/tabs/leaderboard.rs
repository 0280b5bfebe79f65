use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::App;
use crate::models::LeaderboardEntry;
use crate::ui::tabs::{self, Column};

fn columns() -> Vec<Column<LeaderboardEntry>> {
    vec![
        Column::new("Rank", Constraint::Length(6), |e: &LeaderboardEntry| {
            e.rank.to_string()
        }),
        Column::new(
            "Username",
            Constraint::Percentage(24),
            |e: &LeaderboardEntry| e.username.clone(),
        ),
        Column::new("Level", Constraint::Length(14), |e: &LeaderboardEntry| {
            e.level_name.clone()
        }),
        Column::new(
            "Coins Earned",
            Constraint::Length(14),
            |e: &LeaderboardEntry| e.coins_earned.to_string(),
        ),
        Column::new(
            "Longest Streak",
            Constraint::Length(15),
            |e: &LeaderboardEntry| e.longest_streak.to_string(),
        ),
        Column::new("Clan", Constraint::Fill(1), |e: &LeaderboardEntry| {
            e.clan.clone().unwrap_or_else(|| "-".to_string())
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
    tabs::render_table(frame, chunks[1], "Leaderboard", &app.leaderboard, &columns());
    tabs::render_table_hints(
        frame,
        chunks[2],
        "[enter] profile [g] period [x]port [/] search [s]ort",
    );
}
