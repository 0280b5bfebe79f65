use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{ActivityPoint, DashboardUser};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),  // Stat cards
            Constraint::Min(8),     // Lists + level chart
            Constraint::Length(4),  // Activity sparklines
        ])
        .split(area);

    render_stat_cards(frame, app, rows[0]);
    render_middle(frame, app, rows[1]);
    render_activity(frame, app, rows[2]);
}

fn render_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let stats = &app.dashboard;
    render_card(
        frame,
        cards[0],
        "Total Users",
        stats.user_totals.total_users,
        stats.user_totals.percentage_increase,
    );
    render_card(
        frame,
        cards[1],
        "New Users",
        stats.new_user_totals.total_new_users,
        stats.new_user_totals.percentage_increase,
    );
    render_card(
        frame,
        cards[2],
        "Total Coins Earned",
        stats.coin_totals.overall_total_coins,
        stats.coin_totals.percentage_increase,
    );
}

fn render_card(frame: &mut Frame, area: Rect, title: &str, value: i64, pct: f64) {
    let pct_span = if pct >= 0.0 {
        Span::styled(format!("▲ {:.1}%", pct), styles::success_style())
    } else {
        Span::styled(format!("▼ {:.1}%", pct.abs()), styles::error_style())
    };

    let lines = vec![
        Line::from(Span::styled(
            format_count(value),
            styles::title_style(),
        )),
        Line::from(pct_span),
    ];

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_middle(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);

    render_user_list(frame, columns[0], "New Users", &app.dashboard.new_users);
    render_user_list(frame, columns[1], "Leaderboard", &app.dashboard.leaderboard);
    render_level_chart(frame, app, columns[2]);
}

fn render_user_list(frame: &mut Frame, area: Rect, title: &str, users: &[DashboardUser]) {
    let max = (area.height as usize).saturating_sub(2);
    let lines: Vec<Line> = users
        .iter()
        .take(max)
        .map(|u| Line::from(Span::raw(format!(" {}", u.username))))
        .collect();

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_level_chart(frame: &mut Frame, app: &App, area: Rect) {
    let slices = &app.dashboard.user_levels;
    let max_users = slices.iter().map(|s| s.total_users).max().unwrap_or(0);
    let bar_width = (area.width as usize).saturating_sub(22).max(4);

    let lines: Vec<Line> = slices
        .iter()
        .take((area.height as usize).saturating_sub(2))
        .map(|slice| {
            let filled = if max_users > 0 {
                (slice.total_users as usize * bar_width) / max_users as usize
            } else {
                0
            };
            Line::from(vec![
                Span::styled(format!(" {:<12}", slice.level_name), styles::muted_style()),
                Span::styled("█".repeat(filled.max(1)), styles::highlight_style()),
                Span::raw(format!(" {}", slice.total_users)),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Users per Level ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_sparkline(
        frame,
        halves[0],
        "Coin Activity",
        &app.dashboard.recent_coin_activity,
    );
    render_sparkline(
        frame,
        halves[1],
        "User Activity",
        &app.dashboard.recent_user_activity,
    );
}

/// Eight-level unicode sparkline over the recent activity samples
fn render_sparkline(frame: &mut Frame, area: Rect, title: &str, points: &[ActivityPoint]) {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let max = points.iter().map(|p| p.data).fold(0.0_f64, f64::max);
    let width = (area.width as usize).saturating_sub(3);
    let spark: String = points
        .iter()
        .rev()
        .take(width)
        .rev()
        .map(|p| {
            if max <= 0.0 {
                BARS[0]
            } else {
                let idx = ((p.data / max) * (BARS.len() - 1) as f64).round() as usize;
                BARS[idx.min(BARS.len() - 1)]
            }
        })
        .collect();

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let line = Line::from(Span::styled(spark, styles::highlight_style()));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// 1_234_567 -> "1,234,567"
fn format_count(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(48210), "48,210");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(-1234), "-1,234");
    }
}
