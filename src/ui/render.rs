use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, DetailView, FilterMenuRow, Screen, SignInFocus};
use crate::models::User;

use super::styles;
use super::tabs::{boosts, challenges, clans, dashboard, leaderboard, levels, rewards, tasks, users};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Screen tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0]);
    render_screen_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::SigningIn => render_signin_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingAction => render_action_overlay(frame, app),
        AppState::EditingForm => render_form_overlay(frame, app),
        AppState::FilterMenu => render_filter_overlay(frame, app),
        AppState::GlobalSearch => render_search_overlay(frame, app),
        AppState::ShowingDetail => render_detail_overlay(frame, app),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  tapdeck";
    let help_hint = "[?] Help";

    let line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + help_hint.len() + 4),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_screen_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, screen) in Screen::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, screen.title());
        spans.push(Span::styled(label, styles::tab_style(*screen == app.screen)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Dashboard => dashboard::render(frame, app, area),
        Screen::Users => users::render(frame, app, area),
        Screen::Clans => clans::render(frame, app, area),
        Screen::Tasks => tasks::render(frame, app, area),
        Screen::Challenges => challenges::render(frame, app, area),
        Screen::Rewards => rewards::render(frame, app, area),
        Screen::Levels => levels::render(frame, app, area),
        Screen::Boosts => boosts::render(frame, app, area),
        Screen::Leaderboard => leaderboard::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[u]pdate | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if app.state == AppState::Searching {
        format!(" Search: {}▌ ", app.current_query())
    } else {
        let (filtered, total) = app.current_counts();
        let (page, pages, _) = app.current_page_info();
        let selected = app.current_selected_count();
        if app.screen == Screen::Dashboard {
            " Live ".to_string()
        } else if selected > 0 {
            format!(
                " {}/{} rows | page {}/{} | {} selected ",
                filtered, total, page, pages, selected
            )
        } else {
            format!(" {}/{} rows | page {}/{} ", filtered, total, page, pages)
        }
    };

    let right_text = format!(" {} ", shortcuts);
    let padding = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let style = if app
        .status_message
        .as_deref()
        .is_some_and(|m| m.starts_with("Error:"))
    {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let line = Line::from(vec![
        Span::styled(left_text, style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 24, frame.area());
    frame.render_widget(Clear, area);

    let key = styles::help_key_style();
    let desc = styles::help_desc_style();

    let lines = vec![
        Line::from(Span::styled(
            format!("  tapdeck {}", env!("CARGO_PKG_VERSION")),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        Line::from(vec![
            Span::styled("  1-9       ", key),
            Span::styled("Switch screens", desc),
        ]),
        Line::from(vec![
            Span::styled("  Tab       ", key),
            Span::styled("Next screen", desc),
        ]),
        Line::from(vec![
            Span::styled("  ↑/↓       ", key),
            Span::styled("Move cursor", desc),
        ]),
        Line::from(vec![
            Span::styled("  ←/→       ", key),
            Span::styled("Previous/next page", desc),
        ]),
        Line::from(vec![
            Span::styled("  +/-       ", key),
            Span::styled("Rows per page", desc),
        ]),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        Line::from(vec![
            Span::styled("  /         ", key),
            Span::styled("Search this screen", desc),
        ]),
        Line::from(vec![
            Span::styled("  f / F     ", key),
            Span::styled("Filters / clear filters", desc),
        ]),
        Line::from(vec![
            Span::styled("  g         ", key),
            Span::styled("Cycle scope tab", desc),
        ]),
        Line::from(vec![
            Span::styled("  space     ", key),
            Span::styled("Select row  ·  d delete selected", desc),
        ]),
        Line::from(vec![
            Span::styled("  n / e     ", key),
            Span::styled("Create / edit row", desc),
        ]),
        Line::from(vec![
            Span::styled("  a / b     ", key),
            Span::styled("Status action / ban user", desc),
        ]),
        Line::from(vec![
            Span::styled("  x         ", key),
            Span::styled("Export filtered rows to xlsx", desc),
        ]),
        Line::from(vec![
            Span::styled("  ctrl+s    ", key),
            Span::styled("Cross-entity search", desc),
        ]),
        Line::from(vec![
            Span::styled("  o         ", key),
            Span::styled("Sign out", desc),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "       Press ? or Esc to close",
            styles::muted_style(),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Help")), area);
}

fn render_signin_overlay(frame: &mut Frame, app: &App) {
    let height = if app.signin_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from(""), Line::from("")];

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{} [", label), styles::muted_style()),
            Span::styled(format!("{:<24}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    lines.push(field(
        "Username:",
        &app.signin_username,
        app.signin_focus == SignInFocus::Username,
    ));
    let masked: String = "*".repeat(app.signin_password.len().min(24));
    lines.push(field(
        "Password:",
        &masked,
        app.signin_focus == SignInFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.signin_focus == SignInFocus::Button;
    let button = if button_focused {
        " ▶ Sign In ◀ "
    } else {
        "   Sign In   "
    };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("             ["),
        Span::styled(button, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.signin_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Sign In")), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(42, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Quit")), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 8, frame.area());
    frame.render_widget(Clear, area);

    let count = app
        .pending_delete
        .as_ref()
        .map(|p| p.ids.len())
        .unwrap_or(0);
    let noun = if count == 1 { "row" } else { "rows" };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   Delete {} {}?", count, noun),
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "   This cannot be undone.",
            styles::muted_style(),
        )),
        Line::from(vec![
            Span::styled("   [Y] delete   ", styles::help_key_style()),
            Span::styled("[N] cancel", styles::help_key_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Delete")), area);
}

fn render_action_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let description = app
        .pending_action
        .as_ref()
        .map(|a| a.describe())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   Really {}", description),
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   [Y] confirm   ", styles::help_key_style()),
            Span::styled("[N] cancel", styles::help_key_style()),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block("Confirm")),
        area,
    );
}

fn render_form_overlay(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.form else {
        return;
    };

    let height = (form.fields.len() as u16) + if form.error.is_some() { 6 } else { 4 };
    let area = centered_rect_fixed(60, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:>13}: ", field.label), styles::muted_style()),
            Span::styled(format!("{}{}", field.value, cursor), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Enter] save   [Tab] next field   [Esc] cancel",
        styles::muted_style(),
    )));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(&form.title)),
        area,
    );
}

fn render_filter_overlay(frame: &mut Frame, app: &App) {
    let rows = app.filter_menu_rows();
    let area = centered_rect_fixed(36, rows.len() as u16 + 4, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![];
    for row in &rows {
        match row {
            FilterMenuRow::Group(title) => {
                lines.push(Line::from(Span::styled(
                    format!(" {}", title),
                    styles::highlight_style(),
                )));
            }
            FilterMenuRow::Option {
                label,
                active,
                selected,
            } => {
                let mark = if *active { "[x]" } else { "[ ]" };
                let style = if *selected {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                lines.push(Line::from(Span::styled(
                    format!("   {} {}", mark, label),
                    style,
                )));
            }
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [space] toggle  [F] clear  [Esc] close",
        styles::muted_style(),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(overlay_block("Filters")),
        area,
    );
}

fn render_search_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(60, 14, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from(vec![
        Span::styled(" Query: ", styles::muted_style()),
        Span::styled(
            format!("{}▌", app.search_query),
            styles::search_style(),
        ),
    ])];
    lines.push(Line::from(""));

    if app.search_hits.is_empty() {
        lines.push(Line::from(Span::styled(
            " No results yet - type a query and press Enter",
            styles::muted_style(),
        )));
    } else {
        // One matched record per category
        for (i, hit) in app.search_hits.iter().enumerate() {
            let style = if i == app.search_cursor {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let detail = hit.detail();
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<12}", hit.category_display()), styles::muted_style()),
                Span::styled(hit.label(), style),
                Span::styled(
                    if detail.is_empty() {
                        String::new()
                    } else {
                        format!("  {}", detail)
                    },
                    styles::muted_style(),
                ),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Enter] search  [Esc] close",
        styles::muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines).block(overlay_block("Search")), area);
}

fn render_detail_overlay(frame: &mut Frame, app: &App) {
    let Some(ref detail) = app.detail else {
        return;
    };

    let area = centered_rect_fixed(56, 18, frame.area());
    frame.render_widget(Clear, area);

    let (title, lines) = match detail {
        DetailView::User(user) => ("Profile", user_detail_lines(user)),
        DetailView::Clan { clan, top_earners } => {
            let mut lines = vec![
                detail_line("Name", &clan.name),
                detail_line("Creator", &clan.creator),
                detail_line("Rank", &clan.rank),
                detail_line("Coins", &clan.coins_earned.to_string()),
                detail_line("Status", &clan.status),
                Line::from(""),
                Line::from(Span::styled(" Top Earners", styles::highlight_style())),
            ];
            for earner in top_earners.iter().take(8) {
                lines.push(Line::from(Span::raw(format!(
                    "   {:<20} {}",
                    earner.username, earner.coins_earned
                ))));
            }
            ("Clan", lines)
        }
    };

    let mut lines = lines;
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [Esc] close",
        styles::muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines).block(overlay_block(title)), area);
}

fn detail_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<14}", label), styles::muted_style()),
        Span::raw(value.to_string()),
    ])
}

fn user_detail_lines(user: &User) -> Vec<Line<'_>> {
    let mut lines = vec![
        detail_line("Username", &user.username),
        detail_line("Telegram ID", &user.telegram_user_id),
        detail_line(
            "Level",
            &format!("{} (Lv {})", user.level_name, user.level),
        ),
        detail_line("Coins", &user.coins_earned.to_string()),
        detail_line("Invites", &user.invite_count.to_string()),
        detail_line("Status", user.status_label()),
        detail_line("Clan", user.clan_name()),
    ];

    if let Some(ref wallet) = user.wallet_address {
        lines.push(detail_line("Wallet", wallet));
    }
    if let Some(ref achievement) = user.overall_achievement {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Overall Achievement",
            styles::highlight_style(),
        )));
        lines.push(detail_line("Total Coin", &achievement.total_coin.to_string()));
        if let Some(tasks) = achievement.completed_tasks {
            lines.push(detail_line("Tasks Done", &tasks.to_string()));
        }
        if let Some(streak) = achievement.longest_streak {
            lines.push(detail_line("Best Streak", &streak.to_string()));
        }
    }

    lines
}
