//! Per-screen rendering.
//!
//! Every entity screen is the same table shell with different columns; the
//! shared renderer lives here and each screen module supplies its column
//! specs. The dashboard has its own layout.

pub mod boosts;
pub mod challenges;
pub mod clans;
pub mod dashboard;
pub mod leaderboard;
pub mod levels;
pub mod rewards;
pub mod tasks;
pub mod users;

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::table::TableView;
use crate::ui::styles;

/// One rendered column: header, width, and a cell formatter
pub struct Column<T> {
    pub header: &'static str,
    pub width: Constraint,
    pub cell: fn(&T) -> String,
    /// Style the cell as a status badge
    pub badge: bool,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, width: Constraint, cell: fn(&T) -> String) -> Self {
        Self {
            header,
            width,
            cell,
            badge: false,
        }
    }

    pub fn badge(header: &'static str, width: Constraint, cell: fn(&T) -> String) -> Self {
        Self {
            header,
            width,
            cell,
            badge: true,
        }
    }
}

/// Render the scope tab line shared by screens with tabs
pub fn render_scope_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let Some((labels, active)) = app.scope_tabs() else {
        return;
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::tab_style(i == active)));
    }
    spans.push(Span::styled("   [g] cycle", styles::muted_style()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Shared table shell: header row, current page of rows, selection markers,
/// and a footer with filtered/total counts and page position.
pub fn render_table<T>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    view: &TableView<T>,
    columns: &[Column<T>],
) {
    let mut header_cells = vec![Cell::from(" ")];
    header_cells.extend(columns.iter().map(|c| Cell::from(c.header)));
    let header = Row::new(header_cells).style(styles::title_style()).height(1);

    let page_rows = view.page_rows();
    let rows: Vec<Row> = page_rows
        .iter()
        .map(|&row| {
            let marker = if view.is_selected(row) { "●" } else { " " };
            let mut cells = vec![Cell::from(marker)];
            for column in columns {
                let text = (column.cell)(row);
                let cell = if column.badge {
                    Cell::from(Span::styled(text.clone(), styles::status_style(&text)))
                } else {
                    Cell::from(text)
                };
                cells.push(cell);
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(2)];
    widths.extend(columns.iter().map(|c| c.width));

    let mut extras = String::new();
    if !view.query.is_empty() {
        extras.push_str(&format!(" /{}", view.query));
    }
    if let Some((index, ascending)) = view.sort_state() {
        if let Some(column) = view.sort_columns.get(index) {
            let arrow = if ascending { "↑" } else { "↓" };
            extras.push_str(&format!(" sort:{}{}", column.label, arrow));
        }
    }
    if view.any_filter_active() {
        extras.push_str(" filtered");
    }
    let title = format!(
        " {} ({}/{}) - page {}/{}{} ",
        title,
        view.filtered_len(),
        view.total_rows(),
        view.page() + 1,
        view.page_count(),
        extras,
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !page_rows.is_empty() {
        state.select(Some(view.cursor.min(page_rows.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Footer hint line shown under entity tables
pub fn render_table_hints(frame: &mut Frame, area: Rect, hints: &str) {
    let line = Line::from(Span::styled(format!(" {}", hints), styles::muted_style()));
    frame.render_widget(Paragraph::new(line).style(Style::default()), area);
}
