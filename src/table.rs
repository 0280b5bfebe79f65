//! Generic table state shared by every entity screen.
//!
//! Each screen used to be a bespoke copy of the same fetch/filter/paginate
//! shape; `TableView` implements it once and is instantiated per entity with
//! field accessors. The visibility pipeline is fixed:
//!
//!   rows -> tab scope -> checkbox filter groups -> free-text search -> sort
//!
//! and pagination slices the result into fixed-size pages. Within a filter
//! group the checked options are OR-ed; across groups they are AND-ed; a
//! group with nothing checked passes every row.

use std::cmp::Ordering;
use std::collections::HashSet;

/// One checkbox in a filter dropdown
pub struct FilterOption<T> {
    pub label: &'static str,
    pub active: bool,
    pred: fn(&T) -> bool,
}

impl<T> FilterOption<T> {
    pub fn new(label: &'static str, pred: fn(&T) -> bool) -> Self {
        Self {
            label,
            active: false,
            pred,
        }
    }
}

/// One titled checkbox category
pub struct FilterGroup<T> {
    pub title: &'static str,
    pub options: Vec<FilterOption<T>>,
}

impl<T> FilterGroup<T> {
    pub fn new(title: &'static str, options: Vec<FilterOption<T>>) -> Self {
        Self { title, options }
    }

    fn passes(&self, row: &T) -> bool {
        let any_active = self.options.iter().any(|o| o.active);
        !any_active || self.options.iter().any(|o| o.active && (o.pred)(row))
    }
}

/// Sortable column with a comparator over rows
pub struct SortColumn<T> {
    pub label: &'static str,
    cmp: fn(&T, &T) -> Ordering,
}

impl<T> SortColumn<T> {
    pub fn new(label: &'static str, cmp: fn(&T, &T) -> Ordering) -> Self {
        Self { label, cmp }
    }
}

/// Default rows per page, matching the web console's table default
pub const DEFAULT_PAGE_SIZE: usize = 8;

pub struct TableView<T> {
    rows: Vec<T>,
    pub query: String,
    pub groups: Vec<FilterGroup<T>>,
    pub sort_columns: Vec<SortColumn<T>>,
    sort_index: Option<usize>,
    sort_ascending: bool,
    page: usize,
    page_size: usize,
    /// Cursor position within the current page
    pub cursor: usize,
    selected: HashSet<String>,
    id_of: fn(&T) -> String,
    search_fields: fn(&T) -> Vec<&str>,
    scope: Option<fn(&T) -> bool>,
}

impl<T> TableView<T> {
    pub fn new(id_of: fn(&T) -> String, search_fields: fn(&T) -> Vec<&str>) -> Self {
        Self {
            rows: Vec::new(),
            query: String::new(),
            groups: Vec::new(),
            sort_columns: Vec::new(),
            sort_index: None,
            sort_ascending: true,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: 0,
            selected: HashSet::new(),
            id_of,
            search_fields,
            scope: None,
        }
    }

    pub fn with_groups(mut self, groups: Vec<FilterGroup<T>>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_sort_columns(mut self, columns: Vec<SortColumn<T>>) -> Self {
        self.sort_columns = columns;
        self
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the fetched rows (last fetch wins). The page and cursor are
    /// clamped and selections referring to ids no longer present are pruned.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        let ids: HashSet<String> = rows.iter().map(|r| (self.id_of)(r)).collect();
        self.selected.retain(|id| ids.contains(id));
        self.rows = rows;
        self.clamp_position();
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Restrict visibility to rows matching the active tab (applied before
    /// filters and search). Pass None for an "all" tab.
    pub fn set_scope(&mut self, scope: Option<fn(&T) -> bool>) {
        self.scope = scope;
        self.page = 0;
        self.cursor = 0;
    }

    // =========================================================================
    // Visibility pipeline
    // =========================================================================

    fn is_visible(&self, row: &T) -> bool {
        if let Some(scope) = self.scope {
            if !scope(row) {
                return false;
            }
        }

        if !self.groups.iter().all(|g| g.passes(row)) {
            return false;
        }

        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        (self.search_fields)(row)
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }

    /// All rows surviving scope, filters, and search, in sort order.
    /// Export and pagination both consume this.
    pub fn filtered(&self) -> Vec<&T> {
        let mut visible: Vec<&T> = self.rows.iter().filter(|r| self.is_visible(r)).collect();

        if let Some(index) = self.sort_index {
            if let Some(column) = self.sort_columns.get(index) {
                visible.sort_by(|a, b| {
                    let ord = (column.cmp)(a, b);
                    if self.sort_ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                });
            }
        }

        visible
    }

    pub fn filtered_len(&self) -> usize {
        self.rows.iter().filter(|r| self.is_visible(r)).count()
    }

    // =========================================================================
    // Filters and search
    // =========================================================================

    pub fn set_query(&mut self, query: String) {
        self.query = query;
        self.page = 0;
        self.cursor = 0;
    }

    pub fn toggle_filter(&mut self, group: usize, option: usize) {
        if let Some(opt) = self
            .groups
            .get_mut(group)
            .and_then(|g| g.options.get_mut(option))
        {
            opt.active = !opt.active;
            self.page = 0;
            self.cursor = 0;
        }
    }

    pub fn clear_filters(&mut self) {
        for group in &mut self.groups {
            for option in &mut group.options {
                option.active = false;
            }
        }
        self.query.clear();
        self.page = 0;
        self.cursor = 0;
    }

    pub fn any_filter_active(&self) -> bool {
        !self.query.is_empty()
            || self
                .groups
                .iter()
                .any(|g| g.options.iter().any(|o| o.active))
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Toggle sort on a column: same column flips direction, a new column
    /// starts ascending. Resets the cursor.
    pub fn toggle_sort(&mut self, index: usize) {
        if index >= self.sort_columns.len() {
            return;
        }
        if self.sort_index == Some(index) {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_index = Some(index);
            self.sort_ascending = true;
        }
        self.cursor = 0;
    }

    pub fn sort_state(&self) -> Option<(usize, bool)> {
        self.sort_index.map(|i| (i, self.sort_ascending))
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages: ceil(filtered / page_size), at least 1
    pub fn page_count(&self) -> usize {
        let filtered = self.filtered_len();
        if filtered == 0 {
            1
        } else {
            filtered.div_ceil(self.page_size)
        }
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 0;
        self.cursor = 0;
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.cursor = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.cursor = 0;
        }
    }

    /// Rows on the current page, in display order
    pub fn page_rows(&self) -> Vec<&T> {
        let filtered = self.filtered();
        filtered
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Row under the cursor, if the page is non-empty
    pub fn cursor_row(&self) -> Option<&T> {
        self.page_rows().get(self.cursor).copied()
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        let len = self.page_rows().len();
        if len > 0 && self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    fn clamp_position(&mut self) {
        let pages = self.page_count();
        if self.page >= pages {
            self.page = pages - 1;
        }
        let len = self.page_rows().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggle selection of the row under the cursor
    pub fn toggle_select(&mut self) {
        if let Some(id) = self.cursor_row().map(|r| (self.id_of)(r)) {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
        }
    }

    pub fn is_selected(&self, row: &T) -> bool {
        self.selected.contains(&(self.id_of)(row))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Snapshot of the selected ids. Delete confirmations capture this at
    /// open time so a later selection change cannot alter what is deleted.
    pub fn selected_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        name: &'static str,
        kind: &'static str,
        status: &'static str,
    }

    fn row(id: &'static str, name: &'static str, kind: &'static str, status: &'static str) -> Row {
        Row {
            id,
            name,
            kind,
            status,
        }
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            row("1", "Follow on X", "social", "active"),
            row("2", "Tap 1000 times", "in-game", "active"),
            row("3", "Join the channel", "social", "paused"),
            row("4", "Invite a friend", "special", "inactive"),
            row("5", "Daily check-in", "in-game", "active"),
            row("6", "Retweet the pin", "social", "inactive"),
        ]
    }

    fn view() -> TableView<Row> {
        let mut view = TableView::new(
            |r: &Row| r.id.to_string(),
            |r: &Row| vec![r.name, r.kind, r.status],
        )
        .with_groups(vec![
            FilterGroup::new(
                "Status",
                vec![
                    FilterOption::new("Active", |r: &Row| r.status == "active"),
                    FilterOption::new("Inactive", |r: &Row| r.status == "inactive"),
                    FilterOption::new("Paused", |r: &Row| r.status == "paused"),
                ],
            ),
            FilterGroup::new(
                "Type",
                vec![
                    FilterOption::new("In-Game", |r: &Row| r.kind == "in-game"),
                    FilterOption::new("Social", |r: &Row| r.kind == "social"),
                    FilterOption::new("Special", |r: &Row| r.kind == "special"),
                ],
            ),
        ])
        .with_sort_columns(vec![SortColumn::new("Name", |a: &Row, b: &Row| {
            a.name.cmp(b.name)
        })]);
        view.set_rows(sample_rows());
        view
    }

    #[test]
    fn test_no_filters_passes_everything_through() {
        let view = view();
        assert_eq!(view.filtered_len(), view.total_rows());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let mut view = view();
        view.set_query("FOLLOW".to_string());
        assert_eq!(view.filtered_len(), 1);
        assert_eq!(view.filtered()[0].id, "1");

        // Matches any designated field, here the status column
        view.set_query("active".to_string());
        // "active" is a substring of "inactive" too
        assert_eq!(view.filtered_len(), 5);

        view.set_query("zzz".to_string());
        assert_eq!(view.filtered_len(), 0);
    }

    #[test]
    fn test_filters_or_within_and_across() {
        let mut view = view();

        // Status: Active OR Paused
        view.toggle_filter(0, 0);
        view.toggle_filter(0, 2);
        assert_eq!(view.filtered_len(), 4);

        // AND Type: Social
        view.toggle_filter(1, 1);
        let visible: Vec<&str> = view.filtered().iter().map(|r| r.id).collect();
        assert_eq!(visible, vec!["1", "3"]);

        view.clear_filters();
        assert_eq!(view.filtered_len(), 6);
    }

    #[test]
    fn test_scope_applies_before_filters() {
        let mut view = view();
        view.set_scope(Some(|r: &Row| r.kind == "social"));
        assert_eq!(view.filtered_len(), 3);

        view.toggle_filter(0, 1); // Inactive
        let visible: Vec<&str> = view.filtered().iter().map(|r| r.id).collect();
        assert_eq!(visible, vec!["6"]);
    }

    #[test]
    fn test_page_count_is_ceil_of_filtered() {
        let mut view = view();
        view.set_page_size(5);
        assert_eq!(view.page_count(), 2); // ceil(6/5)
        view.set_page_size(2);
        assert_eq!(view.page_count(), 3);
        view.set_page_size(6);
        assert_eq!(view.page_count(), 1);

        view.set_query("nothing-matches".to_string());
        assert_eq!(view.page_count(), 1); // empty result still renders one page
    }

    #[test]
    fn test_pages_partition_filtered_rows() {
        let mut view = view();
        view.set_page_size(4);

        let mut seen: Vec<&str> = Vec::new();
        for _ in 0..view.page_count() {
            seen.extend(view.page_rows().iter().map(|r| r.id));
            view.next_page();
        }

        let expected: Vec<&str> = view.filtered().iter().map(|r| r.id).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_next_page_stops_at_last() {
        let mut view = view();
        view.set_page_size(4);
        view.next_page();
        assert_eq!(view.page(), 1);
        view.next_page();
        assert_eq!(view.page(), 1); // already on the last page
        view.prev_page();
        view.prev_page();
        assert_eq!(view.page(), 0);
    }

    #[test]
    fn test_sort_toggle_flips_direction() {
        let mut view = view();
        view.toggle_sort(0);
        let first = view.filtered()[0].name;
        assert_eq!(first, "Daily check-in");

        view.toggle_sort(0);
        let first = view.filtered()[0].name;
        assert_eq!(first, "Tap 1000 times");
        assert_eq!(view.sort_state(), Some((0, false)));
    }

    #[test]
    fn test_selection_toggle_and_snapshot() {
        let mut view = view();
        view.toggle_select(); // row "1"
        view.cursor_down();
        view.toggle_select(); // row "2"
        assert_eq!(view.selected_count(), 2);
        assert_eq!(view.selected_ids(), vec!["1", "2"]);

        // Snapshot is unaffected by later cursor movement or toggles
        let snapshot = view.selected_ids();
        view.toggle_select(); // deselect "2"
        assert_eq!(view.selected_count(), 1);
        assert_eq!(snapshot, vec!["1", "2"]);
    }

    #[test]
    fn test_refetch_prunes_stale_selection() {
        let mut view = view();
        view.toggle_select(); // "1"
        view.cursor_down();
        view.toggle_select(); // "2"

        // Re-fetch returns a list without row "2"
        let rows: Vec<Row> = sample_rows().into_iter().filter(|r| r.id != "2").collect();
        view.set_rows(rows);
        assert_eq!(view.selected_ids(), vec!["1"]);
    }

    #[test]
    fn test_cursor_row_tracks_page() {
        let mut view = view();
        view.set_page_size(2);
        assert_eq!(view.cursor_row().unwrap().id, "1");
        view.next_page();
        assert_eq!(view.cursor_row().unwrap().id, "3");
        view.cursor_down();
        assert_eq!(view.cursor_row().unwrap().id, "4");
        // Cursor clamped at page end
        view.cursor_down();
        assert_eq!(view.cursor_row().unwrap().id, "4");
    }

    #[test]
    fn test_example_scenario_social_tab_paging() {
        // 12 tasks, "Social" tab selected, 5 rows per page -> 3 pages
        let mut rows = Vec::new();
        for i in 0..12 {
            let id: &'static str = Box::leak(format!("t{}", i).into_boxed_str());
            rows.push(row(id, "Task", "social", "active"));
        }
        let mut view = TableView::new(
            |r: &Row| r.id.to_string(),
            |r: &Row| vec![r.name, r.kind, r.status],
        );
        view.set_rows(rows);
        view.set_scope(Some(|r: &Row| r.kind == "social"));
        view.set_page_size(5);
        assert_eq!(view.page_count(), 3);
        assert_eq!(view.page_rows().len(), 5);
    }
}
