//! Spreadsheet export.
//!
//! Exports the currently filtered rows of a screen - all pages, not just
//! the visible one - to an `.xlsx` workbook with a fixed relabeling of
//! entity fields. Column specs live here so every screen exports the same
//! way the web console did.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::models::{Boost, Challenge, Clan, LeaderboardEntry, Level, Reward, Task, User};

/// One exported column: header label plus a field accessor
pub struct Column<T> {
    pub header: &'static str,
    accessor: fn(&T) -> String,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, accessor: fn(&T) -> String) -> Self {
        Self { header, accessor }
    }
}

/// Flatten rows through the column specs. Split out from the workbook
/// writing so the shape (row/column counts, cell values) is testable.
pub fn sheet_rows<T>(columns: &[Column<T>], rows: &[&T]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| columns.iter().map(|c| (c.accessor)(row)).collect())
        .collect()
}

/// Write a workbook with one sheet: a bold header row followed by one row
/// per (filtered) entity row.
pub fn write_workbook<T>(
    path: &Path,
    sheet_name: &str,
    columns: &[Column<T>],
    rows: &[&T],
) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(sheet_name)
        .context("Invalid worksheet name")?;

    let header_format = Format::new().set_bold();
    for (col, column) in columns.iter().enumerate() {
        sheet.write_with_format(0, col as u16, column.header, &header_format)?;
    }

    for (row_idx, row) in sheet_rows(columns, rows).iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            sheet.write((row_idx + 1) as u32, col_idx as u16, cell.as_str())?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Per-entity column specs
// ============================================================================

pub fn user_columns() -> Vec<Column<User>> {
    vec![
        Column::new("Username", |u: &User| u.username.clone()),
        Column::new("Level", |u: &User| u.level_name.clone()),
        Column::new("Coins Earned", |u: &User| u.coins_earned.to_string()),
        Column::new("Invites", |u: &User| u.invite_count.to_string()),
        Column::new("Registration Date", |u: &User| {
            u.registration_date.clone().unwrap_or_default()
        }),
        Column::new("Status", |u: &User| u.status_label().to_string()),
    ]
}

pub fn clan_columns() -> Vec<Column<Clan>> {
    vec![
        Column::new("Clan Name", |c: &Clan| c.name.clone()),
        Column::new("Creator", |c: &Clan| c.creator.clone()),
        Column::new("Rank", |c: &Clan| c.rank.clone()),
        Column::new("Coins Earned", |c: &Clan| c.coins_earned.to_string()),
        Column::new("Creation Date", |c: &Clan| {
            c.created_at.clone().unwrap_or_default()
        }),
        Column::new("Status", |c: &Clan| c.status.clone()),
    ]
}

pub fn task_columns() -> Vec<Column<Task>> {
    vec![
        Column::new("Task Name", |t: &Task| t.task_name.clone()),
        Column::new("Task Type", |t: &Task| t.task_type.clone()),
        Column::new("Description", |t: &Task| t.task_description.clone()),
        Column::new("Status", |t: &Task| t.task_status.clone()),
        Column::new("Reward", |t: &Task| t.reward_display().to_string()),
        Column::new("Participants", |t: &Task| {
            t.participants_display().to_string()
        }),
    ]
}

pub fn challenge_columns() -> Vec<Column<Challenge>> {
    vec![
        Column::new("Challenge Name", |c: &Challenge| c.name.clone()),
        Column::new("Description", |c: &Challenge| c.description.clone()),
        Column::new("Launch Date", |c: &Challenge| {
            c.launch_date.clone().unwrap_or_default()
        }),
        Column::new("Reward", |c: &Challenge| c.reward.to_string()),
        Column::new("Remaining Time", |c: &Challenge| c.remaining_time.clone()),
        Column::new("Participants", |c: &Challenge| {
            c.participant_count().to_string()
        }),
    ]
}

pub fn reward_columns() -> Vec<Column<Reward>> {
    vec![
        Column::new("Reward Title", |r: &Reward| r.title.clone()),
        Column::new("Reward", |r: &Reward| r.amount_display().to_string()),
        Column::new("Beneficiary", |r: &Reward| r.beneficiary.clone()),
        Column::new("Expiry Date", |r: &Reward| {
            r.expiry_date.clone().unwrap_or_default()
        }),
        Column::new("Status", |r: &Reward| r.status.clone()),
        Column::new("Claim Rate", |r: &Reward| {
            r.claim_rate_display().to_string()
        }),
    ]
}

pub fn level_columns() -> Vec<Column<Level>> {
    vec![
        Column::new("Level Name", |l: &Level| l.name.clone()),
        Column::new("Level", |l: &Level| l.level.to_string()),
        Column::new("Requirement", |l: &Level| {
            l.requirement_display().to_string()
        }),
    ]
}

pub fn boost_columns() -> Vec<Column<Boost>> {
    vec![
        Column::new("Booster Name", |b: &Boost| b.name.clone()),
        Column::new("Description", |b: &Boost| b.description.clone()),
        Column::new("Level", |b: &Boost| b.level_display().to_string()),
        Column::new("Effect", |b: &Boost| b.effect.clone()),
        Column::new("Upgrade Cost", |b: &Boost| {
            b.upgrade_cost_display().to_string()
        }),
        Column::new("Condition", |b: &Boost| b.condition.clone()),
    ]
}

pub fn leaderboard_columns() -> Vec<Column<LeaderboardEntry>> {
    vec![
        Column::new("Rank", |e: &LeaderboardEntry| e.rank.to_string()),
        Column::new("Username", |e: &LeaderboardEntry| e.username.clone()),
        Column::new("Level", |e: &LeaderboardEntry| e.level_name.clone()),
        Column::new("Coins Earned", |e: &LeaderboardEntry| {
            e.coins_earned.to_string()
        }),
        Column::new("Longest Streak", |e: &LeaderboardEntry| {
            e.longest_streak.to_string()
        }),
        Column::new("Clan", |e: &LeaderboardEntry| {
            e.clan.clone().unwrap_or_default()
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tasks() -> Vec<Task> {
        serde_json::from_str(
            r#"[
                {"id": "t1", "task_name": "Follow on X", "task_type": "social",
                 "task_status": "active", "task_reward": "2500", "task_participants": "1204"},
                {"id": "t2", "task_name": "Tap 1000 times", "task_type": "in-game",
                 "task_status": "paused", "task_reward": 500}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_sheet_rows_match_input_rows() {
        let tasks = sample_tasks();
        let refs: Vec<&Task> = tasks.iter().collect();
        let columns = task_columns();
        let rows = sheet_rows(&columns, &refs);

        // Exported row count equals the filtered row count, one cell per column
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == columns.len()));
        assert_eq!(rows[0][0], "Follow on X");
        assert_eq!(rows[1][4], "500");
        assert_eq!(rows[1][5], "-"); // missing participants
    }

    #[test]
    fn test_empty_filter_exports_empty_sheet() {
        let columns = task_columns();
        let rows = sheet_rows::<Task>(&columns, &[]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_write_workbook_to_disk() {
        let tasks = sample_tasks();
        let refs: Vec<&Task> = tasks.iter().collect();
        let path = std::env::temp_dir().join(format!("tapdeck-export-{}.xlsx", std::process::id()));

        write_workbook(&path, "Tasks", &task_columns(), &refs).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_all_entity_specs_have_headers() {
        assert!(!user_columns().is_empty());
        assert!(!clan_columns().is_empty());
        assert!(!challenge_columns().is_empty());
        assert!(!reward_columns().is_empty());
        assert!(!level_columns().is_empty());
        assert!(!boost_columns().is_empty());
        assert!(!leaderboard_columns().is_empty());
    }
}
