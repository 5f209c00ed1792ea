//! Read-only range queries backing the calendar views.

use super::Database;
use super::tasks::{TASK_COLUMNS, parse_task_row, query_tasks_with_subtasks};
use crate::calendar::DateWindow;
use crate::error::AppResult;
use crate::types::{Task, TaskWithSubtasks};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Which timestamp a range query filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimestampColumn {
    Created,
    Completed,
}

impl TimestampColumn {
    fn name(self) -> &'static str {
        match self {
            TimestampColumn::Created => "created_at",
            TimestampColumn::Completed => "completed_at",
        }
    }
}

/// Days of a month with at least one task created / completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveDays {
    pub created: BTreeSet<NaiveDate>,
    pub completed: BTreeSet<NaiveDate>,
}

impl ActiveDays {
    pub fn is_active(&self, day: NaiveDate) -> bool {
        self.created.contains(&day) || self.completed.contains(&day)
    }
}

/// Per-day task counts for the month grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub created: i64,
    pub completed: i64,
}

/// Distinct UTC dates of `column` inside the window.
fn distinct_days(
    conn: &Connection,
    column: TimestampColumn,
    window: &DateWindow,
) -> AppResult<BTreeSet<NaiveDate>> {
    Ok(count_by_day(conn, column, window)?.into_keys().collect())
}

fn count_by_day(
    conn: &Connection,
    column: TimestampColumn,
    window: &DateWindow,
) -> AppResult<BTreeMap<NaiveDate, i64>> {
    let column = column.name();
    let mut stmt = conn.prepare(&format!(
        "SELECT date({column} / 1000, 'unixepoch') AS day, COUNT(*)
         FROM tasks
         WHERE {column} >= ?1 AND {column} < ?2
         GROUP BY day"
    ))?;

    let rows = stmt
        .query_map(params![window.start_ms(), window.end_exclusive_ms()], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(collect_day_counts(column, rows))
}

/// Key `(day, count)` rows by date. Rows whose day is missing or malformed are
/// logged and left out.
fn collect_day_counts(
    column: &str,
    rows: impl IntoIterator<Item = (Option<String>, i64)>,
) -> BTreeMap<NaiveDate, i64> {
    let mut counts = BTreeMap::new();
    for (day, count) in rows {
        match day.as_deref().map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d")) {
            Some(Ok(date)) => {
                counts.insert(date, count);
            }
            Some(Err(e)) => {
                warn!(column, day = ?day, count, error = %e, "Skipping unparseable calendar day");
            }
            None => warn!(column, count, "Skipping calendar rows with no date"),
        }
    }
    counts
}

impl Database {
    /// Tasks created inside the window, newest first.
    pub fn tasks_created_in(&self, window: &DateWindow) -> AppResult<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE created_at >= ?1 AND created_at < ?2
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let tasks = stmt
                .query_map(
                    params![window.start_ms(), window.end_exclusive_ms()],
                    parse_task_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Tasks completed inside the window with their subtasks, newest-completed first.
    pub fn tasks_completed_in(&self, window: &DateWindow) -> AppResult<Vec<TaskWithSubtasks>> {
        self.with_conn(|conn| {
            query_tasks_with_subtasks(
                conn,
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE completed = 1 AND completed_at >= ?1 AND completed_at < ?2
                     ORDER BY completed_at DESC, id DESC"
                ),
                params![window.start_ms(), window.end_exclusive_ms()],
            )
        })
    }

    /// Distinct creation and completion days inside the window.
    pub fn active_days(&self, window: &DateWindow) -> AppResult<ActiveDays> {
        self.with_conn(|conn| {
            Ok(ActiveDays {
                created: distinct_days(conn, TimestampColumn::Created, window)?,
                completed: distinct_days(conn, TimestampColumn::Completed, window)?,
            })
        })
    }

    /// Created/completed counts per day inside the window. Days without activity are absent.
    pub fn day_stats(&self, window: &DateWindow) -> AppResult<BTreeMap<NaiveDate, DayStats>> {
        self.with_conn(|conn| {
            let mut stats: BTreeMap<NaiveDate, DayStats> = BTreeMap::new();
            for (day, count) in count_by_day(conn, TimestampColumn::Created, window)? {
                stats.entry(day).or_default().created = count;
            }
            for (day, count) in count_by_day(conn, TimestampColumn::Completed, window)? {
                stats.entry(day).or_default().completed = count;
            }
            Ok(stats)
        })
    }
}
