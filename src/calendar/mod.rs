//! Calendar aggregation: windows, navigation and the report the views render.

pub mod window;

pub use window::{
    DateWindow, UnknownViewType, ViewType, month_grid, next_anchor, parse_anchor, previous_anchor,
};

use crate::db::Database;
use crate::db::calendar::{ActiveDays, DayStats};
use crate::error::AppResult;
use crate::types::{Task, TaskWithSubtasks};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything a calendar page needs for one `(view, anchor)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarReport {
    pub view: ViewType,
    pub anchor: NaiveDate,
    pub window: DateWindow,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    /// Tasks created inside `window`, newest first.
    pub created: Vec<Task>,
    /// Tasks completed inside `window`, newest-completed first.
    pub completed: Vec<TaskWithSubtasks>,
    /// Active days of the anchor's month, whatever the view.
    pub active_days: ActiveDays,
    pub day_stats: BTreeMap<NaiveDate, DayStats>,
    pub month_grid: Vec<[Option<NaiveDate>; 7]>,
}

impl CalendarReport {
    /// Compute the window for `view` around `anchor` and run the read queries.
    pub fn build(db: &Database, view: ViewType, anchor: NaiveDate) -> AppResult<Self> {
        let window = DateWindow::for_view(view, anchor);
        let month = DateWindow::month_of(anchor);

        let created = db.tasks_created_in(&window)?;
        let completed = db.tasks_completed_in(&window)?;
        let active_days = db.active_days(&month)?;
        let day_stats = db.day_stats(&month)?;

        debug!(
            view = %view,
            start = %window.start,
            end = %window.end,
            created = created.len(),
            completed = completed.len(),
            "Calendar report built"
        );

        Ok(Self {
            view,
            anchor,
            window,
            previous: previous_anchor(view, anchor),
            next: next_anchor(view, anchor),
            created,
            completed,
            active_days,
            day_stats,
            month_grid: month_grid(anchor),
        })
    }

    /// Window title such as `March 2024`, `2024-03-11 to 2024-03-17` or `Thursday, 2024-03-14`.
    pub fn title(&self) -> String {
        match self.view {
            ViewType::Daily => self.anchor.format("%A, %Y-%m-%d").to_string(),
            ViewType::Weekly => format!("{} to {}", self.window.start, self.window.end),
            ViewType::Monthly => self.anchor.format("%B %Y").to_string(),
        }
    }
}
