//! Date windows for the daily, weekly and monthly calendar views.
//!
//! Weeks are ISO weeks (Monday first). All dates are UTC calendar dates.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar view granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl ViewType {
    pub const ALL: [ViewType; 3] = [ViewType::Daily, ViewType::Weekly, ViewType::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Daily => "daily",
            ViewType::Weekly => "weekly",
            ViewType::Monthly => "monthly",
        }
    }

    /// Parse a query value, using `fallback` when it is missing or unknown.
    pub fn parse_or(raw: Option<&str>, fallback: ViewType) -> ViewType {
        raw.and_then(|v| v.parse().ok()).unwrap_or(fallback)
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view type '{0}' (expected daily, weekly or monthly)")]
pub struct UnknownViewType(pub String);

impl FromStr for ViewType {
    type Err = UnknownViewType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(ViewType::Daily),
            "weekly" | "week" => Ok(ViewType::Weekly),
            "monthly" | "month" => Ok(ViewType::Monthly),
            _ => Err(UnknownViewType(s.to_string())),
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window a view shows around `anchor`.
    pub fn for_view(view: ViewType, anchor: NaiveDate) -> Self {
        match view {
            ViewType::Daily => Self {
                start: anchor,
                end: anchor,
            },
            ViewType::Weekly => {
                let start = start_of_iso_week(anchor);
                Self {
                    start,
                    end: add_days(start, 6),
                }
            }
            ViewType::Monthly => Self::month_of(anchor),
        }
    }

    /// The whole month containing `anchor`.
    pub fn month_of(anchor: NaiveDate) -> Self {
        let start = first_of_month(anchor);
        let end = first_of_next_month(anchor).pred_opt().unwrap_or(start);
        Self { start, end }
    }

    /// First date after the window.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Inclusive lower bound in UTC milliseconds.
    pub fn start_ms(&self) -> i64 {
        midnight_ms(self.start)
    }

    /// Exclusive upper bound in UTC milliseconds.
    pub fn end_exclusive_ms(&self) -> i64 {
        midnight_ms(self.end_exclusive())
    }
}

fn midnight_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

fn sub_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

/// Monday of the ISO week containing `date`.
pub fn start_of_iso_week(date: NaiveDate) -> NaiveDate {
    sub_days(date, u64::from(date.weekday().num_days_from_monday()))
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

/// Parse a `YYYY-MM-DD` anchor, falling back to `today` on anything else.
pub fn parse_anchor(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(today)
}

/// Anchor of the window before the one containing `anchor`.
pub fn previous_anchor(view: ViewType, anchor: NaiveDate) -> NaiveDate {
    match view {
        ViewType::Daily => sub_days(anchor, 1),
        ViewType::Weekly => sub_days(anchor, 7),
        // chrono clamps the day to the target month's length.
        ViewType::Monthly => anchor.checked_sub_months(Months::new(1)).unwrap_or(anchor),
    }
}

/// Anchor of the window after the one containing `anchor`.
pub fn next_anchor(view: ViewType, anchor: NaiveDate) -> NaiveDate {
    match view {
        ViewType::Daily => add_days(anchor, 1),
        ViewType::Weekly => add_days(anchor, 7),
        ViewType::Monthly => anchor.checked_add_months(Months::new(1)).unwrap_or(anchor),
    }
}

/// Monday-first weeks covering the month of `anchor`; cells outside the month are `None`.
pub fn month_grid(anchor: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let month = DateWindow::month_of(anchor);
    let mut weeks = Vec::new();
    let mut week_start = start_of_iso_week(month.start);

    while week_start <= month.end {
        let mut week = [None; 7];
        for (offset, cell) in week.iter_mut().enumerate() {
            let day = add_days(week_start, offset as u64);
            if month.contains(day) {
                *cell = Some(day);
            }
        }
        weeks.push(week);

        let next = add_days(week_start, 7);
        if next == week_start {
            break;
        }
        week_start = next;
    }

    weeks
}
