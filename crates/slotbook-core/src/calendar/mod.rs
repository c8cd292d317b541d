//! Business calendar generation.
//!
//! A year is expanded into one [`CalendarDay`] per date. Every date is
//! emitted, weekends included; `working_day` is the single source of truth
//! for whether a date can be booked.
//!
//! ## Working-day rule
//!
//! Each date is placed in its month's Monday-first week grid ([`MonthGrid`]).
//! A date is a working day iff its cell in that grid is not padding (a
//! spillover day from the neighbouring month) and it falls Monday..Friday.
//!
//! ## Week numbering
//!
//! `week_of_month` is the date's row inside its month grid. `week` is a
//! running counter starting at 1 on January 1st that increments after every
//! Sunday, so it never resets at month boundaries.

mod store;

pub use store::CalendarStore;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Default look-ahead used when picking appointment dates.
pub const LOOK_AHEAD_DAYS: u32 = 14;

/// One row of a generated year table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// English weekday name ("Monday").
    pub weekday: String,
    /// English month name ("January").
    pub month: String,
    /// 1-based row of the date in its month grid.
    pub week_of_month: u32,
    /// 1-based week index across the whole year.
    pub week: u32,
    #[serde(with = "flag")]
    pub working_day: bool,
}

/// Monday-first layout of one month, one row per calendar week.
///
/// Cells outside the month are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<[Option<u32>; 7]>,
}

impl MonthGrid {
    /// Build the grid for `year`/`month`. Returns `None` for an invalid month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let offset = first.weekday().num_days_from_monday() as usize;
        let len = days_in_month(year, month)? as usize;

        let rows = (offset + len).div_ceil(7);
        let mut weeks = vec![[None; 7]; rows];
        for day in 1..=len {
            let cell = offset + day - 1;
            weeks[cell / 7][cell % 7] = Some(day as u32);
        }

        Some(Self { year, month, weeks })
    }

    /// 1-based row holding `day`, if the day belongs to this month.
    pub fn week_of(&self, day: u32) -> Option<u32> {
        self.weeks
            .iter()
            .position(|week| week.contains(&Some(day)))
            .map(|idx| idx as u32 + 1)
    }

    /// Whether the cell at (`week`, `weekday`) is a spillover cell.
    pub fn is_padding(&self, week: u32, weekday: Weekday) -> bool {
        let Some(row) = week.checked_sub(1).and_then(|i| self.weeks.get(i as usize)) else {
            return true;
        };
        row[weekday.num_days_from_monday() as usize].is_none()
    }
}

/// Number of days in `month`, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.signed_duration_since(first).num_days() as u32)
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Generate the full calendar table for `year`.
///
/// Deterministic: the same year always yields the same rows. Years chrono
/// cannot represent yield an empty table.
pub fn generate(year: i32) -> Vec<CalendarDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    let mut days = Vec::with_capacity(366);
    let mut grid: Option<MonthGrid> = None;
    let mut week = 1;

    for date in first.iter_days().take_while(|d| d.year() == year) {
        if grid.as_ref().map(|g| g.month) != Some(date.month()) {
            grid = MonthGrid::new(year, date.month());
        }
        let Some(month_grid) = grid.as_ref() else {
            break;
        };

        let weekday = date.weekday();
        let week_of_month = month_grid.week_of(date.day()).unwrap_or(1);
        let belongs_to_month = !month_grid.is_padding(week_of_month, weekday);

        days.push(CalendarDay {
            date,
            weekday: date.format("%A").to_string(),
            month: date.format("%B").to_string(),
            week_of_month,
            week,
            working_day: belongs_to_month && !is_weekend(weekday),
        });

        if weekday == Weekday::Sun {
            week += 1;
        }
    }

    days
}

/// Rows from `start` through `start + span - 1`, in date order.
pub fn window(days: &[CalendarDay], start: NaiveDate, span: u32) -> Vec<CalendarDay> {
    if span == 0 {
        return Vec::new();
    }
    let end = start
        .checked_add_days(Days::new(u64::from(span - 1)))
        .unwrap_or(NaiveDate::MAX);
    days.iter()
        .filter(|d| d.date >= start && d.date <= end)
        .cloned()
        .collect()
}

/// Working days of `month` within a year table.
pub fn working_days_in_month(days: &[CalendarDay], month: u32) -> Vec<CalendarDay> {
    days.iter()
        .filter(|d| d.date.month() == month && d.working_day)
        .cloned()
        .collect()
}

/// Serializes `bool` as `0`/`1`, matching the persisted table format.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "working_day must be 0 or 1, got {other}"
            ))),
        }
    }
}
