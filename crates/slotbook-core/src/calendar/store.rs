//! Per-year calendar tables persisted as `calendar/<year>.json`.
//!
//! A table is generated on first use and read back afterwards; once written
//! it is never regenerated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate};

use super::{generate, window, working_days_in_month, CalendarDay};
use crate::error::{CoreError, PersistenceError};
use crate::storage::{data_dir, load_json, save_json};

/// Cached access to the persisted year tables.
#[derive(Debug)]
pub struct CalendarStore {
    dir: PathBuf,
    cache: HashMap<i32, Vec<CalendarDay>>,
}

impl CalendarStore {
    /// Store rooted at `<data_dir>/calendar`.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::at(data_dir()?.join("calendar")))
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{year}.json"))
    }

    /// Load the table for `year`, generating and persisting it if absent.
    pub fn ensure_year(&mut self, year: i32) -> Result<&[CalendarDay], PersistenceError> {
        if !self.cache.contains_key(&year) {
            let path = self.path(year);
            let days = match load_json::<Vec<CalendarDay>>(&path)? {
                Some(days) => days,
                None => {
                    let days = generate(year);
                    save_json(&path, &days)?;
                    tracing::info!(year, rows = days.len(), "generated calendar table");
                    days
                }
            };
            self.cache.insert(year, days);
        }
        Ok(self.cache.get(&year).map(Vec::as_slice).unwrap_or_default())
    }

    /// `span` consecutive days starting at `today`, crossing into the next
    /// year's table when the window runs past December 31st.
    pub fn upcoming(&mut self, today: NaiveDate, span: u32) -> Result<Vec<CalendarDay>, PersistenceError> {
        let last = today
            .checked_add_days(Days::new(u64::from(span.saturating_sub(1))))
            .unwrap_or(today);

        let mut days = Vec::new();
        for year in today.year()..=last.year() {
            days.extend(window(self.ensure_year(year)?, today, span));
        }
        Ok(days)
    }

    /// Working days of `month` in `year`.
    pub fn working_days_in_month(&mut self, year: i32, month: u32) -> Result<Vec<CalendarDay>, PersistenceError> {
        Ok(working_days_in_month(self.ensure_year(year)?, month))
    }

    /// The table row for `date`, if the year table has one.
    pub fn day(&mut self, date: NaiveDate) -> Result<Option<CalendarDay>, PersistenceError> {
        Ok(self
            .ensure_year(date.year())?
            .iter()
            .find(|d| d.date == date)
            .cloned())
    }
}
