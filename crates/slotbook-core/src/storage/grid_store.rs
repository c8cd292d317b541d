//! Persistence gateway for the availability grid.
//!
//! The grid is always written whole: `save` replaces the previous state.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;

use super::{data_dir, load_json, save_json};
use crate::error::{CoreError, PersistenceError};
use crate::grid::{AvailabilityGrid, DaySchedule, GridDays, Occupancy, SlotMap};

/// Grid file name inside the data directory.
const SCHEDULE_FILE: &str = "schedule.json";

/// Loads and saves the grid's persisted form.
pub trait GridStore {
    /// Persisted days. An absent store yields an empty map.
    fn load(&self) -> Result<GridDays, PersistenceError>;

    /// Replace the persisted state with `grid`.
    fn save(&mut self, grid: &AvailabilityGrid) -> Result<(), PersistenceError>;
}

/// JSON file store with atomic replace.
#[derive(Debug, Clone)]
pub struct JsonGridStore {
    path: PathBuf,
}

impl JsonGridStore {
    /// Store at `<data_dir>/schedule.json`.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::at(data_dir()?.join(SCHEDULE_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridStore for JsonGridStore {
    fn load(&self) -> Result<GridDays, PersistenceError> {
        let Some(raw) = load_json::<Value>(&self.path)? else {
            return Ok(GridDays::new());
        };

        match serde_json::from_value::<GridDays>(raw.clone()) {
            Ok(days) => Ok(days),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "schedule file is malformed, loading valid entries only");
                Ok(hydrate_lenient(&raw))
            }
        }
    }

    fn save(&mut self, grid: &AvailabilityGrid) -> Result<(), PersistenceError> {
        save_json(&self.path, grid.days())
    }
}

/// Rebuild the grid from a partially malformed document, skipping the
/// day, employee, or slot entries that do not have the expected shape.
fn hydrate_lenient(raw: &Value) -> GridDays {
    let mut days = GridDays::new();
    let Some(entries) = raw.as_object() else {
        tracing::warn!("schedule root is not an object, starting empty");
        return days;
    };

    for (key, value) in entries {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
            tracing::warn!(day = %key, "skipping day with invalid date key");
            continue;
        };
        let Some(employees) = value.as_object() else {
            tracing::warn!(day = %key, "skipping day that is not an object");
            continue;
        };

        let mut day = Vec::with_capacity(employees.len());
        for (employee, slots) in employees {
            let Some(slots) = slots.as_object() else {
                tracing::warn!(day = %key, employee = %employee, "skipping malformed employee entry");
                continue;
            };
            let slot_map: SlotMap = slots
                .iter()
                .filter_map(|(slot, value)| match value.as_str() {
                    Some(token) => Some((slot.clone(), Occupancy::from_token(token))),
                    None => {
                        tracing::warn!(day = %key, employee = %employee, slot = %slot, "skipping malformed slot");
                        None
                    }
                })
                .collect();
            day.push((employee.clone(), slot_map));
        }
        days.insert(date, DaySchedule::from_entries(day));
    }

    days
}

/// In-memory store for tests and embedding. Saves can be made to fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryGridStore {
    saved: Option<GridDays>,
    failing: bool,
    saves: usize,
}

impl MemoryGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that loads `days`.
    pub fn with_days(days: GridDays) -> Self {
        Self {
            saved: Some(days),
            ..Self::default()
        }
    }

    /// Make every following `save` fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Last successfully saved state.
    pub fn saved(&self) -> Option<&GridDays> {
        self.saved.as_ref()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl GridStore for MemoryGridStore {
    fn load(&self) -> Result<GridDays, PersistenceError> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, grid: &AvailabilityGrid) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Unavailable("memory store set to fail".to_string()));
        }
        self.saved = Some(grid.days().clone());
        self.saves += 1;
        Ok(())
    }
}
