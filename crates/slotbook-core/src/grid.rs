//! Availability grid: date -> employee -> slot -> occupancy.
//!
//! The grid owns its days, each day owns its employee entries, and each
//! entry owns its slot occupancies in configured slot order. Days are
//! materialized lazily with every (roster employee x slot) pair `Free`.
//!
//! ## Slot states
//!
//! ```text
//! Free <-> Reserved(client)
//! ```
//!
//! The grid enforces shape only. Conflict rules live in
//! [`crate::reservation`]; identity rewrites live in [`crate::propagation`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScheduleError;

/// Persisted token for an unreserved slot.
pub const FREE_TOKEN: &str = "free";

/// State of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Occupancy {
    Free,
    Reserved(String),
}

impl Occupancy {
    pub fn reserved(client: impl Into<String>) -> Self {
        Occupancy::Reserved(client.into())
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Occupancy::Free)
    }

    /// Occupying client, if any.
    pub fn client(&self) -> Option<&str> {
        match self {
            Occupancy::Free => None,
            Occupancy::Reserved(client) => Some(client),
        }
    }

    /// Parse the persisted form: `"free"` or a client identifier.
    pub fn from_token(token: &str) -> Self {
        if token == FREE_TOKEN {
            Occupancy::Free
        } else {
            Occupancy::Reserved(token.to_string())
        }
    }

    pub fn as_token(&self) -> &str {
        match self {
            Occupancy::Free => FREE_TOKEN,
            Occupancy::Reserved(client) => client,
        }
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl Serialize for Occupancy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_token())
    }
}

impl<'de> Deserialize<'de> for Occupancy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Occupancy::from_token(&token))
    }
}

/// Slot label -> occupancy, in configured slot order.
pub type SlotMap = IndexMap<String, Occupancy>;

/// Persisted shape of the whole grid.
pub type GridDays = BTreeMap<NaiveDate, DaySchedule>;

/// One day of the grid: employee identifier -> slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySchedule {
    employees: IndexMap<String, SlotMap>,
}

impl DaySchedule {
    /// Every roster employee with every slot `Free`.
    pub fn materialize(roster: &[String], slots: &[String]) -> Self {
        let employees = roster
            .iter()
            .map(|employee| {
                let slots = slots
                    .iter()
                    .map(|slot| (slot.clone(), Occupancy::Free))
                    .collect();
                (employee.clone(), slots)
            })
            .collect();
        Self { employees }
    }

    pub fn employee(&self, employee: &str) -> Option<&SlotMap> {
        self.employees.get(employee)
    }

    pub fn contains_employee(&self, employee: &str) -> bool {
        self.employees.contains_key(employee)
    }

    pub fn employees(&self) -> impl Iterator<Item = (&str, &SlotMap)> {
        self.employees.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub(crate) fn employees_mut(&mut self) -> &mut IndexMap<String, SlotMap> {
        &mut self.employees
    }

    /// Build a day from raw entries, e.g. while hydrating persisted state.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, SlotMap)>) -> Self {
        Self {
            employees: entries.into_iter().collect(),
        }
    }
}

/// A reserved slot located in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub date: NaiveDate,
    pub employee: String,
    pub slot: String,
    pub client: String,
}

/// The per-day, per-employee, per-slot occupancy store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityGrid {
    roster: Vec<String>,
    slots: Vec<String>,
    days: GridDays,
}

impl AvailabilityGrid {
    /// Empty grid for a roster and slot set.
    pub fn new(roster: Vec<String>, slots: Vec<String>) -> Self {
        Self::with_days(roster, slots, GridDays::new())
    }

    /// Grid hydrated from persisted days.
    pub fn with_days(roster: Vec<String>, slots: Vec<String>, days: GridDays) -> Self {
        let mut grid = Self {
            roster: Vec::with_capacity(roster.len()),
            slots: Vec::with_capacity(slots.len()),
            days,
        };
        for employee in roster {
            grid.add_employee(employee);
        }
        for slot in slots {
            if !grid.slots.contains(&slot) {
                grid.slots.push(slot);
            }
        }
        grid
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn days(&self) -> &GridDays {
        &self.days
    }

    /// Materialized dates in chronological order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Read a day without materializing it.
    pub fn peek_day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.get(&date)
    }

    /// Every reservation held by `client`, in date order.
    pub fn appointments_for_client(&self, client: &str) -> Vec<Appointment> {
        let mut found = Vec::new();
        for (date, day) in &self.days {
            for (employee, slots) in day.employees() {
                for (slot, occupancy) in slots {
                    if occupancy.client() == Some(client) {
                        found.push(Appointment {
                            date: *date,
                            employee: employee.to_string(),
                            slot: slot.clone(),
                            client: client.to_string(),
                        });
                    }
                }
            }
        }
        found
    }

    // ── Day materialization ──────────────────────────────────────────

    /// Materialize `date` with the current roster if it is absent.
    pub fn ensure_day(&mut self, date: NaiveDate) {
        self.day_mut(date);
    }

    /// The day's schedule, materializing it first.
    pub fn day(&mut self, date: NaiveDate) -> &DaySchedule {
        self.day_mut(date)
    }

    pub(crate) fn day_mut(&mut self, date: NaiveDate) -> &mut DaySchedule {
        let Self { roster, slots, days } = self;
        days.entry(date).or_insert_with(|| {
            tracing::debug!(%date, employees = roster.len(), "materializing day");
            DaySchedule::materialize(roster.as_slice(), slots.as_slice())
        })
    }

    pub(crate) fn days_mut(&mut self) -> &mut GridDays {
        &mut self.days
    }

    // ── Slot access ──────────────────────────────────────────────────

    fn slot_mut(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
    ) -> Result<&mut Occupancy, ScheduleError> {
        if !self.slots.iter().any(|s| s == slot) {
            return Err(ScheduleError::SlotNotFound {
                slot: slot.to_string(),
            });
        }

        self.day_mut(date)
            .employees
            .get_mut(employee)
            .ok_or_else(|| ScheduleError::EmployeeNotFound {
                date,
                employee: employee.to_string(),
            })?
            .get_mut(slot)
            .ok_or_else(|| ScheduleError::SlotNotFound {
                slot: slot.to_string(),
            })
    }

    /// Current occupancy of a slot.
    ///
    /// # Errors
    ///
    /// `SlotNotFound` / `EmployeeNotFound` when the triple is outside the
    /// grid's structure.
    pub fn occupancy(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
    ) -> Result<&Occupancy, ScheduleError> {
        self.slot_mut(date, employee, slot).map(|o| &*o)
    }

    /// Whether the slot is available. Structural misses are errors, not `false`.
    pub fn is_slot_free(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
    ) -> Result<bool, ScheduleError> {
        self.occupancy(date, employee, slot).map(Occupancy::is_free)
    }

    /// Unconditional write. Returns the previous occupancy.
    pub fn set_slot(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
        occupancy: Occupancy,
    ) -> Result<Occupancy, ScheduleError> {
        let cell = self.slot_mut(date, employee, slot)?;
        Ok(std::mem::replace(cell, occupancy))
    }

    /// Free slot labels for an employee on a day, in slot order.
    pub fn free_slots(&mut self, date: NaiveDate, employee: &str) -> Result<Vec<String>, ScheduleError> {
        let slots = self
            .day(date)
            .employee(employee)
            .ok_or_else(|| ScheduleError::EmployeeNotFound {
                date,
                employee: employee.to_string(),
            })?;
        Ok(slots
            .iter()
            .filter(|(_, occupancy)| occupancy.is_free())
            .map(|(slot, _)| slot.clone())
            .collect())
    }

    /// Drop an employee's entry from one materialized day.
    ///
    /// Returns whether an entry was removed. Never materializes the day.
    pub fn remove_employee(&mut self, date: NaiveDate, employee: &str) -> bool {
        self.days
            .get_mut(&date)
            .and_then(|day| day.employees.shift_remove(employee))
            .is_some()
    }

    // ── Roster ───────────────────────────────────────────────────────

    /// Add an employee to the roster used for newly materialized days.
    /// Existing days are not back-filled.
    pub fn add_employee(&mut self, employee: impl Into<String>) -> bool {
        let employee = employee.into();
        if self.roster.contains(&employee) {
            return false;
        }
        self.roster.push(employee);
        true
    }

    /// Rename a roster entry in place.
    pub fn rename_in_roster(&mut self, from: &str, to: &str) -> bool {
        if self.roster.iter().any(|e| e == to) {
            return self.remove_from_roster(from);
        }
        match self.roster.iter_mut().find(|e| e.as_str() == from) {
            Some(entry) => {
                *entry = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_from_roster(&mut self, employee: &str) -> bool {
        let before = self.roster.len();
        self.roster.retain(|e| e != employee);
        self.roster.len() != before
    }
}
