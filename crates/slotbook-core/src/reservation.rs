//! Slot reservation, reassignment and release.
//!
//! A batch reservation is all-or-nothing: every requested slot is checked
//! before any slot is written, so a conflict on the last slot leaves the
//! first ones untouched.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ScheduleError;
use crate::grid::{AvailabilityGrid, Occupancy};

/// A committed batch reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub date: NaiveDate,
    pub employee: String,
    pub client: String,
    pub slots: Vec<String>,
}

/// Conflict-enforcing writes against a borrowed grid.
///
/// The engine does not persist; [`crate::AppointmentBook`] flushes after
/// each call.
pub struct ReservationEngine<'g> {
    grid: &'g mut AvailabilityGrid,
}

impl<'g> ReservationEngine<'g> {
    pub fn new(grid: &'g mut AvailabilityGrid) -> Self {
        Self { grid }
    }

    /// Reserve every slot in `slots` for `client`, or none of them.
    ///
    /// Duplicate labels are collapsed, keeping first occurrence order.
    ///
    /// # Errors
    ///
    /// - `EmptyRequest` when `slots` is empty
    /// - `SlotNotFound` / `EmployeeNotFound` for structural misses
    /// - `Conflict` naming the first requested slot that is not free
    pub fn reserve<S: AsRef<str>>(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slots: &[S],
        client: &str,
    ) -> Result<Reservation, ScheduleError> {
        let mut requested: Vec<String> = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.as_ref();
            if !requested.iter().any(|s| s == slot) {
                requested.push(slot.to_string());
            }
        }

        if requested.is_empty() {
            return Err(ScheduleError::EmptyRequest {
                date,
                employee: employee.to_string(),
            });
        }

        self.grid.ensure_day(date);

        // Pre-check pass: nothing is written until every slot is known free.
        for slot in &requested {
            if !self.grid.is_slot_free(date, employee, slot)? {
                return Err(ScheduleError::Conflict {
                    date,
                    employee: employee.to_string(),
                    slot: slot.clone(),
                });
            }
        }

        for slot in &requested {
            self.grid
                .set_slot(date, employee, slot, Occupancy::reserved(client))?;
        }

        Ok(Reservation {
            date,
            employee: employee.to_string(),
            client: client.to_string(),
            slots: requested,
        })
    }

    /// Overwrite a slot's occupant without a free-check.
    ///
    /// Returns the previous occupancy.
    pub fn reassign(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
        client: &str,
    ) -> Result<Occupancy, ScheduleError> {
        self.grid.ensure_day(date);
        self.grid
            .set_slot(date, employee, slot, Occupancy::reserved(client))
    }

    /// Return a slot to `Free`. Returns the previous occupancy.
    pub fn release(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
    ) -> Result<Occupancy, ScheduleError> {
        self.grid.ensure_day(date);
        self.grid.set_slot(date, employee, slot, Occupancy::Free)
    }
}
