//! The appointment book: one grid, one store, flushed after every change.
//!
//! Every mutating call snapshots the grid, applies the change, and saves the
//! whole grid. If the save fails the snapshot is restored, so the in-memory
//! grid always matches either the old or the new persisted state and the
//! operation can simply be retried.

use chrono::NaiveDate;

use crate::error::ScheduleError;
use crate::grid::{Appointment, AvailabilityGrid, DaySchedule, Occupancy};
use crate::propagation::{IdentityEvent, IdentityObserver, PropagationEngine, PropagationReport};
use crate::reservation::{Reservation, ReservationEngine};
use crate::storage::GridStore;

/// Source of "today" for history-preserving propagation.
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub struct AppointmentBook<S: GridStore> {
    grid: AvailabilityGrid,
    store: S,
    clock: Clock,
}

impl<S: GridStore> AppointmentBook<S> {
    /// Hydrate the grid from `store` with the given roster and slot set.
    pub fn open(store: S, roster: Vec<String>, slots: Vec<String>) -> Result<Self, ScheduleError> {
        let days = store.load()?;
        tracing::debug!(days = days.len(), employees = roster.len(), "opened appointment book");
        Ok(Self {
            grid: AvailabilityGrid::with_days(roster, slots, days),
            store,
            clock: local_today,
        })
    }

    /// Replace the clock, e.g. to pin "today" in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn grid(&self) -> &AvailabilityGrid {
        &self.grid
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// A day's schedule. Materializing a day is not a mutation worth a flush;
    /// it is persisted with the next change.
    pub fn day(&mut self, date: NaiveDate) -> &DaySchedule {
        self.grid.day(date)
    }

    pub fn is_slot_free(&mut self, date: NaiveDate, employee: &str, slot: &str) -> Result<bool, ScheduleError> {
        self.grid.is_slot_free(date, employee, slot)
    }

    pub fn free_slots(&mut self, date: NaiveDate, employee: &str) -> Result<Vec<String>, ScheduleError> {
        self.grid.free_slots(date, employee)
    }

    pub fn appointments_for_client(&self, client: &str) -> Vec<Appointment> {
        self.grid.appointments_for_client(client)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Run `change` against the grid and flush, restoring the previous grid
    /// if either step fails.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut AvailabilityGrid) -> Result<T, ScheduleError>,
    ) -> Result<T, ScheduleError> {
        let checkpoint = self.grid.clone();

        let outcome = match change(&mut self.grid) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.grid = checkpoint;
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&self.grid) {
            tracing::warn!(error = %e, "flush failed, rolling back schedule change");
            self.grid = checkpoint;
            return Err(e.into());
        }
        Ok(outcome)
    }

    /// Reserve `slots` for `client`, all or nothing.
    pub fn reserve<T: AsRef<str>>(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slots: &[T],
        client: &str,
    ) -> Result<Reservation, ScheduleError> {
        let reservation = self.commit(|grid| {
            ReservationEngine::new(grid).reserve(date, employee, slots, client)
        })?;
        tracing::info!(%date, employee, client, slots = ?reservation.slots, "reserved");
        Ok(reservation)
    }

    /// Overwrite a slot's occupant. Returns the previous occupancy.
    pub fn reassign(
        &mut self,
        date: NaiveDate,
        employee: &str,
        slot: &str,
        client: &str,
    ) -> Result<Occupancy, ScheduleError> {
        let previous = self.commit(|grid| {
            ReservationEngine::new(grid).reassign(date, employee, slot, client)
        })?;
        tracing::info!(%date, employee, slot, client, %previous, "reassigned");
        Ok(previous)
    }

    /// Free a slot. Returns the previous occupancy.
    pub fn release(&mut self, date: NaiveDate, employee: &str, slot: &str) -> Result<Occupancy, ScheduleError> {
        let previous = self.commit(|grid| ReservationEngine::new(grid).release(date, employee, slot))?;
        tracing::info!(%date, employee, slot, %previous, "released");
        Ok(previous)
    }

    /// Rewrite the grid for an identity event and flush.
    pub fn apply_identity_event(&mut self, event: &IdentityEvent) -> Result<PropagationReport, ScheduleError> {
        let engine = PropagationEngine::new(self.today());
        self.commit(|grid| engine.apply(grid, event))
    }
}

impl<S: GridStore> IdentityObserver for AppointmentBook<S> {
    fn identity_changed(&mut self, event: &IdentityEvent) -> Result<PropagationReport, ScheduleError> {
        self.apply_identity_event(event)
    }
}
