//! Identity change propagation.
//!
//! When a client or employee record is created, re-identified, or deleted,
//! the grid entries that reference it are rewritten here. Rules, in order:
//!
//! 1. Employee deleted: the employee's entry is removed from every day on or
//!    after today. Earlier days keep it.
//! 2. Client deleted: the client's slots on or after today become `Free`.
//! 3. Employee identifier changed: the entry moves to the new key on every
//!    day, past days included. Where the new key already has an entry (a
//!    re-issued ID whose history was kept), the two are merged slot by slot;
//!    a slot reserved on both sides rejects the whole change.
//! 4. Client identifier changed: every occurrence is relabeled on every day.
//!
//! Deletions never rewrite history; identifier changes relabel it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::grid::{AvailabilityGrid, Occupancy, SlotMap};
use crate::identity::Role;

/// A typed identity lifecycle event. Identifiers are grid keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum IdentityEvent {
    Created { role: Role, id: String },
    Updated { role: Role, before: String, after: String },
    Deleted { role: Role, id: String },
}

impl IdentityEvent {
    /// Classify a before/after snapshot pair. `None` when both are absent.
    pub fn from_snapshots(role: Role, before: Option<&str>, after: Option<&str>) -> Option<Self> {
        match (before, after) {
            (None, Some(id)) => Some(IdentityEvent::Created {
                role,
                id: id.to_string(),
            }),
            (Some(before), Some(after)) => Some(IdentityEvent::Updated {
                role,
                before: before.to_string(),
                after: after.to_string(),
            }),
            (Some(id), None) => Some(IdentityEvent::Deleted {
                role,
                id: id.to_string(),
            }),
            (None, None) => None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            IdentityEvent::Created { role, .. }
            | IdentityEvent::Updated { role, .. }
            | IdentityEvent::Deleted { role, .. } => *role,
        }
    }
}

/// Receives identity events from the directory.
///
/// Implementors must finish (persistence included) before returning; an
/// error aborts the identity mutation.
pub trait IdentityObserver {
    fn identity_changed(&mut self, event: &IdentityEvent) -> Result<PropagationReport, ScheduleError>;
}

/// What a propagation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    pub days_touched: usize,
    pub employee_entries_removed: usize,
    pub employee_entries_moved: usize,
    pub slots_freed: usize,
    pub slots_relabeled: usize,
    pub roster_changed: bool,
}

impl PropagationReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Applies identity events to a grid relative to `today`.
#[derive(Debug, Clone, Copy)]
pub struct PropagationEngine {
    today: NaiveDate,
}

impl PropagationEngine {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Rewrite `grid` for `event`.
    ///
    /// # Errors
    ///
    /// `MergeConflict` when an employee is renamed onto a key that holds a
    /// reservation in the same slot. The grid is left untouched.
    pub fn apply(
        &self,
        grid: &mut AvailabilityGrid,
        event: &IdentityEvent,
    ) -> Result<PropagationReport, ScheduleError> {
        let report = match event {
            IdentityEvent::Created { role: Role::Employee, id } => PropagationReport {
                roster_changed: grid.add_employee(id.as_str()),
                ..PropagationReport::default()
            },
            IdentityEvent::Created { role: Role::Client, .. } => PropagationReport::default(),
            IdentityEvent::Deleted { role: Role::Employee, id } => self.delete_employee(grid, id),
            IdentityEvent::Deleted { role: Role::Client, id } => self.delete_client(grid, id),
            IdentityEvent::Updated { before, after, .. } if before == after => {
                PropagationReport::default()
            }
            IdentityEvent::Updated { role: Role::Employee, before, after } => {
                rename_employee(grid, before, after)?
            }
            IdentityEvent::Updated { role: Role::Client, before, after } => {
                rename_client(grid, before, after)
            }
        };

        if !report.is_empty() {
            tracing::info!(?event, ?report, "propagated identity change");
        }
        Ok(report)
    }

    fn delete_employee(&self, grid: &mut AvailabilityGrid, employee: &str) -> PropagationReport {
        let mut report = PropagationReport {
            roster_changed: grid.remove_from_roster(employee),
            ..PropagationReport::default()
        };

        for (_, day) in grid.days_mut().range_mut(self.today..) {
            if day.employees_mut().shift_remove(employee).is_some() {
                report.employee_entries_removed += 1;
                report.days_touched += 1;
            }
        }
        report
    }

    fn delete_client(&self, grid: &mut AvailabilityGrid, client: &str) -> PropagationReport {
        let mut report = PropagationReport::default();

        for (_, day) in grid.days_mut().range_mut(self.today..) {
            let mut touched = false;
            for slots in day.employees_mut().values_mut() {
                for occupancy in slots.values_mut() {
                    if occupancy.client() == Some(client) {
                        *occupancy = Occupancy::Free;
                        report.slots_freed += 1;
                        touched = true;
                    }
                }
            }
            if touched {
                report.days_touched += 1;
            }
        }
        report
    }
}

fn rename_employee(
    grid: &mut AvailabilityGrid,
    from: &str,
    to: &str,
) -> Result<PropagationReport, ScheduleError> {
    check_mergeable(grid, from, to)?;

    let mut report = PropagationReport {
        roster_changed: grid.rename_in_roster(from, to),
        ..PropagationReport::default()
    };

    for (date, day) in grid.days_mut().iter_mut() {
        let employees = day.employees_mut();
        let Some(index) = employees.get_index_of(from) else {
            continue;
        };
        let Some((_, slots)) = employees.shift_remove_index(index) else {
            continue;
        };

        match employees.get_mut(to) {
            Some(target) => {
                tracing::info!(%date, from, to, "merging employee entries");
                merge_slots(target, slots);
            }
            None => {
                employees.shift_insert(index, to.to_string(), slots);
            }
        }
        report.employee_entries_moved += 1;
        report.days_touched += 1;
    }
    Ok(report)
}

/// Fails on the first day where `from` and `to` both reserve the same slot.
fn check_mergeable(grid: &AvailabilityGrid, from: &str, to: &str) -> Result<(), ScheduleError> {
    for (date, day) in grid.days() {
        let (Some(source), Some(target)) = (day.employee(from), day.employee(to)) else {
            continue;
        };
        let clash = source.iter().find(|(slot, occupancy)| {
            !occupancy.is_free() && target.get(*slot).is_some_and(|t| !t.is_free())
        });
        if let Some((slot, _)) = clash {
            return Err(ScheduleError::MergeConflict {
                date: *date,
                from: from.to_string(),
                into: to.to_string(),
                slot: slot.clone(),
            });
        }
    }
    Ok(())
}

/// Fill the target's free (or missing) slots from `source`.
fn merge_slots(target: &mut SlotMap, source: SlotMap) {
    for (slot, occupancy) in source {
        let cell = target.entry(slot).or_insert(Occupancy::Free);
        if cell.is_free() {
            *cell = occupancy;
        }
    }
}

fn rename_client(grid: &mut AvailabilityGrid, from: &str, to: &str) -> PropagationReport {
    let mut report = PropagationReport::default();

    for day in grid.days_mut().values_mut() {
        let mut touched = false;
        for slots in day.employees_mut().values_mut() {
            for occupancy in slots.values_mut() {
                if occupancy.client() == Some(from) {
                    *occupancy = Occupancy::reserved(to);
                    report.slots_relabeled += 1;
                    touched = true;
                }
            }
        }
        if touched {
            report.days_touched += 1;
        }
    }
    report
}
