//! # Slotbook Core Library
//!
//! This library provides the core logic for slotbook, an appointment book
//! for a small business that books clients with employees on a fixed grid of
//! daily time slots. The `slotbook` CLI is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Calendar**: per-year tables of dates with working-day flags, persisted
//!   once and read back afterwards
//! - **Grid**: date -> employee -> slot -> occupancy, materialized lazily
//! - **Reservation**: all-or-nothing batch booking, reassignment and release
//! - **Propagation**: rewrites the grid when a client or employee is renamed
//!   or deleted, never touching days before today on deletion
//! - **Storage**: JSON persistence with atomic replace and TOML configuration
//!
//! ## Key Components
//!
//! - [`AppointmentBook`]: owns the grid and flushes it after every change
//! - [`Directory`]: client/employee records that report changes to the book
//! - [`CalendarStore`]: cached year tables
//! - [`Config`]: slot labels and look-ahead

pub mod book;
pub mod calendar;
pub mod error;
pub mod grid;
pub mod identity;
pub mod propagation;
pub mod reservation;
pub mod storage;

pub use book::AppointmentBook;
pub use calendar::{CalendarDay, CalendarStore, MonthGrid};
pub use error::{ConfigError, CoreError, PersistenceError, ScheduleError, ValidationError};
pub use grid::{Appointment, AvailabilityGrid, DaySchedule, Occupancy};
pub use identity::{Directory, Person, PersonDraft, PersonPatch, Role};
pub use propagation::{IdentityEvent, IdentityObserver, PropagationEngine, PropagationReport};
pub use reservation::{Reservation, ReservationEngine};
pub use storage::{Config, GridStore, JsonGridStore, MemoryGridStore};
