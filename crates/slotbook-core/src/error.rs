//! Core error types for slotbook-core.
//!
//! This module defines the error hierarchy using thiserror. Each layer has
//! its own enum (schedule, persistence, configuration, validation) and
//! [`CoreError`] wraps them for callers that do not care which layer failed.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for slotbook-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Grid and reservation errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Storage errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identity validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors raised by the availability grid and the reservation engine.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The employee has no entry on that day (not on the roster, or removed).
    #[error("Employee '{employee}' is not part of the schedule on {date}")]
    EmployeeNotFound { date: NaiveDate, employee: String },

    /// The slot label is not part of the configured slot set.
    #[error("Slot '{slot}' is not part of the configured slot set")]
    SlotNotFound { slot: String },

    /// The slot is already reserved.
    #[error("Slot {slot} on {date} is already reserved for employee '{employee}'")]
    Conflict {
        date: NaiveDate,
        employee: String,
        slot: String,
    },

    /// Two employee entries cannot be merged because both hold the same slot.
    #[error("Cannot merge '{from}' into '{into}': slot {slot} on {date} is reserved for both")]
    MergeConflict {
        date: NaiveDate,
        from: String,
        into: String,
        slot: String,
    },

    /// A reservation request carried no slots.
    #[error("Reservation request for '{employee}' on {date} contains no slots")]
    EmptyRequest { date: NaiveDate, employee: String },

    /// The mutation was rolled back because the grid could not be flushed.
    #[error("Schedule could not be saved: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ScheduleError {
    /// True for structural lookups outside the configured roster or slot set.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScheduleError::EmployeeNotFound { .. } | ScheduleError::SlotNotFound { .. }
        )
    }

    /// True when the operator can recover by picking another slot.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ScheduleError::Conflict { .. } | ScheduleError::MergeConflict { .. }
        )
    }
}

/// Storage errors for the grid, the calendar tables and the directories.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing a file failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed
    #[error("Failed to encode data: {0}")]
    Encode(#[source] serde_json::Error),

    /// The file exists but is not valid
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Injected by test stores
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Identity field validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ID must be exactly 8 digits.")]
    InvalidId,

    #[error("Someone with this ID already exists.")]
    DuplicateId,

    #[error("Names may only contain letters, spaces, apostrophes ('), and hyphens (-).")]
    InvalidName,

    #[error("Phone number must be a 10-digit number.")]
    InvalidPhone,

    #[error("This phone number is already registered.")]
    DuplicatePhone,

    #[error("Date must be formatted YYYY-MM-DD.")]
    InvalidDate,

    #[error("No {role} with ID '{id}'.")]
    UnknownPerson { role: String, id: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
