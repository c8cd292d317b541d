//! Integration tests for booking against a JSON-backed appointment book.
//!
//! These tests drive the book through its public API and check both the
//! in-memory grid and what lands on disk.

use chrono::NaiveDate;
use slotbook_core::{AppointmentBook, GridStore, JsonGridStore, Occupancy, ScheduleError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open(path: &std::path::Path) -> AppointmentBook<JsonGridStore> {
    AppointmentBook::open(
        JsonGridStore::at(path),
        vec!["EMP-1".to_string()],
        vec!["09:00".to_string(), "09:30".to_string()],
    )
    .unwrap()
}

#[test]
fn test_conflicting_batch_leaves_second_slot_free() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let mut book = open(&path);
    let day = date(2025, 6, 10);

    book.reserve(day, "EMP-1", &["09:00"], "C-1").unwrap();

    let err = book
        .reserve(day, "EMP-1", &["09:00", "09:30"], "C-2")
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Conflict { ref slot, .. } if slot == "09:00"));
    assert!(book.is_slot_free(day, "EMP-1", "09:30").unwrap());

    // Disk agrees with memory.
    let on_disk = JsonGridStore::at(&path).load().unwrap();
    let slots = on_disk[&day].employee("EMP-1").unwrap();
    assert_eq!(slots["09:00"], Occupancy::reserved("C-1"));
    assert_eq!(slots["09:30"], Occupancy::Free);
}

#[test]
fn test_reserve_release_round_trip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let day = date(2025, 6, 10);

    {
        let mut book = open(&path);
        book.reserve(day, "EMP-1", &["09:30"], "C-1").unwrap();
    }

    let mut book = open(&path);
    assert!(!book.is_slot_free(day, "EMP-1", "09:30").unwrap());

    book.release(day, "EMP-1", "09:30").unwrap();
    assert!(book.is_slot_free(day, "EMP-1", "09:30").unwrap());

    let mut reopened = open(&path);
    assert!(reopened.is_slot_free(day, "EMP-1", "09:30").unwrap());
}

#[test]
fn test_unknown_slot_is_structural_error_not_busy() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = open(&dir.path().join("schedule.json"));

    let err = book
        .is_slot_free(date(2025, 6, 10), "EMP-1", "17:00")
        .unwrap_err();
    assert!(err.is_not_found());

    let err = book
        .reserve(date(2025, 6, 10), "EMP-9", &["09:00"], "C-1")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_failed_flush_keeps_memory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let mut book = open(&path);
    let day = date(2025, 6, 10);

    // A non-empty directory at the target path makes the rename fail.
    std::fs::create_dir_all(path.join("occupied")).unwrap();

    let err = book.reserve(day, "EMP-1", &["09:00"], "C-1").unwrap_err();
    assert!(matches!(err, ScheduleError::Persistence(_)));
    assert!(!book.grid().contains(day));

    // Once the path is clear the same booking goes through.
    std::fs::remove_dir_all(&path).unwrap();
    book.reserve(day, "EMP-1", &["09:00"], "C-1").unwrap();
    assert!(!book.is_slot_free(day, "EMP-1", "09:00").unwrap());
}

#[test]
fn test_malformed_schedule_file_loads_valid_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    std::fs::write(
        &path,
        r#"{"2025-06-10": {"EMP-1": {"09:00": "C-1", "09:30": null}}, "junk": 3}"#,
    )
    .unwrap();

    let mut book = open(&path);
    let day = date(2025, 6, 10);
    assert!(!book.is_slot_free(day, "EMP-1", "09:00").unwrap());
    // The malformed slot was dropped, so it is a structural miss.
    assert!(book.is_slot_free(day, "EMP-1", "09:30").unwrap_err().is_not_found());
    assert_eq!(book.grid().peek_day(day).unwrap().employees().count(), 1);
}

#[test]
fn test_reassign_moves_appointment_to_other_client() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = open(&dir.path().join("schedule.json"));
    let day = date(2025, 6, 10);

    book.reserve(day, "EMP-1", &["09:00", "09:30"], "C-1").unwrap();
    let previous = book.reassign(day, "EMP-1", "09:30", "C-2").unwrap();

    assert_eq!(previous.client(), Some("C-1"));
    assert_eq!(book.appointments_for_client("C-1").len(), 1);
    assert_eq!(book.appointments_for_client("C-2").len(), 1);
}
