//! Directory mutations flowing through the appointment book to disk.

use chrono::NaiveDate;
use slotbook_core::{
    AppointmentBook, CoreError, Directory, GridStore, JsonGridStore, Occupancy, PersonDraft,
    PersonPatch, Role, ScheduleError,
};
use tempfile::TempDir;

const EMPLOYEE_ID: &str = "20000001";
const EMPLOYEE_KEY: &str = "02-20000001";
const CLIENT_ID: &str = "10000001";

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn today() -> NaiveDate {
    date(10)
}

struct Fixture {
    dir: TempDir,
    employees: Directory,
    clients: Directory,
    book: AppointmentBook<JsonGridStore>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let employees =
            Directory::load_from(Role::Employee, dir.path().join("employees.json")).unwrap();
        let clients = Directory::load_from(Role::Client, dir.path().join("clients.json")).unwrap();
        let book = AppointmentBook::open(
            JsonGridStore::at(dir.path().join("schedule.json")),
            employees.grid_keys(),
            vec!["09:00".into(), "09:30".into()],
        )
        .unwrap()
        .with_clock(today);

        let mut fixture = Self {
            dir,
            employees,
            clients,
            book,
        };
        fixture
            .employees
            .create(draft(EMPLOYEE_ID, "1100000001"), &mut fixture.book)
            .unwrap();
        fixture
            .clients
            .create(draft(CLIENT_ID, "1100000002"), &mut fixture.book)
            .unwrap();
        fixture
    }

    fn on_disk(&self) -> slotbook_core::grid::GridDays {
        JsonGridStore::at(self.dir.path().join("schedule.json"))
            .load()
            .unwrap()
    }

    /// Book the client at 09:00 on the 9th (past), 10th (today) and 11th.
    fn book_three_days(&mut self) {
        for d in [9, 10, 11] {
            self.book
                .reserve(date(d), EMPLOYEE_KEY, &["09:00"], CLIENT_ID)
                .unwrap();
        }
    }
}

fn draft(id: &str, phone: &str) -> PersonDraft {
    PersonDraft {
        id: id.into(),
        name: "Lucia".into(),
        last_name: "Moreno".into(),
        dob: "1990-05-17".into(),
        phone: phone.into(),
    }
}

#[test]
fn test_new_employee_is_bookable_on_new_days() {
    let mut fx = Fixture::new();
    assert_eq!(fx.book.grid().roster(), [EMPLOYEE_KEY]);
    assert!(fx.book.is_slot_free(date(12), EMPLOYEE_KEY, "09:30").unwrap());
}

#[test]
fn test_client_delete_frees_today_and_later_only() {
    let mut fx = Fixture::new();
    fx.book_three_days();

    let (_, report) = fx.clients.delete(CLIENT_ID, &mut fx.book).unwrap();
    assert_eq!(report.slots_freed, 2);

    let days = fx.on_disk();
    assert_eq!(
        days[&date(9)].employee(EMPLOYEE_KEY).unwrap()["09:00"],
        Occupancy::reserved(CLIENT_ID)
    );
    for d in [10, 11] {
        assert_eq!(
            days[&date(d)].employee(EMPLOYEE_KEY).unwrap()["09:00"],
            Occupancy::Free
        );
    }
    assert!(fx.clients.get(CLIENT_ID).is_none());
}

#[test]
fn test_employee_delete_keeps_past_entries() {
    let mut fx = Fixture::new();
    fx.book_three_days();

    let (_, report) = fx.employees.delete(EMPLOYEE_ID, &mut fx.book).unwrap();
    assert_eq!(report.employee_entries_removed, 2);
    assert!(report.roster_changed);

    let days = fx.on_disk();
    assert!(days[&date(9)].contains_employee(EMPLOYEE_KEY));
    assert!(!days[&date(10)].contains_employee(EMPLOYEE_KEY));
    assert!(!days[&date(11)].contains_employee(EMPLOYEE_KEY));

    // Newly materialized days no longer include the employee.
    assert!(fx
        .book
        .is_slot_free(date(20), EMPLOYEE_KEY, "09:00")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_client_id_change_relabels_history() {
    let mut fx = Fixture::new();
    fx.book_three_days();

    let patch = PersonPatch {
        id: Some("10000009".into()),
        ..PersonPatch::default()
    };
    let (_, report) = fx.clients.update(CLIENT_ID, patch, &mut fx.book).unwrap();
    assert_eq!(report.slots_relabeled, 3);

    assert!(fx.book.appointments_for_client(CLIENT_ID).is_empty());
    let moved = fx.book.appointments_for_client("10000009");
    assert_eq!(
        moved.iter().map(|a| a.date).collect::<Vec<_>>(),
        vec![date(9), date(10), date(11)]
    );
}

#[test]
fn test_employee_id_change_moves_entries_and_roster() {
    let mut fx = Fixture::new();
    fx.book_three_days();

    let patch = PersonPatch {
        id: Some("20000009".into()),
        ..PersonPatch::default()
    };
    let (_, report) = fx.employees.update(EMPLOYEE_ID, patch, &mut fx.book).unwrap();
    assert_eq!(report.employee_entries_moved, 3);
    assert_eq!(fx.book.grid().roster(), ["02-20000009"]);

    let days = fx.on_disk();
    for d in [9, 10, 11] {
        assert!(!days[&date(d)].contains_employee(EMPLOYEE_KEY));
        assert_eq!(
            days[&date(d)].employee("02-20000009").unwrap()["09:00"],
            Occupancy::reserved(CLIENT_ID)
        );
    }
}

#[test]
fn test_non_identifier_update_leaves_grid_alone() {
    let mut fx = Fixture::new();
    fx.book_three_days();
    let before = fx.book.grid().clone();

    let patch = PersonPatch {
        phone: Some("1199999999".into()),
        ..PersonPatch::default()
    };
    let (_, report) = fx.clients.update(CLIENT_ID, patch, &mut fx.book).unwrap();
    assert!(report.is_empty());
    assert_eq!(fx.book.grid(), &before);
}

#[test]
fn test_reopened_book_sees_directory_roster() {
    let fx = Fixture::new();
    let path = fx.dir.path().join("employees.json");

    let employees = Directory::load_from(Role::Employee, &path).unwrap();
    let mut book = AppointmentBook::open(
        JsonGridStore::at(fx.dir.path().join("schedule.json")),
        employees.grid_keys(),
        vec!["09:00".into()],
    )
    .unwrap();
    assert!(book.is_slot_free(date(15), EMPLOYEE_KEY, "09:00").unwrap());
}

#[test]
fn test_reissued_employee_id_keeps_past_history() {
    let mut fx = Fixture::new();
    fx.employees
        .create(draft("20000002", "1100000003"), &mut fx.book)
        .unwrap();
    fx.clients
        .create(draft("10000002", "1100000004"), &mut fx.book)
        .unwrap();

    fx.book
        .reserve(date(5), EMPLOYEE_KEY, &["09:00"], CLIENT_ID)
        .unwrap();
    fx.book
        .reserve(date(5), "02-20000002", &["09:30"], "10000002")
        .unwrap();

    fx.employees.delete(EMPLOYEE_ID, &mut fx.book).unwrap();
    let patch = PersonPatch {
        id: Some(EMPLOYEE_ID.into()),
        ..PersonPatch::default()
    };
    fx.employees.update("20000002", patch, &mut fx.book).unwrap();

    let days = fx.on_disk();
    let past = days[&date(5)].employee(EMPLOYEE_KEY).unwrap();
    assert_eq!(past["09:00"], Occupancy::reserved(CLIENT_ID));
    assert_eq!(past["09:30"], Occupancy::reserved("10000002"));
    assert!(!days[&date(5)].contains_employee("02-20000002"));
    assert_eq!(fx.book.appointments_for_client(CLIENT_ID).len(), 1);
}

#[test]
fn test_reissue_onto_overlapping_history_is_rejected() {
    let mut fx = Fixture::new();
    fx.employees
        .create(draft("20000002", "1100000003"), &mut fx.book)
        .unwrap();
    for employee in [EMPLOYEE_KEY, "02-20000002"] {
        fx.book
            .reserve(date(5), employee, &["09:00"], CLIENT_ID)
            .unwrap();
    }
    fx.employees.delete(EMPLOYEE_ID, &mut fx.book).unwrap();
    let before = fx.on_disk();

    let patch = PersonPatch {
        id: Some(EMPLOYEE_ID.into()),
        ..PersonPatch::default()
    };
    let err = fx
        .employees
        .update("20000002", patch, &mut fx.book)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Schedule(ScheduleError::MergeConflict { .. })
    ));

    assert!(fx.employees.get("20000002").is_some());
    assert_eq!(fx.on_disk(), before);
    let reloaded =
        Directory::load_from(Role::Employee, fx.dir.path().join("employees.json")).unwrap();
    assert_eq!(reloaded.grid_keys(), vec!["02-20000002"]);
}

#[test]
fn test_failed_directory_write_leaves_schedule_untouched() {
    let mut fx = Fixture::new();
    fx.book
        .reserve(date(12), EMPLOYEE_KEY, &["09:00"], CLIENT_ID)
        .unwrap();
    let before = fx.on_disk();

    let blocker = fx.dir.path().join("employees.json.tmp");
    std::fs::create_dir(&blocker).unwrap();

    let err = fx.employees.delete(EMPLOYEE_ID, &mut fx.book).unwrap_err();
    assert!(matches!(err, CoreError::Persistence(_)));
    assert!(fx.employees.get(EMPLOYEE_ID).is_some());
    assert_eq!(fx.book.grid().roster(), [EMPLOYEE_KEY]);
    assert_eq!(fx.on_disk(), before);

    // Once the write can go through, the same delete succeeds.
    std::fs::remove_dir(&blocker).unwrap();
    fx.employees.delete(EMPLOYEE_ID, &mut fx.book).unwrap();
    assert!(!fx.on_disk()[&date(12)].contains_employee(EMPLOYEE_KEY));
}
