//! Clients and employees.
//!
//! Both roles share one [`Person`] record. Role-specific presentation (ID
//! prefix, card color, title) comes from [`Role::profile`] rather than from
//! per-role types.
//!
//! [`Directory`] is the identity store for one role. Every create, update
//! and delete is written to disk first and then reported to an
//! [`IdentityObserver`], so the schedule is rewritten as part of the same
//! operation. If the observer fails, the previous file is written back; the
//! in-memory records only change once both steps succeeded.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::propagation::{IdentityEvent, IdentityObserver, PropagationReport};
use crate::storage::{data_dir, load_json, save_json};

/// Which kind of identity a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Employee,
}

/// Presentation attributes per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    pub prefix: &'static str,
    pub color: &'static str,
    pub title: &'static str,
    pub file_name: &'static str,
}

static CLIENT_PROFILE: RoleProfile = RoleProfile {
    prefix: "01-",
    color: "bright_green",
    title: "Client",
    file_name: "clients.json",
};

static EMPLOYEE_PROFILE: RoleProfile = RoleProfile {
    prefix: "02-",
    color: "cyan",
    title: "Employee",
    file_name: "employees.json",
};

impl Role {
    pub fn profile(self) -> &'static RoleProfile {
        match self {
            Role::Client => &CLIENT_PROFILE,
            Role::Employee => &EMPLOYEE_PROFILE,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Client => "client",
            Role::Employee => "employee",
        })
    }
}

/// Days after the birthday during which the gift stays active.
const GIFT_WINDOW_DAYS: u64 = 13;

/// A client or employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub role: Role,
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub phone: String,
}

/// Presentation-ready summary of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub title: String,
    pub subtitle: String,
    pub color: &'static str,
    pub fields: Vec<(String, String)>,
}

impl Person {
    /// Role prefix plus ID, e.g. `02-12345678`.
    pub fn internal_id(&self) -> String {
        format!("{}{}", self.role.profile().prefix, self.id)
    }

    /// Identifier used inside the availability grid.
    ///
    /// Employees are keyed by internal ID; clients by their plain ID.
    pub fn grid_key(&self) -> String {
        match self.role {
            Role::Employee => self.internal_id(),
            Role::Client => self.id.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }

    /// Age in whole years on `today`.
    pub fn age(&self, today: NaiveDate) -> u32 {
        let mut age = today.year() - self.dob.year();
        if (today.month(), today.day()) < (self.dob.month(), self.dob.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// This year's birthday. Feb 29 falls back to Feb 28 in common years.
    pub fn birthday_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.dob.month(), self.dob.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, self.dob.month(), self.dob.day() - 1))
    }

    /// True from the birthday through thirteen days after it.
    pub fn birthday_gift_active(&self, today: NaiveDate) -> bool {
        let Some(start) = self.birthday_in(today.year()) else {
            return false;
        };
        let end = start
            .checked_add_days(Days::new(GIFT_WINDOW_DAYS))
            .unwrap_or(start);
        start <= today && today <= end
    }

    pub fn card(&self, today: NaiveDate) -> Card {
        let profile = self.role.profile();
        Card {
            title: self.full_name(),
            subtitle: self.internal_id(),
            color: profile.color,
            fields: vec![
                ("Phone".to_string(), self.phone.clone()),
                ("Age".to_string(), format!("{} ({})", self.age(today), self.dob)),
                (
                    "Birthday Gift".to_string(),
                    if self.birthday_gift_active(today) {
                        "Active"
                    } else {
                        "Inactive"
                    }
                    .to_string(),
                ),
            ],
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [
            self.id.as_str(),
            self.internal_id().as_str(),
            self.full_name().as_str(),
            self.phone.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Raw field values for a new record.
#[derive(Debug, Clone, Default)]
pub struct PersonDraft {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub dob: String,
    pub phone: String,
}

/// Field updates; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PersonPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub phone: Option<String>,
}

fn validate_id(value: &str) -> Result<(), ValidationError> {
    if value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId)
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphabetic() || matches!(c, '-' | '\'' | ' ');
    if !value.trim().is_empty() && value.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName)
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

fn parse_dob(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate)
}

/// Identity store for one role, persisted as JSON.
#[derive(Debug)]
pub struct Directory {
    role: Role,
    path: PathBuf,
    people: Vec<Person>,
}

impl Directory {
    /// Open the role's directory inside the data directory.
    pub fn open(role: Role) -> Result<Self, CoreError> {
        let path = data_dir()?.join(role.profile().file_name);
        Self::load_from(role, path)
    }

    /// Open a directory backed by `path`. A missing file is an empty directory.
    pub fn load_from(role: Role, path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let people = load_json::<Vec<Person>>(&path)?.unwrap_or_default();
        Ok(Self { role, path, people })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Person] {
        &self.people
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    /// Grid keys of every record, e.g. the employee roster.
    pub fn grid_keys(&self) -> Vec<String> {
        self.people.iter().map(Person::grid_key).collect()
    }

    /// Case-insensitive substring search over ID, internal ID, name and phone.
    pub fn search(&self, query: &str) -> Vec<&Person> {
        let needle = query.trim().to_lowercase();
        self.people.iter().filter(|p| p.matches(&needle)).collect()
    }

    fn position(&self, id: &str) -> Result<usize, ValidationError> {
        self.people
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ValidationError::UnknownPerson {
                role: self.role.to_string(),
                id: id.to_string(),
            })
    }

    fn check_unique(&self, id: &str, phone: &str, skip: Option<usize>) -> Result<(), ValidationError> {
        let others = self
            .people
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != skip)
            .map(|(_, p)| p);
        for other in others {
            if other.id == id {
                return Err(ValidationError::DuplicateId);
            }
            if other.phone == phone {
                return Err(ValidationError::DuplicatePhone);
            }
        }
        Ok(())
    }

    /// Persist `next`, notify `observer`, then adopt `next` in memory.
    ///
    /// A failed write leaves both the file and the observer untouched. A
    /// failed notification writes the current records back.
    fn commit(
        &mut self,
        next: Vec<Person>,
        event: &IdentityEvent,
        observer: &mut dyn IdentityObserver,
    ) -> Result<PropagationReport, CoreError> {
        save_json(&self.path, &next)?;

        match observer.identity_changed(event) {
            Ok(report) => {
                self.people = next;
                Ok(report)
            }
            Err(e) => {
                if let Err(restore) = save_json(&self.path, &self.people) {
                    tracing::warn!(path = %self.path.display(), error = %restore, "could not restore directory after failed propagation");
                }
                Err(e.into())
            }
        }
    }

    /// Validate and add a record, persist it, then notify `observer`.
    pub fn create(
        &mut self,
        draft: PersonDraft,
        observer: &mut dyn IdentityObserver,
    ) -> Result<Person, CoreError> {
        validate_id(&draft.id)?;
        validate_name(&draft.name)?;
        validate_name(&draft.last_name)?;
        let dob = parse_dob(&draft.dob)?;
        validate_phone(&draft.phone)?;
        self.check_unique(&draft.id, &draft.phone, None)?;

        let person = Person {
            role: self.role,
            id: draft.id,
            name: draft.name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            dob,
            phone: draft.phone,
        };

        let mut next = self.people.clone();
        next.push(person.clone());
        let event = IdentityEvent::Created {
            role: self.role,
            id: person.grid_key(),
        };
        self.commit(next, &event, observer)?;
        tracing::info!(role = %self.role, id = %person.id, "registered");
        Ok(person)
    }

    /// Apply `patch` to the record with `id`, persist, then notify.
    pub fn update(
        &mut self,
        id: &str,
        patch: PersonPatch,
        observer: &mut dyn IdentityObserver,
    ) -> Result<(Person, PropagationReport), CoreError> {
        let idx = self.position(id)?;
        let before = self.people[idx].clone();
        let mut after = before.clone();

        if let Some(new_id) = patch.id {
            validate_id(&new_id)?;
            after.id = new_id;
        }
        if let Some(name) = patch.name {
            validate_name(&name)?;
            after.name = name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            validate_name(&last_name)?;
            after.last_name = last_name.trim().to_string();
        }
        if let Some(dob) = patch.dob {
            after.dob = parse_dob(&dob)?;
        }
        if let Some(phone) = patch.phone {
            validate_phone(&phone)?;
            after.phone = phone;
        }
        self.check_unique(&after.id, &after.phone, Some(idx))?;

        let mut next = self.people.clone();
        next[idx] = after.clone();
        let event = IdentityEvent::Updated {
            role: self.role,
            before: before.grid_key(),
            after: after.grid_key(),
        };
        let report = self.commit(next, &event, observer)?;
        tracing::info!(role = %self.role, id = %after.id, "updated");
        Ok((after, report))
    }

    /// Remove the record with `id`, persist, then notify.
    pub fn delete(
        &mut self,
        id: &str,
        observer: &mut dyn IdentityObserver,
    ) -> Result<(Person, PropagationReport), CoreError> {
        let idx = self.position(id)?;
        let mut next = self.people.clone();
        let removed = next.remove(idx);

        let event = IdentityEvent::Deleted {
            role: self.role,
            id: removed.grid_key(),
        };
        let report = self.commit(next, &event, observer)?;
        tracing::info!(role = %self.role, id = %removed.id, "deleted");
        Ok((removed, report))
    }
}
