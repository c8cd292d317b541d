pub mod appointment;
pub mod calendar;
pub mod config;
pub mod people;

use serde::Serialize;
use slotbook_core::{
    AppointmentBook, Config, CoreError, Directory, JsonGridStore, Role, ValidationError,
};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Output mode selected by the global `--json` flag.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as pretty JSON in JSON mode, otherwise run `text`.
    pub fn emit<T: Serialize>(self, value: &T, text: impl FnOnce()) -> CommandResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

/// Everything a command needs: config, both directories, and the book
/// built from the employee roster.
pub struct Context {
    pub config: Config,
    pub clients: Directory,
    pub employees: Directory,
    pub book: AppointmentBook<JsonGridStore>,
}

impl Context {
    pub fn open() -> Result<Self, CoreError> {
        let config = Config::load()?;
        let clients = Directory::open(Role::Client)?;
        let employees = Directory::open(Role::Employee)?;
        let book = AppointmentBook::open(
            JsonGridStore::open()?,
            employees.grid_keys(),
            config.slots.clone(),
        )?;
        Ok(Self {
            config,
            clients,
            employees,
            book,
        })
    }

    /// The directory for `role` together with the book it reports to.
    pub fn directory_and_book(
        &mut self,
        role: Role,
    ) -> (&mut Directory, &mut AppointmentBook<JsonGridStore>) {
        match role {
            Role::Client => (&mut self.clients, &mut self.book),
            Role::Employee => (&mut self.employees, &mut self.book),
        }
    }

    /// Grid key of a registered employee, by plain or internal ID.
    pub fn employee_key(&self, id: &str) -> Result<String, ValidationError> {
        lookup(&self.employees, id).map(|p| p.grid_key())
    }

    /// Grid key of a registered client, by plain or internal ID.
    pub fn client_key(&self, id: &str) -> Result<String, ValidationError> {
        lookup(&self.clients, id).map(|p| p.grid_key())
    }
}

/// Find a person by plain ID or by `NN-` prefixed internal ID.
pub fn lookup<'d>(directory: &'d Directory, id: &str) -> Result<&'d slotbook_core::Person, ValidationError> {
    let plain = id
        .strip_prefix(directory.role().profile().prefix)
        .unwrap_or(id);
    directory
        .get(plain)
        .ok_or_else(|| ValidationError::UnknownPerson {
            role: directory.role().to_string(),
            id: id.to_string(),
        })
}
