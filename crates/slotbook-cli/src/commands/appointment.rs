//! Reservation commands and schedule queries.

use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use slotbook_core::{CalendarStore, Occupancy};

use super::{CommandResult, Context, Output};

#[derive(Subcommand)]
pub enum AppointmentAction {
    /// Reserve one or more slots for a client, all or nothing
    Book {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// Employee ID
        employee: String,
        /// Client ID
        client: String,
        /// Slot labels, e.g. 09:00 09:30
        #[arg(required = true, num_args = 1..)]
        slots: Vec<String>,
        /// Allow booking on a non-working day
        #[arg(long)]
        force: bool,
    },
    /// Hand a slot over to another client
    Reassign {
        date: NaiveDate,
        employee: String,
        slot: String,
        /// New client ID
        client: String,
    },
    /// Free a slot
    Release {
        date: NaiveDate,
        employee: String,
        slot: String,
    },
    /// Show the schedule of a day
    Day {
        date: NaiveDate,
        /// Limit to one employee
        #[arg(long)]
        employee: Option<String>,
    },
    /// List free slots of an employee on a day
    Free {
        date: NaiveDate,
        employee: String,
    },
    /// List every appointment of a client
    Client {
        client: String,
    },
}

#[derive(Serialize)]
struct SlotChange<'a> {
    date: NaiveDate,
    employee: &'a str,
    slot: &'a str,
    previous: &'a Occupancy,
}

#[derive(Serialize)]
struct EmployeeDay<'a> {
    employee: &'a str,
    slots: Vec<(&'a str, &'a Occupancy)>,
}

pub fn run(action: AppointmentAction, out: Output) -> CommandResult {
    let mut ctx = Context::open()?;

    match action {
        AppointmentAction::Book {
            date,
            employee,
            client,
            slots,
            force,
        } => {
            if !force {
                let mut calendar = CalendarStore::open()?;
                let working = calendar.day(date)?.is_some_and(|d| d.working_day);
                if !working {
                    return Err(format!("{date} is not a working day (use --force to book anyway)").into());
                }
            }
            let employee = ctx.employee_key(&employee)?;
            let client = ctx.client_key(&client)?;
            let reservation = ctx.book.reserve(date, &employee, &slots, &client)?;
            out.emit(&reservation, || {
                println!(
                    "booked {} on {} with {} for {}",
                    reservation.slots.join(", "),
                    reservation.date,
                    reservation.employee,
                    reservation.client
                );
            })?;
        }
        AppointmentAction::Reassign {
            date,
            employee,
            slot,
            client,
        } => {
            let employee = ctx.employee_key(&employee)?;
            let client = ctx.client_key(&client)?;
            let previous = ctx.book.reassign(date, &employee, &slot, &client)?;
            let change = SlotChange {
                date,
                employee: &employee,
                slot: &slot,
                previous: &previous,
            };
            out.emit(&change, || {
                println!("{slot} on {date} with {employee}: {previous} -> {client}");
            })?;
        }
        AppointmentAction::Release {
            date,
            employee,
            slot,
        } => {
            let employee = ctx.employee_key(&employee)?;
            let previous = ctx.book.release(date, &employee, &slot)?;
            let change = SlotChange {
                date,
                employee: &employee,
                slot: &slot,
                previous: &previous,
            };
            out.emit(&change, || {
                println!("{slot} on {date} with {employee}: {previous} -> free");
            })?;
        }
        AppointmentAction::Day { date, employee } => {
            let only = employee.map(|e| ctx.employee_key(&e)).transpose()?;
            let day = ctx.book.day(date);
            let rows: Vec<EmployeeDay> = day
                .employees()
                .filter(|(key, _)| only.as_deref().map_or(true, |o| o == *key))
                .map(|(employee, slots)| EmployeeDay {
                    employee,
                    slots: slots.iter().map(|(s, o)| (s.as_str(), o)).collect(),
                })
                .collect();
            out.emit(&rows, || {
                for row in &rows {
                    println!("{}", row.employee);
                    for (slot, occupancy) in &row.slots {
                        println!("  {slot}  {occupancy}");
                    }
                }
            })?;
        }
        AppointmentAction::Free { date, employee } => {
            let employee = ctx.employee_key(&employee)?;
            let free = ctx.book.free_slots(date, &employee)?;
            out.emit(&free, || {
                if free.is_empty() {
                    println!("no free slots");
                } else {
                    println!("{}", free.join(" "));
                }
            })?;
        }
        AppointmentAction::Client { client } => {
            // Deleted clients keep their history, so unknown IDs are still searched.
            let key = ctx.client_key(&client).unwrap_or(client);
            let appointments = ctx.book.appointments_for_client(&key);
            out.emit(&appointments, || {
                for a in &appointments {
                    println!("{}  {}  {}", a.date, a.slot, a.employee);
                }
            })?;
        }
    }
    Ok(())
}
