//! Client and employee record commands.
//!
//! Both roles share one action set; the role decides which directory is
//! used. Every mutation is reported to the appointment book.

use clap::Subcommand;
use slotbook_core::identity::Card;
use slotbook_core::{Person, PersonDraft, PersonPatch, PropagationReport, Role};

use super::{lookup, CommandResult, Context, Output};

#[derive(Subcommand)]
pub enum PersonAction {
    /// Register a new record
    Add {
        /// 8-digit ID
        id: String,
        /// First name
        #[arg(long)]
        name: String,
        /// Last name
        #[arg(long)]
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        /// 10-digit phone number
        #[arg(long)]
        phone: String,
    },
    /// List all records
    List,
    /// Show one record as a card
    Show {
        /// Plain or prefixed ID
        id: String,
    },
    /// Update fields of a record
    Update {
        /// Current ID
        id: String,
        /// New 8-digit ID
        #[arg(long)]
        new_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a record
    Delete {
        /// Plain or prefixed ID
        id: String,
    },
    /// Case-insensitive search over ID, name and phone
    Search {
        query: String,
    },
}

pub fn run(role: Role, action: PersonAction, out: Output) -> CommandResult {
    let mut ctx = Context::open()?;
    let today = ctx.book.today();

    match action {
        PersonAction::Add {
            id,
            name,
            last_name,
            dob,
            phone,
        } => {
            let draft = PersonDraft {
                id,
                name,
                last_name,
                dob,
                phone,
            };
            let (directory, book) = ctx.directory_and_book(role);
            let person = directory.create(draft, book)?;
            out.emit(&person, || {
                println!("{} registered: {}", role.profile().title, person.internal_id());
            })?;
        }
        PersonAction::List => {
            let (directory, _) = ctx.directory_and_book(role);
            let people = directory.list();
            out.emit(&people, || print_rows(people.iter()))?;
        }
        PersonAction::Show { id } => {
            let (directory, _) = ctx.directory_and_book(role);
            let card = lookup(directory, &id)?.card(today);
            out.emit(&card, || print_card(&card))?;
        }
        PersonAction::Update {
            id,
            new_id,
            name,
            last_name,
            dob,
            phone,
        } => {
            let patch = PersonPatch {
                id: new_id,
                name,
                last_name,
                dob,
                phone,
            };
            let (directory, book) = ctx.directory_and_book(role);
            let current = lookup(directory, &id)?.id.clone();
            let (person, report) = directory.update(&current, patch, book)?;
            out.emit(&MutationOutput::new(&person, &report), || {
                println!("{} updated: {}", role.profile().title, person.internal_id());
                print_report(&report);
            })?;
        }
        PersonAction::Delete { id } => {
            let (directory, book) = ctx.directory_and_book(role);
            let current = lookup(directory, &id)?.id.clone();
            let (person, report) = directory.delete(&current, book)?;
            out.emit(&MutationOutput::new(&person, &report), || {
                println!("{} deleted: {}", role.profile().title, person.internal_id());
                print_report(&report);
            })?;
        }
        PersonAction::Search { query } => {
            let (directory, _) = ctx.directory_and_book(role);
            let found = directory.search(&query);
            out.emit(&found, || {
                if found.is_empty() {
                    println!("no matches for '{query}'");
                } else {
                    print_rows(found.iter().copied());
                }
            })?;
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct MutationOutput<'a> {
    person: &'a Person,
    propagation: &'a PropagationReport,
}

impl<'a> MutationOutput<'a> {
    fn new(person: &'a Person, propagation: &'a PropagationReport) -> Self {
        Self {
            person,
            propagation,
        }
    }
}

fn print_rows<'a>(people: impl Iterator<Item = &'a Person>) {
    for person in people {
        println!(
            "{:<12} {:<30} {:<12} {}",
            person.internal_id(),
            person.full_name(),
            person.phone,
            person.dob
        );
    }
}

fn print_card(card: &Card) {
    println!("{}", card.title);
    println!("{}", card.subtitle);
    for (label, value) in &card.fields {
        println!("  {label}: {value}");
    }
}

fn print_report(report: &PropagationReport) {
    if report.is_empty() {
        return;
    }
    println!(
        "schedule: {} day(s) touched, {} entries removed, {} moved, {} slot(s) freed, {} relabeled",
        report.days_touched,
        report.employee_entries_removed,
        report.employee_entries_moved,
        report.slots_freed,
        report.slots_relabeled
    );
}
