use chrono::{Datelike, Local};
use clap::Subcommand;
use slotbook_core::{CalendarDay, CalendarStore, Config, MonthGrid};

use super::{CommandResult, Output};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Bookable days from today through the look-ahead window
    Upcoming {
        /// Window length in days (default: config look_ahead_days)
        #[arg(long)]
        days: Option<u32>,
        /// Include weekends and other non-working days
        #[arg(long)]
        all: bool,
    },
    /// Working days of one month
    Month {
        year: i32,
        /// Month number (1-12)
        month: u32,
    },
    /// Print a month as a Monday-first grid
    Show {
        /// Year (default: current)
        year: Option<i32>,
        /// Month number (default: current)
        month: Option<u32>,
    },
}

pub fn run(action: CalendarAction, out: Output) -> CommandResult {
    let mut store = CalendarStore::open()?;
    let today = Local::now().date_naive();

    match action {
        CalendarAction::Upcoming { days, all } => {
            let span = match days {
                Some(days) => days,
                None => Config::load()?.look_ahead_days,
            };
            let rows: Vec<CalendarDay> = store
                .upcoming(today, span)?
                .into_iter()
                .filter(|d| all || d.working_day)
                .collect();
            out.emit(&rows, || print_days(&rows))?;
        }
        CalendarAction::Month { year, month } => {
            if !(1..=12).contains(&month) {
                return Err(format!("invalid month: {month}").into());
            }
            let rows = store.working_days_in_month(year, month)?;
            out.emit(&rows, || print_days(&rows))?;
        }
        CalendarAction::Show { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let grid = MonthGrid::new(year, month).ok_or_else(|| format!("invalid month: {month}"))?;
            out.emit(&grid.weeks, || print_grid(&grid))?;
        }
    }
    Ok(())
}

fn print_days(days: &[CalendarDay]) {
    for day in days {
        println!(
            "{}  {:<9}  week {:>2}  {}",
            day.date,
            day.weekday,
            day.week,
            if day.working_day { "working" } else { "closed" }
        );
    }
}

fn print_grid(grid: &MonthGrid) {
    println!("{:04}-{:02}", grid.year, grid.month);
    println!(" Mo Tu We Th Fr Sa Su");
    for week in &grid.weeks {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                Some(day) => format!("{day:>3}"),
                None => "   ".to_string(),
            })
            .collect();
        println!("{}", row.trim_end());
    }
}
