//! Property tests for calendar generation and slot booking.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use proptest::prelude::*;
use slotbook_core::calendar::{self, generate, MonthGrid};
use slotbook_core::{AvailabilityGrid, ReservationEngine};

proptest! {
    #[test]
    fn every_date_of_the_year_is_emitted_once(year in 1900i32..2200) {
        let days = generate(year);
        let expected = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 };
        prop_assert_eq!(days.len(), expected);

        for pair in days.windows(2) {
            prop_assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn working_day_means_weekday_inside_month(year in 1900i32..2200) {
        for day in generate(year) {
            let weekend = matches!(day.date.weekday(), Weekday::Sat | Weekday::Sun);
            prop_assert_eq!(day.working_day, !weekend);
            prop_assert_eq!(day.weekday, day.date.format("%A").to_string());
        }
    }

    #[test]
    fn month_grid_places_each_day_under_its_weekday(year in 1900i32..2200, month in 1u32..=12) {
        let grid = MonthGrid::new(year, month).unwrap();
        let len = calendar::days_in_month(year, month).unwrap();
        prop_assert!((4..=6).contains(&grid.weeks.len()));

        for day in 1..=len {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let row = grid.week_of(day).unwrap();
            prop_assert!(!grid.is_padding(row, date.weekday()));
            let cell = grid.weeks[(row - 1) as usize][date.weekday().num_days_from_monday() as usize];
            prop_assert_eq!(cell, Some(day));
        }
    }

    #[test]
    fn running_week_never_decreases(year in 1900i32..2200) {
        let days = generate(year);
        prop_assert_eq!(days[0].week, 1);
        for pair in days.windows(2) {
            let step = pair[1].week - pair[0].week;
            let after_sunday = pair[0].date.weekday() == Weekday::Sun;
            prop_assert_eq!(step, u32::from(after_sunday));
        }
    }

    #[test]
    fn window_length_matches_span_inside_year(offset in 0u64..300, span in 1u32..60) {
        let days = generate(2025);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Days::new(offset);
        let view = calendar::window(&days, start, span);

        let remaining = days.iter().filter(|d| d.date >= start).count();
        prop_assert_eq!(view.len(), remaining.min(span as usize));
        prop_assert_eq!(view.first().map(|d| d.date), Some(start));
    }

    #[test]
    fn reserve_then_release_restores_free_slots(
        picks in proptest::collection::vec(0usize..4, 1..4),
    ) {
        let slots: Vec<String> = ["09:00", "09:30", "10:00", "10:30"].map(String::from).to_vec();
        let mut grid = AvailabilityGrid::new(vec!["02-00000001".into()], slots.clone());
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let wanted: Vec<&str> = picks.iter().map(|&i| slots[i].as_str()).collect();

        let reservation = ReservationEngine::new(&mut grid)
            .reserve(day, "02-00000001", &wanted, "11111111")
            .unwrap();
        let free = grid.free_slots(day, "02-00000001").unwrap();
        prop_assert_eq!(free.len() + reservation.slots.len(), slots.len());

        let mut engine = ReservationEngine::new(&mut grid);
        for slot in &reservation.slots {
            engine.release(day, "02-00000001", slot).unwrap();
        }
        prop_assert_eq!(grid.free_slots(day, "02-00000001").unwrap(), slots);
    }
}
