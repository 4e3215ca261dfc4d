//! Clock-time arithmetic and slot policies for daily reminders
//!
//! Reminders fire a fixed lead before the activity. The lead is applied to
//! the full date-time, so an activity at `00:02` fires at `23:57` on the
//! previous calendar day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::errors::DomainError;
use crate::models::{DietContent, Meal, MealSlot, ReminderCategory};

/// Minutes between a reminder firing and the activity it announces
pub const REMINDER_LEAD_MINUTES: i64 = 5;

fn lead() -> Duration {
    Duration::minutes(REMINDER_LEAD_MINUTES)
}

static CLOCK_TIME: OnceLock<Result<Regex, String>> = OnceLock::new();

fn clock_time_pattern() -> Result<&'static Regex, DomainError> {
    CLOCK_TIME
        .get_or_init(|| {
            Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| DomainError::Validation(e.clone()))
}

/// Parse a user supplied `HH:MM` time; a trailing `:SS` is accepted and dropped
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, DomainError> {
    let invalid = || DomainError::InvalidClockTime(input.to_string());

    let caps = clock_time_pattern()?
        .captures(input.trim())
        .ok_or_else(invalid)?;

    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Format a time the way users enter it
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Time of day a reminder for `target` fires, wrapping past midnight
pub fn fire_time(target: NaiveTime) -> NaiveTime {
    let target = target.with_second(0).unwrap_or(target);
    let (fire, _days) = target.overflowing_sub_signed(lead());
    fire
}

/// Wall-clock instant a reminder for an activity at `date` + `target` fires
pub fn fire_at(date: NaiveDate, target: NaiveTime) -> NaiveDateTime {
    let target = target.with_second(0).unwrap_or(target);
    date.and_time(target) - lead()
}

/// A user's preferred times for each reminder slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTimes {
    pub workout: Option<NaiveTime>,
    pub breakfast: Option<NaiveTime>,
    pub lunch: Option<NaiveTime>,
    pub dinner: Option<NaiveTime>,
    pub snack: Option<NaiveTime>,
}

impl DailyTimes {
    /// Slots that have a time set, in reminder order
    pub fn slots(&self) -> Vec<(ReminderCategory, NaiveTime)> {
        [
            (ReminderCategory::Workout, self.workout),
            (ReminderCategory::Breakfast, self.breakfast),
            (ReminderCategory::Lunch, self.lunch),
            (ReminderCategory::Dinner, self.dinner),
            (ReminderCategory::Snack, self.snack),
        ]
        .into_iter()
        .filter_map(|(category, time)| time.map(|t| (category, t)))
        .collect()
    }
}

impl DietContent {
    /// Pick the meal a slot refers to
    ///
    /// This is a best-effort policy, not a contract: a meal whose name
    /// mentions the slot wins; otherwise the first meal is breakfast, the
    /// second is lunch (the first when only one exists), the last is dinner,
    /// and the first snack is the snack.
    pub fn meal_for_slot(&self, slot: MealSlot) -> Option<&Meal> {
        let labelled = |word: &str| {
            self.meals.iter().find(|m| {
                m.name
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(word))
                    .unwrap_or(false)
            })
        };

        match slot {
            MealSlot::Breakfast => labelled("breakfast").or_else(|| self.meals.first()),
            MealSlot::Lunch => labelled("lunch")
                .or_else(|| self.meals.get(1))
                .or_else(|| self.meals.first()),
            MealSlot::Dinner => labelled("dinner").or_else(|| self.meals.last()),
            MealSlot::Snack => self.snacks.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[rstest]
    #[case("07:00", t(7, 0))]
    #[case("7:05", t(7, 5))]
    #[case("18:30:45", t(18, 30))]
    #[case(" 00:02 ", t(0, 2))]
    fn test_parse_clock_time(#[case] input: &str, #[case] expected: NaiveTime) {
        assert_eq!(parse_clock_time(input).unwrap(), expected);
    }

    #[test]
    fn test_clock_time_pattern_compiles_once() {
        let first = clock_time_pattern().unwrap();
        let second = clock_time_pattern().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[rstest]
    #[case("")]
    #[case("7")]
    #[case("24:00")]
    #[case("12:60")]
    #[case("7:00 PM")]
    fn test_parse_clock_time_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_clock_time(input),
            Err(DomainError::InvalidClockTime(_))
        ));
    }

    #[rstest]
    #[case(t(7, 0), t(6, 55))]
    #[case(t(0, 2), t(23, 57))]
    #[case(t(0, 5), t(0, 0))]
    #[case(t(12, 3), t(11, 58))]
    fn test_fire_time(#[case] target: NaiveTime, #[case] expected: NaiveTime) {
        assert_eq!(fire_time(target), expected);
    }

    #[test]
    fn test_fire_at_rolls_to_previous_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let fire = fire_at(date, t(0, 2));
        assert_eq!(fire.date(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(fire.time(), t(23, 57));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_fire_time_is_five_minutes_before(h in 0u32..24, m in 0u32..60) {
            let target = t(h, m);
            let fire = fire_time(target);
            let target_mins = (h * 60 + m) as i64;
            let fire_mins = (fire.hour() * 60 + fire.minute()) as i64;
            prop_assert_eq!((target_mins - fire_mins).rem_euclid(24 * 60), REMINDER_LEAD_MINUTES);
            prop_assert_eq!(fire.second(), 0);
        }

        #[test]
        fn prop_fire_at_agrees_with_fire_time(h in 0u32..24, m in 0u32..60, day in 1u32..28) {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            let target = t(h, m);
            let at = fire_at(date, target);
            prop_assert_eq!(at.time(), fire_time(target));
            prop_assert_eq!(date.and_time(target) - at, Duration::minutes(REMINDER_LEAD_MINUTES));
        }
    }

    fn diet(meals: &[&str], snacks: &[&str]) -> DietContent {
        DietContent {
            meals: meals.iter().map(|n| Meal::named(n, 400)).collect(),
            snacks: snacks.iter().map(|n| Meal::named(n, 100)).collect(),
            total_calories: None,
            extra: Default::default(),
        }
    }

    fn picked(d: &DietContent, slot: MealSlot) -> Option<String> {
        d.meal_for_slot(slot).and_then(|m| m.name.clone())
    }

    #[test]
    fn test_labelled_meals_win() {
        let d = diet(&["Power Lunch Bowl", "Light Dinner", "Big Breakfast"], &[]);
        assert_eq!(picked(&d, MealSlot::Breakfast).as_deref(), Some("Big Breakfast"));
        assert_eq!(picked(&d, MealSlot::Lunch).as_deref(), Some("Power Lunch Bowl"));
        assert_eq!(picked(&d, MealSlot::Dinner).as_deref(), Some("Light Dinner"));
    }

    #[test]
    fn test_positional_fallback() {
        let d = diet(&["Oats", "Dal", "Salmon"], &["Apple", "Nuts"]);
        assert_eq!(picked(&d, MealSlot::Breakfast).as_deref(), Some("Oats"));
        assert_eq!(picked(&d, MealSlot::Lunch).as_deref(), Some("Dal"));
        assert_eq!(picked(&d, MealSlot::Dinner).as_deref(), Some("Salmon"));
        assert_eq!(picked(&d, MealSlot::Snack).as_deref(), Some("Apple"));
    }

    #[test]
    fn test_single_meal_and_no_snacks() {
        let d = diet(&["Oats"], &[]);
        assert_eq!(picked(&d, MealSlot::Lunch).as_deref(), Some("Oats"));
        assert_eq!(picked(&d, MealSlot::Snack), None);

        let empty = diet(&[], &[]);
        assert!(MealSlot::ALL.iter().all(|s| empty.meal_for_slot(*s).is_none()));
    }

    #[test]
    fn test_daily_times_skips_unset_slots() {
        let times = DailyTimes {
            workout: Some(t(7, 0)),
            dinner: Some(t(19, 0)),
            ..Default::default()
        };
        assert_eq!(
            times.slots(),
            vec![
                (ReminderCategory::Workout, t(7, 0)),
                (ReminderCategory::Dinner, t(19, 0)),
            ]
        );
    }
}
