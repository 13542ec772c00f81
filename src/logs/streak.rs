use std::collections::BTreeSet;

use serde::Serialize;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Derived adherence statistic; recomputed on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakResult {
    pub streak: u32,
    #[serde(with = "iso_date::option")]
    pub most_recent_date: Option<Date>,
}

/// Count consecutive logged days ending at today or yesterday.
///
/// The run must be unbroken up to the anchor: a missed day followed by an
/// older run counts zero. Dates after `today` are ignored rather than
/// rejected; this is a read-side convenience and never errors.
pub fn compute_streak(dates: &[Date], today: Date) -> StreakResult {
    let logged: BTreeSet<Date> = dates.iter().copied().filter(|d| *d <= today).collect();
    let most_recent_date = logged.iter().next_back().copied();

    let anchor = if logged.contains(&today) {
        Some(today)
    } else {
        today.previous_day()
    };

    let mut streak = 0u32;
    let mut expected = anchor;
    while let Some(day) = expected {
        if !logged.contains(&day) {
            break;
        }
        streak += 1;
        expected = day.previous_day();
    }

    StreakResult {
        streak,
        most_recent_date,
    }
}
