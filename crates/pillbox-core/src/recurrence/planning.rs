//! Dose-planning checks over one or more schedules.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{expand, RecurrenceResult};
use crate::models::Schedule;
use crate::time::Instant;

/// Earliest instant the next dose may be released after a dispense.
///
/// Negative lockouts count as zero; a lockout past the representable range
/// saturates at the latest instant.
pub fn next_eligible_time(last_dispense: &Instant, lockout_minutes: i64) -> Instant {
    Duration::try_minutes(lockout_minutes.max(0))
        .and_then(|gap| last_dispense.checked_add_signed(gap))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Check if `now` still falls inside the lockout after `last_dispense`.
pub fn is_within_lockout(last_dispense: &Instant, lockout_minutes: i64, now: &Instant) -> bool {
    *now < next_eligible_time(last_dispense, lockout_minutes)
}

/// A medication scheduled above its daily ceiling on one UTC day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLimitConflict {
    pub day: NaiveDate,
    pub medication_id: String,
    pub medication_name: String,
    /// Units the schedules would dispense that day
    pub scheduled_units: i64,
    pub max_daily_dose: i64,
    /// Schedules contributing to the total, sorted
    pub schedule_ids: Vec<String>,
}

/// Two schedules firing in the same minute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlapConflict {
    pub at: Instant,
    pub schedule_ids: [String; 2],
}

/// Occurrences of `schedule` in the window, cut at its end date.
fn schedule_occurrences(
    schedule: &Schedule,
    window_start: &Instant,
    window_end: &Instant,
) -> RecurrenceResult<Vec<Instant>> {
    let mut occurrences = expand(&schedule.rrule, &schedule.start_date, window_start, window_end)?;
    if let Some(end) = schedule.end_date {
        occurrences.retain(|occurrence| *occurrence <= end);
    }
    Ok(occurrences)
}

#[derive(Default)]
struct DailyTally {
    name: String,
    units: i64,
    max: i64,
    schedules: BTreeSet<String>,
}

/// Find every (day, medication) whose scheduled units exceed the
/// medication's `max_daily_dose` within `[window_start, window_end]`.
///
/// Results are ordered by day, then medication id.
pub fn daily_limit_conflicts(
    schedules: &[Schedule],
    window_start: &Instant,
    window_end: &Instant,
) -> RecurrenceResult<Vec<DailyLimitConflict>> {
    let mut tallies: BTreeMap<(NaiveDate, String), DailyTally> = BTreeMap::new();

    for schedule in schedules {
        for occurrence in schedule_occurrences(schedule, window_start, window_end)? {
            let day = occurrence.date_naive();
            for item in &schedule.items {
                let tally = tallies
                    .entry((day, item.medication.id.clone()))
                    .or_default();
                tally.name.clone_from(&item.medication.name);
                tally.max = item.medication.max_daily_dose;
                tally.units += item.qty;
                tally.schedules.insert(schedule.id.clone());
            }
        }
    }

    Ok(tallies
        .into_iter()
        .filter(|(_, tally)| tally.units > tally.max)
        .map(|((day, medication_id), tally)| DailyLimitConflict {
            day,
            medication_id,
            medication_name: tally.name,
            scheduled_units: tally.units,
            max_daily_dose: tally.max,
            schedule_ids: tally.schedules.into_iter().collect(),
        })
        .collect())
}

/// Find every pair of schedules firing within the same UTC minute.
///
/// Each pair is reported once per minute, at the earlier of its two
/// occurrences, earlier schedule first. Results are ordered by minute.
pub fn overlap_conflicts(
    schedules: &[Schedule],
    window_start: &Instant,
    window_end: &Instant,
) -> RecurrenceResult<Vec<OverlapConflict>> {
    let mut by_minute: BTreeMap<i64, Vec<(Instant, &str)>> = BTreeMap::new();
    for schedule in schedules {
        for occurrence in schedule_occurrences(schedule, window_start, window_end)? {
            by_minute
                .entry(occurrence.timestamp().div_euclid(60))
                .or_default()
                .push((occurrence, schedule.id.as_str()));
        }
    }

    let mut conflicts = Vec::new();
    for mut group in by_minute.into_values() {
        group.sort();
        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        for (i, (at, first)) in group.iter().enumerate() {
            for (_, second) in &group[i + 1..] {
                if first == second {
                    continue;
                }
                let key = if first < second { (*first, *second) } else { (*second, *first) };
                if seen.insert(key) {
                    conflicts.push(OverlapConflict {
                        at: *at,
                        schedule_ids: [first.to_string(), second.to_string()],
                    });
                }
            }
        }
    }
    Ok(conflicts)
}
