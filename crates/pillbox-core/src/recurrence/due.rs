//! Due-now evaluation for a single schedule.

use chrono::{DateTime, Duration, Utc};

use super::{expand, RecurrenceResult};
use crate::models::{Schedule, ScheduleStatus};
use crate::time::Instant;

/// Return the occurrence that makes a schedule due at `now`, if any.
///
/// 1. Outside `[start, end]` the schedule is never due and the rule is not
///    expanded.
/// 2. The due window is `[now - tolerance, now + tolerance]`.
/// 3. The first occurrence in that window wins, even when a later one is
///    nearer to `now`.
///
/// Only a malformed rule fails.
pub fn due_occurrence(
    rule: &str,
    start: &Instant,
    end: Option<&Instant>,
    tolerance_minutes: u32,
    now: &Instant,
) -> RecurrenceResult<Option<Instant>> {
    if now < start {
        return Ok(None);
    }
    if end.is_some_and(|end| now > end) {
        return Ok(None);
    }

    let tolerance = Duration::minutes(i64::from(tolerance_minutes));
    let window_start = now
        .checked_sub_signed(tolerance)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let window_end = now
        .checked_add_signed(tolerance)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let occurrences = expand(rule, start, &window_start, &window_end)?;
    Ok(occurrences.into_iter().next())
}

/// Due-now check for a hydrated schedule. Paused and archived schedules are
/// never due.
pub fn schedule_due_occurrence(
    schedule: &Schedule,
    tolerance_minutes: u32,
    now: &Instant,
) -> RecurrenceResult<Option<Instant>> {
    if schedule.status != ScheduleStatus::Active {
        return Ok(None);
    }
    due_occurrence(
        &schedule.rrule,
        &schedule.start_date,
        schedule.end_date.as_ref(),
        tolerance_minutes,
        now,
    )
}
