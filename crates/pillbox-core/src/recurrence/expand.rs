//! RRULE expansion over a bounded window.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use super::{RecurrenceError, RecurrenceResult};
use crate::time::Instant;

/// Upper bound on occurrences returned for one window.
pub const MAX_OCCURRENCES: u16 = u16::MAX;

const RRULE_PREFIX: &str = "RRULE:";

/// Strip a case-insensitive `RRULE:` prefix.
pub fn strip_rrule_prefix(rule: &str) -> &str {
    let trimmed = rule.trim();
    match trimmed.get(..RRULE_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(RRULE_PREFIX) => &trimmed[RRULE_PREFIX.len()..],
        _ => trimmed,
    }
}

/// Parse `rule` anchored at `start` into an iterable rule set.
///
/// The anchor is truncated to whole seconds, the resolution recurrence
/// rules work at, so the DTSTART occurrence itself is kept.
pub fn build_rule_set(rule: &str, start: &Instant) -> RecurrenceResult<RRuleSet> {
    let invalid = |reason: String| RecurrenceError::InvalidRule {
        rule: rule.to_string(),
        reason,
    };

    let parsed = strip_rrule_prefix(rule)
        .parse::<RRule<Unvalidated>>()
        .map_err(|e| invalid(e.to_string()))?;

    parsed
        .build(start.trunc_subsecs(0).with_timezone(&Tz::UTC))
        .map_err(|e| invalid(e.to_string()))
}

/// Expand `rule` anchored at `start` and return every occurrence in
/// `[window_start, window_end]` (both inclusive), ascending.
///
/// An inverted window yields no occurrences. The rule is always validated
/// first, so a malformed rule fails even when the window is empty.
pub fn expand(
    rule: &str,
    start: &Instant,
    window_start: &Instant,
    window_end: &Instant,
) -> RecurrenceResult<Vec<Instant>> {
    let set = build_rule_set(rule, start)?;

    if window_start > window_end {
        return Ok(Vec::new());
    }

    // The rule set bounds are widened by a second and the exact inclusive
    // bounds applied below.
    let slack = Duration::seconds(1);
    let after = window_start
        .checked_sub_signed(slack)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let before = window_end
        .checked_add_signed(slack)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let result = set
        .after(after.with_timezone(&Tz::UTC))
        .before(before.with_timezone(&Tz::UTC))
        .all(MAX_OCCURRENCES);

    if result.limited {
        tracing::warn!(
            rule,
            limit = MAX_OCCURRENCES,
            "recurrence expansion truncated"
        );
    }

    let mut occurrences: Vec<Instant> = result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| dt >= window_start && dt <= window_end)
        .collect();
    occurrences.dedup();

    Ok(occurrences)
}
