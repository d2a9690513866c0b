//! Schedule models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Medication, Metadata, UnknownStatus};
use crate::time::Instant;

/// Schedule lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Producing doses
    Active,
    /// Temporarily suspended by a caregiver
    Paused,
    /// Retired, kept for history
    Archived,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Archived => "archived",
        }
    }
}

impl FromStr for ScheduleStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ScheduleStatus::Active),
            "paused" => Ok(ScheduleStatus::Paused),
            "archived" => Ok(ScheduleStatus::Archived),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring dosing plan for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    /// IANA timezone name
    pub timezone: String,
    /// RFC 5545 RRULE value, with or without the `RRULE:` prefix
    pub rrule: String,
    /// Recurrence anchor (DTSTART)
    pub start_date: Instant,
    /// Last instant at which the schedule is valid
    pub end_date: Option<Instant>,
    /// Minimum gap between two dispenses
    pub lockout_minutes: i64,
    pub snooze_interval_minutes: i64,
    pub snooze_max: i64,
    pub status: ScheduleStatus,
    pub notes: Option<String>,
    pub metadata: Metadata,
    /// Items in storage order
    pub items: Vec<ScheduleItem>,
    pub created_at: Instant,
    pub updated_at: Instant,
}

impl Schedule {
    /// Check if the schedule produces doses at `now`: status active and
    /// `now` within `[start_date, end_date]`.
    pub fn is_active_at(&self, now: &Instant) -> bool {
        if self.status != ScheduleStatus::Active || *now < self.start_date {
            return false;
        }
        self.end_date.map_or(true, |end| *now <= end)
    }

    /// Total units dispensed per occurrence.
    pub fn units_per_occurrence(&self) -> i64 {
        self.items.iter().map(|item| item.qty).sum()
    }
}

/// One medication line in a schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleItem {
    pub id: String,
    pub schedule_id: String,
    /// Read-only snapshot of the referenced medication
    pub medication: Medication,
    /// Units dispensed per occurrence
    pub qty: i64,
    /// Overrides the medication's own instructions when set
    pub instructions: Option<String>,
}

impl ScheduleItem {
    /// Instructions to show for this item, falling back to the medication's.
    pub fn effective_instructions(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .or(self.medication.instructions.as_deref())
    }
}
