//! Dispense event models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Metadata, UnknownStatus};
use crate::time::Instant;

/// Dispense event status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DispenseStatus {
    /// Due, not yet acted upon
    Pending,
    /// Pills released to the patient
    Dispensed,
    /// Deliberately not taken
    Skipped,
    /// Window passed without action
    Missed,
    /// Postponed by the patient
    Snoozed,
}

impl DispenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispenseStatus::Pending => "pending",
            DispenseStatus::Dispensed => "dispensed",
            DispenseStatus::Skipped => "skipped",
            DispenseStatus::Missed => "missed",
            DispenseStatus::Snoozed => "snoozed",
        }
    }

    /// Resolved events carry an acted instant; unresolved ones never do.
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            DispenseStatus::Dispensed | DispenseStatus::Skipped | DispenseStatus::Missed
        )
    }
}

impl FromStr for DispenseStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DispenseStatus::Pending),
            "dispensed" => Ok(DispenseStatus::Dispensed),
            "skipped" => Ok(DispenseStatus::Skipped),
            "missed" => Ok(DispenseStatus::Missed),
            "snoozed" => Ok(DispenseStatus::Snoozed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for DispenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single due dose and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispenseEvent {
    pub id: String,
    pub patient_id: String,
    pub schedule_id: String,
    /// Absent for patient-level events not tied to one item
    pub schedule_item_id: Option<String>,
    pub due_at: Instant,
    /// Set once the event is resolved
    pub acted_at: Option<Instant>,
    pub status: DispenseStatus,
    /// Who or what resolved the event (e.g. "device", "caregiver")
    pub action_source: Option<String>,
    pub notes: Option<String>,
    pub metadata: Metadata,
    pub created_at: Instant,
}

impl DispenseEvent {
    /// Check the acted-instant invariant for this event.
    pub fn is_consistent(&self) -> bool {
        self.status.is_resolved() == self.acted_at.is_some()
    }
}
