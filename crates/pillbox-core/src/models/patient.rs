//! Patient models.

use serde::{Deserialize, Serialize};

use super::{DispenseEvent, Medication, Metadata, Schedule};
use crate::time::Instant;

/// A patient with everything needed to render their dispensing state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    /// Owning user, if the patient is attached to an account
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Instant>,
    pub gender: Option<String>,
    /// IANA timezone name
    pub timezone: String,
    pub preferred_language: Option<String>,
    pub caregiver_name: Option<String>,
    pub caregiver_email: Option<String>,
    pub caregiver_phone: Option<String>,
    pub notes: Option<String>,
    pub metadata: Metadata,
    pub created_at: Instant,
    pub updated_at: Instant,
    pub medications: Vec<Medication>,
    pub schedules: Vec<Schedule>,
    /// Events due within the lookahead window, earliest first.
    /// Recomputed on every hydration, never stored.
    pub upcoming_dispense_events: Vec<DispenseEvent>,
}

impl Patient {
    /// Display name ("First Last").
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Check if this patient is attached to a user account.
    pub fn has_owner(&self) -> bool {
        self.user_id.is_some()
    }
}
