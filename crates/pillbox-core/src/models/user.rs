//! User models.

use serde::{Deserialize, Serialize};

use super::Patient;
use crate::time::Instant;

/// An account holder (typically a caregiver) and the patients they manage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// IANA timezone name
    pub timezone: String,
    pub created_at: Instant,
    pub updated_at: Instant,
    /// Patients in storage load order
    pub patients: Vec<Patient>,
}
