//! Medication models.

use serde::{Deserialize, Serialize};

use super::Metadata;
use crate::time::Instant;

/// A medication loaded into a patient's dispenser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub color: Option<String>,
    pub shape: Option<String>,
    /// e.g. "tablet", "capsule"
    pub dosage_form: Option<String>,
    /// Label strength, e.g. "10mg"
    pub strength: Option<String>,
    pub dosage_mg: Option<i64>,
    pub instructions: Option<String>,
    /// Units remaining in the cartridge
    pub stock_count: i64,
    pub low_stock_threshold: i64,
    /// Physical cartridge slot in the dispenser
    pub cartridge_index: Option<i64>,
    pub manufacturer: Option<String>,
    pub external_id: Option<String>,
    /// Ceiling on units dispensed per day
    pub max_daily_dose: i64,
    pub metadata: Metadata,
    pub created_at: Instant,
    pub updated_at: Instant,
}

impl Medication {
    /// Check if stock has fallen to the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_count <= self.low_stock_threshold
    }

    /// Name shown to the patient: nickname when set, otherwise the name.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}
