//! Flat row shapes as stored.
//!
//! Columns keep their storage types: timestamps and metadata are text,
//! nullable columns are `Option`. Turning these into domain models is the
//! hydrator's job.

use chrono::Utc;
use rusqlite::Row;

use crate::time::{format_instant, Instant};

fn now_text() -> String {
    format_instant(&Utc::now())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `users` row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub timezone: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRecord {
    pub fn new(email: String, full_name: String) -> Self {
        let now = now_text();
        Self {
            id: new_id(),
            email,
            full_name,
            phone: None,
            timezone: "UTC".into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            full_name: row.get("full_name")?,
            phone: row.get("phone")?,
            timezone: row.get("timezone")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// `patients` row.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub id: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub timezone: String,
    pub preferred_language: Option<String>,
    pub caregiver_name: Option<String>,
    pub caregiver_email: Option<String>,
    pub caregiver_phone: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PatientRecord {
    pub fn new(first_name: String, last_name: String) -> Self {
        let now = now_text();
        Self {
            id: new_id(),
            user_id: None,
            first_name,
            last_name,
            date_of_birth: None,
            gender: None,
            timezone: "UTC".into(),
            preferred_language: None,
            caregiver_name: None,
            caregiver_email: None,
            caregiver_phone: None,
            notes: None,
            metadata: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            date_of_birth: row.get("date_of_birth")?,
            gender: row.get("gender")?,
            timezone: row.get("timezone")?,
            preferred_language: row.get("preferred_language")?,
            caregiver_name: row.get("caregiver_name")?,
            caregiver_email: row.get("caregiver_email")?,
            caregiver_phone: row.get("caregiver_phone")?,
            notes: row.get("notes")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// `medications` row.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationRecord {
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub dosage_mg: Option<i64>,
    pub instructions: Option<String>,
    pub stock_count: i64,
    pub low_stock_threshold: i64,
    pub cartridge_index: Option<i64>,
    pub manufacturer: Option<String>,
    pub external_id: Option<String>,
    pub max_daily_dose: i64,
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MedicationRecord {
    pub fn new(patient_id: String, name: String) -> Self {
        let now = now_text();
        Self {
            id: new_id(),
            patient_id,
            name,
            nickname: None,
            color: None,
            shape: None,
            dosage_form: None,
            strength: None,
            dosage_mg: None,
            instructions: None,
            stock_count: 0,
            low_stock_threshold: 10,
            cartridge_index: None,
            manufacturer: None,
            external_id: None,
            max_daily_dose: 1,
            metadata: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            name: row.get("name")?,
            nickname: row.get("nickname")?,
            color: row.get("color")?,
            shape: row.get("shape")?,
            dosage_form: row.get("dosage_form")?,
            strength: row.get("strength")?,
            dosage_mg: row.get("dosage_mg")?,
            instructions: row.get("instructions")?,
            stock_count: row.get("stock_count")?,
            low_stock_threshold: row.get("low_stock_threshold")?,
            cartridge_index: row.get("cartridge_index")?,
            manufacturer: row.get("manufacturer")?,
            external_id: row.get("external_id")?,
            max_daily_dose: row.get("max_daily_dose")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// `schedules` row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub timezone: String,
    pub rrule: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub lockout_minutes: i64,
    pub snooze_interval_minutes: i64,
    pub snooze_max: i64,
    pub status: String,
    pub notes: Option<String>,
    pub metadata: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ScheduleRecord {
    pub fn new(patient_id: String, title: String, rrule: String, start_date: &Instant) -> Self {
        let now = now_text();
        Self {
            id: new_id(),
            patient_id,
            title,
            timezone: "UTC".into(),
            rrule,
            start_date: format_instant(start_date),
            end_date: None,
            lockout_minutes: 60,
            snooze_interval_minutes: 10,
            snooze_max: 3,
            status: "active".into(),
            notes: None,
            metadata: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            title: row.get("title")?,
            timezone: row.get("timezone")?,
            rrule: row.get("rrule")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            lockout_minutes: row.get("lockout_minutes")?,
            snooze_interval_minutes: row.get("snooze_interval_minutes")?,
            snooze_max: row.get("snooze_max")?,
            status: row.get("status")?,
            notes: row.get("notes")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// `schedule_items` row, as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleItemRecord {
    pub id: String,
    pub schedule_id: String,
    pub medication_id: String,
    pub qty: i64,
    pub instructions: Option<String>,
}

impl ScheduleItemRecord {
    pub fn new(schedule_id: String, medication_id: String, qty: i64) -> Self {
        Self {
            id: new_id(),
            schedule_id,
            medication_id,
            qty,
            instructions: None,
        }
    }
}

/// `schedule_items` joined with `medications`, as read.
///
/// The medication columns are flattened into the item row with a
/// `medication_` prefix; [`ScheduleItemRow::medication_record`] puts them
/// back together.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleItemRow {
    pub schedule_item_id: String,
    pub schedule_id: String,
    pub qty: i64,
    pub schedule_item_instructions: Option<String>,
    pub medication_id: String,
    pub medication_patient_id: String,
    pub medication_name: String,
    pub medication_nickname: Option<String>,
    pub medication_color: Option<String>,
    pub medication_shape: Option<String>,
    pub medication_dosage_form: Option<String>,
    pub medication_strength: Option<String>,
    pub medication_dosage_mg: Option<i64>,
    pub medication_instructions: Option<String>,
    pub medication_stock_count: i64,
    pub medication_low_stock_threshold: i64,
    pub medication_cartridge_index: Option<i64>,
    pub medication_manufacturer: Option<String>,
    pub medication_external_id: Option<String>,
    pub medication_max_daily_dose: i64,
    pub medication_metadata: Option<String>,
    pub medication_created_at: String,
    pub medication_updated_at: String,
}

impl ScheduleItemRow {
    /// Reassemble the embedded medication columns.
    pub fn medication_record(&self) -> MedicationRecord {
        MedicationRecord {
            id: self.medication_id.clone(),
            patient_id: self.medication_patient_id.clone(),
            name: self.medication_name.clone(),
            nickname: self.medication_nickname.clone(),
            color: self.medication_color.clone(),
            shape: self.medication_shape.clone(),
            dosage_form: self.medication_dosage_form.clone(),
            strength: self.medication_strength.clone(),
            dosage_mg: self.medication_dosage_mg,
            instructions: self.medication_instructions.clone(),
            stock_count: self.medication_stock_count,
            low_stock_threshold: self.medication_low_stock_threshold,
            cartridge_index: self.medication_cartridge_index,
            manufacturer: self.medication_manufacturer.clone(),
            external_id: self.medication_external_id.clone(),
            max_daily_dose: self.medication_max_daily_dose,
            metadata: self.medication_metadata.clone(),
            created_at: self.medication_created_at.clone(),
            updated_at: self.medication_updated_at.clone(),
        }
    }

    /// Flatten an item and its medication into one row.
    pub fn flatten(item: &ScheduleItemRecord, medication: &MedicationRecord) -> Self {
        Self {
            schedule_item_id: item.id.clone(),
            schedule_id: item.schedule_id.clone(),
            qty: item.qty,
            schedule_item_instructions: item.instructions.clone(),
            medication_id: medication.id.clone(),
            medication_patient_id: medication.patient_id.clone(),
            medication_name: medication.name.clone(),
            medication_nickname: medication.nickname.clone(),
            medication_color: medication.color.clone(),
            medication_shape: medication.shape.clone(),
            medication_dosage_form: medication.dosage_form.clone(),
            medication_strength: medication.strength.clone(),
            medication_dosage_mg: medication.dosage_mg,
            medication_instructions: medication.instructions.clone(),
            medication_stock_count: medication.stock_count,
            medication_low_stock_threshold: medication.low_stock_threshold,
            medication_cartridge_index: medication.cartridge_index,
            medication_manufacturer: medication.manufacturer.clone(),
            medication_external_id: medication.external_id.clone(),
            medication_max_daily_dose: medication.max_daily_dose,
            medication_metadata: medication.metadata.clone(),
            medication_created_at: medication.created_at.clone(),
            medication_updated_at: medication.updated_at.clone(),
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            schedule_item_id: row.get("schedule_item_id")?,
            schedule_id: row.get("schedule_id")?,
            qty: row.get("qty")?,
            schedule_item_instructions: row.get("schedule_item_instructions")?,
            medication_id: row.get("medication_id")?,
            medication_patient_id: row.get("medication_patient_id")?,
            medication_name: row.get("medication_name")?,
            medication_nickname: row.get("medication_nickname")?,
            medication_color: row.get("medication_color")?,
            medication_shape: row.get("medication_shape")?,
            medication_dosage_form: row.get("medication_dosage_form")?,
            medication_strength: row.get("medication_strength")?,
            medication_dosage_mg: row.get("medication_dosage_mg")?,
            medication_instructions: row.get("medication_instructions")?,
            medication_stock_count: row.get("medication_stock_count")?,
            medication_low_stock_threshold: row.get("medication_low_stock_threshold")?,
            medication_cartridge_index: row.get("medication_cartridge_index")?,
            medication_manufacturer: row.get("medication_manufacturer")?,
            medication_external_id: row.get("medication_external_id")?,
            medication_max_daily_dose: row.get("medication_max_daily_dose")?,
            medication_metadata: row.get("medication_metadata")?,
            medication_created_at: row.get("medication_created_at")?,
            medication_updated_at: row.get("medication_updated_at")?,
        })
    }
}

/// `dispense_events` row.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseEventRecord {
    pub id: String,
    pub patient_id: String,
    pub schedule_id: String,
    pub schedule_item_id: Option<String>,
    pub due_at: String,
    pub acted_at: Option<String>,
    pub status: String,
    pub action_source: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<String>,
    pub created_at: String,
}

impl DispenseEventRecord {
    /// A new pending event due at `due_at`.
    pub fn pending(patient_id: String, schedule_id: String, due_at: &Instant) -> Self {
        Self {
            id: new_id(),
            patient_id,
            schedule_id,
            schedule_item_id: None,
            due_at: format_instant(due_at),
            acted_at: None,
            status: "pending".into(),
            action_source: None,
            notes: None,
            metadata: None,
            created_at: now_text(),
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            schedule_id: row.get("schedule_id")?,
            schedule_item_id: row.get("schedule_item_id")?,
            due_at: row.get("due_at")?,
            acted_at: row.get("acted_at")?,
            status: row.get("status")?,
            action_source: row.get("action_source")?,
            notes: row.get("notes")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
        })
    }
}
