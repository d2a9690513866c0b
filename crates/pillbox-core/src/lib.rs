//! PillBox Core Library
//!
//! Medication schedule recurrence, due-dose evaluation and patient graph
//! hydration for a local-first pill dispenser.
//!
//! # Architecture
//!
//! ```text
//!   SQLite rows (db::Store)
//!          │
//!          ▼
//!   ┌──────────────┐   time::parse_instant    ┌──────────────────────┐
//!   │  Hydrator    │ ───────────────────────▶ │ User → Patient →     │
//!   │  (hydrate)   │   models::decode_meta..  │ Schedule → Item →    │
//!   └──────┬───────┘                          │ Medication, Events   │
//!          │ upcoming window [now, now + 7d]  └──────────────────────┘
//!          ▼
//!   ┌──────────────┐   RRULE + DTSTART        ┌──────────────────────┐
//!   │ recurrence   │ ───────────────────────▶ │ occurrences / due?   │
//!   └──────────────┘   [now ± tolerance]      └──────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **"Now" is always an input.** Expansion and due checks never read the
//! clock themselves, so the same inputs always give the same verdict.
//!
//! # Modules
//!
//! - [`time`]: Timestamp normalization
//! - [`recurrence`]: RRULE expansion, due-now evaluation, dose planning checks
//! - [`models`]: Domain types (User, Patient, Medication, Schedule, etc.)
//! - [`db`]: Storage contract and SQLite implementation
//! - [`hydrate`]: Aggregate hydration and the upcoming-events window
//! - [`config`]: Hydration settings

pub mod config;
pub mod db;
pub mod hydrate;
pub mod models;
pub mod recurrence;
pub mod time;

// Re-export commonly used types
pub use config::HydrationConfig;
pub use db::{Database, DispenseAction, Store};
pub use hydrate::{ErrorKind, HydrateError, Hydrator};
pub use models::{
    DispenseEvent, DispenseStatus, Medication, Metadata, Patient, Schedule, ScheduleItem,
    ScheduleStatus, User,
};
pub use recurrence::{due_occurrence, expand, schedule_due_occurrence};
pub use time::{format_instant, parse_instant, Instant};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PillboxError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<db::DbError> for PillboxError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PillboxError::NotFound(what),
            db::DbError::Constraint(reason) => PillboxError::InvalidInput(reason),
            db::DbError::Timestamp(e) => PillboxError::InvalidTimestamp(e.to_string()),
            other => PillboxError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<HydrateError> for PillboxError {
    fn from(e: HydrateError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::InvalidTimestamp => PillboxError::InvalidTimestamp(message),
            ErrorKind::InvalidRecurrenceRule => PillboxError::InvalidRecurrenceRule(message),
            ErrorKind::StorageUnavailable => PillboxError::StorageUnavailable(message),
            ErrorKind::InvalidMetadata => PillboxError::InvalidMetadata(message),
            ErrorKind::InvalidRecord => PillboxError::InvalidRecord(message),
        }
    }
}

impl From<recurrence::RecurrenceError> for PillboxError {
    fn from(e: recurrence::RecurrenceError) -> Self {
        PillboxError::InvalidRecurrenceRule(e.to_string())
    }
}

impl From<config::ConfigError> for PillboxError {
    fn from(e: config::ConfigError) -> Self {
        PillboxError::InvalidInput(e.to_string())
    }
}

impl From<models::UnknownStatus> for PillboxError {
    fn from(e: models::UnknownStatus) -> Self {
        PillboxError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PillboxError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PillboxError::StorageUnavailable(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PillboxCore>, PillboxError> {
    let db = Database::open(&path)?;
    Ok(PillboxCore::wrap(db, HydrationConfig::default()))
}

/// Open or create a database with hydration settings given as JSON.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<PillboxCore>, PillboxError> {
    let config = HydrationConfig::from_json(&config_json)?;
    let db = Database::open(&path)?;
    Ok(PillboxCore::wrap(db, config))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PillboxCore>, PillboxError> {
    let db = Database::open_in_memory()?;
    Ok(PillboxCore::wrap(db, HydrationConfig::default()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PillboxCore {
    db: Arc<Mutex<Database>>,
    config: HydrationConfig,
}

impl std::fmt::Debug for PillboxCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PillboxCore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PillboxCore {
    fn wrap(db: Database, config: HydrationConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    /// Run `f` against the database (for provisioning and tests).
    pub fn with_database<T>(
        &self,
        f: impl FnOnce(&mut Database) -> T,
    ) -> Result<T, PillboxError> {
        let mut db = self.db.lock()?;
        Ok(f(&mut db))
    }
}

#[uniffi::export]
impl PillboxCore {
    // =========================================================================
    // Graph Operations
    // =========================================================================

    /// Get a user with all patients hydrated.
    pub fn get_user(&self, user_id: String) -> Result<Option<FfiUser>, PillboxError> {
        let db = self.db.lock()?;
        let hydrator = Hydrator::new(&*db).with_config(self.config.clone());
        let user = hydrator.load_user(&user_id)?;
        Ok(user.map(|u| u.into()))
    }

    /// Get a patient with medications, schedules and upcoming events.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, PillboxError> {
        let db = self.db.lock()?;
        let hydrator = Hydrator::new(&*db).with_config(self.config.clone());
        let patient = hydrator.load_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Upcoming dispense events for a patient, earliest first.
    pub fn upcoming_events(
        &self,
        patient_id: String,
        limit: u32,
    ) -> Result<Vec<FfiDispenseEvent>, PillboxError> {
        let db = self.db.lock()?;
        let hydrator = Hydrator::new(&*db).with_config(self.config.clone());
        let events = hydrator.load_upcoming(&patient_id, limit as usize)?;
        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Dispensing Operations
    // =========================================================================

    /// Occurrence that makes a schedule due right now, if any.
    ///
    /// Falls back to the configured tolerance when none is given.
    pub fn schedule_due_now(
        &self,
        schedule_id: String,
        tolerance_minutes: Option<u32>,
    ) -> Result<Option<String>, PillboxError> {
        let db = self.db.lock()?;
        let hydrator = Hydrator::new(&*db).with_config(self.config.clone());
        let schedule = hydrator
            .load_schedule(&schedule_id)?
            .ok_or_else(|| PillboxError::NotFound(format!("schedule {}", schedule_id)))?;

        let tolerance = tolerance_minutes.unwrap_or(self.config.due_tolerance_minutes);
        let due = schedule_due_occurrence(&schedule, tolerance, hydrator.now())?;
        Ok(due.map(|t| format_instant(&t)))
    }

    /// Record what happened to a dispense event.
    ///
    /// Resolved statuses (dispensed, skipped, missed) are stamped with the
    /// current instant.
    pub fn record_dispense_action(
        &self,
        event_id: String,
        status: String,
        action_source: Option<String>,
        notes: Option<String>,
    ) -> Result<FfiDispenseEvent, PillboxError> {
        let status: DispenseStatus = status.parse()?;
        let action = DispenseAction {
            status,
            acted_at: status.is_resolved().then(chrono::Utc::now),
            action_source,
            notes,
        };

        let mut db = self.db.lock()?;
        let record = db.record_dispense_action(&event_id, &action)?;
        let event = hydrate::hydrate_dispense_event(record)?;
        Ok(event.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe user.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub timezone: String,
    pub created_at: String,
    pub updated_at: String,
    pub patients: Vec<FfiPatient>,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            timezone: user.timezone,
            created_at: format_instant(&user.created_at),
            updated_at: format_instant(&user.updated_at),
            patients: user.patients.into_iter().map(|p| p.into()).collect(),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
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
    /// JSON object text
    pub metadata: String,
    pub created_at: String,
    pub updated_at: String,
    pub medications: Vec<FfiMedication>,
    pub schedules: Vec<FfiSchedule>,
    pub upcoming_dispense_events: Vec<FfiDispenseEvent>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            user_id: patient.user_id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            date_of_birth: time::format_optional_instant(patient.date_of_birth.as_ref()),
            gender: patient.gender,
            timezone: patient.timezone,
            preferred_language: patient.preferred_language,
            caregiver_name: patient.caregiver_name,
            caregiver_email: patient.caregiver_email,
            caregiver_phone: patient.caregiver_phone,
            notes: patient.notes,
            metadata: models::encode_metadata(&patient.metadata),
            created_at: format_instant(&patient.created_at),
            updated_at: format_instant(&patient.updated_at),
            medications: patient.medications.into_iter().map(|m| m.into()).collect(),
            schedules: patient.schedules.into_iter().map(|s| s.into()).collect(),
            upcoming_dispense_events: patient
                .upcoming_dispense_events
                .into_iter()
                .map(|e| e.into())
                .collect(),
        }
    }
}

/// FFI-safe medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
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
    pub low_stock: bool,
    pub cartridge_index: Option<i64>,
    pub manufacturer: Option<String>,
    pub external_id: Option<String>,
    pub max_daily_dose: i64,
    pub metadata: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Medication> for FfiMedication {
    fn from(medication: Medication) -> Self {
        let low_stock = medication.is_low_stock();
        Self {
            id: medication.id,
            patient_id: medication.patient_id,
            name: medication.name,
            nickname: medication.nickname,
            color: medication.color,
            shape: medication.shape,
            dosage_form: medication.dosage_form,
            strength: medication.strength,
            dosage_mg: medication.dosage_mg,
            instructions: medication.instructions,
            stock_count: medication.stock_count,
            low_stock_threshold: medication.low_stock_threshold,
            low_stock,
            cartridge_index: medication.cartridge_index,
            manufacturer: medication.manufacturer,
            external_id: medication.external_id,
            max_daily_dose: medication.max_daily_dose,
            metadata: models::encode_metadata(&medication.metadata),
            created_at: format_instant(&medication.created_at),
            updated_at: format_instant(&medication.updated_at),
        }
    }
}

/// FFI-safe schedule.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSchedule {
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
    pub metadata: String,
    pub items: Vec<FfiScheduleItem>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Schedule> for FfiSchedule {
    fn from(schedule: Schedule) -> Self {
        Self {
            id: schedule.id,
            patient_id: schedule.patient_id,
            title: schedule.title,
            timezone: schedule.timezone,
            rrule: schedule.rrule,
            start_date: format_instant(&schedule.start_date),
            end_date: time::format_optional_instant(schedule.end_date.as_ref()),
            lockout_minutes: schedule.lockout_minutes,
            snooze_interval_minutes: schedule.snooze_interval_minutes,
            snooze_max: schedule.snooze_max,
            status: schedule.status.to_string(),
            notes: schedule.notes,
            metadata: models::encode_metadata(&schedule.metadata),
            items: schedule.items.into_iter().map(|i| i.into()).collect(),
            created_at: format_instant(&schedule.created_at),
            updated_at: format_instant(&schedule.updated_at),
        }
    }
}

/// FFI-safe schedule item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScheduleItem {
    pub id: String,
    pub schedule_id: String,
    pub medication: FfiMedication,
    pub qty: i64,
    pub instructions: Option<String>,
}

impl From<ScheduleItem> for FfiScheduleItem {
    fn from(item: ScheduleItem) -> Self {
        Self {
            id: item.id,
            schedule_id: item.schedule_id,
            medication: item.medication.into(),
            qty: item.qty,
            instructions: item.instructions,
        }
    }
}

/// FFI-safe dispense event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDispenseEvent {
    pub id: String,
    pub patient_id: String,
    pub schedule_id: String,
    pub schedule_item_id: Option<String>,
    pub due_at: String,
    pub acted_at: Option<String>,
    pub status: String,
    pub action_source: Option<String>,
    pub notes: Option<String>,
    pub metadata: String,
    pub created_at: String,
}

impl From<DispenseEvent> for FfiDispenseEvent {
    fn from(event: DispenseEvent) -> Self {
        Self {
            id: event.id,
            patient_id: event.patient_id,
            schedule_id: event.schedule_id,
            schedule_item_id: event.schedule_item_id,
            due_at: format_instant(&event.due_at),
            acted_at: time::format_optional_instant(event.acted_at.as_ref()),
            status: event.status.to_string(),
            action_source: event.action_source,
            notes: event.notes,
            metadata: models::encode_metadata(&event.metadata),
            created_at: format_instant(&event.created_at),
        }
    }
}
