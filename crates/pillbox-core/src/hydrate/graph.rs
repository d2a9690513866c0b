//! Aggregate hydration over a [`Store`].

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::entities::{
    hydrate_dispense_event, hydrate_medication, hydrate_schedule_item, patient_fields,
    schedule_fields, user_fields,
};
use super::{HydrateError, HydrateResult};
use crate::config::HydrationConfig;
use crate::db::{DbError, PatientRecord, ScheduleRecord, Store, UserRecord};
use crate::models::{DispenseEvent, Medication, Patient, Schedule, User};
use crate::time::{format_instant, Instant};

/// Builds aggregates for one request.
///
/// The evaluation instant is fixed at construction, so every patient in a
/// user graph sees the same upcoming-events window.
pub struct Hydrator<'a, S: Store + ?Sized> {
    store: &'a S,
    now: Instant,
    config: HydrationConfig,
}

impl<'a, S: Store + ?Sized> Hydrator<'a, S> {
    /// Hydrator evaluating at the current clock.
    pub fn new(store: &'a S) -> Self {
        Self::at(store, Utc::now())
    }

    /// Hydrator evaluating at a caller-supplied instant.
    pub fn at(store: &'a S, now: Instant) -> Self {
        Self {
            store,
            now,
            config: HydrationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HydrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn now(&self) -> &Instant {
        &self.now
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Load and hydrate a user. `Ok(None)` if the user does not exist.
    pub fn load_user(&self, user_id: &str) -> HydrateResult<Option<User>> {
        let record = self
            .store
            .get_user(user_id)
            .map_err(|source| storage_error("user", user_id, "user", source))?;
        record.map(|r| self.hydrate_user(r)).transpose()
    }

    /// Hydrate a user and every patient they own. The first failing
    /// patient aborts the user.
    pub fn hydrate_user(&self, record: UserRecord) -> HydrateResult<User> {
        let id = record.id.clone();
        self.build_user(record).map_err(|e| aborted("user", &id, e))
    }

    fn build_user(&self, record: UserRecord) -> HydrateResult<User> {
        let patients = self
            .store
            .list_patients_by_user(&record.id)
            .map_err(|source| storage_error("user", &record.id, "patients", source))?;

        let mut user = user_fields(record)?;
        user.patients = patients
            .into_iter()
            .map(|p| self.hydrate_patient(p))
            .collect::<HydrateResult<_>>()?;

        debug!(user_id = %user.id, patients = user.patients.len(), "hydrated user");
        Ok(user)
    }

    /// Load and hydrate a patient. `Ok(None)` if the patient does not exist.
    pub fn load_patient(&self, patient_id: &str) -> HydrateResult<Option<Patient>> {
        let record = self
            .store
            .get_patient(patient_id)
            .map_err(|source| storage_error("patient", patient_id, "patient", source))?;
        record.map(|r| self.hydrate_patient(r)).transpose()
    }

    /// Hydrate a patient with medications, schedules and the upcoming-events
    /// view capped at the configured limit.
    pub fn hydrate_patient(&self, record: PatientRecord) -> HydrateResult<Patient> {
        let id = record.id.clone();
        self.build_patient(record).map_err(|e| aborted("patient", &id, e))
    }

    fn build_patient(&self, record: PatientRecord) -> HydrateResult<Patient> {
        let mut patient = patient_fields(record)?;

        patient.medications = self.load_medications(&patient.id)?;
        patient.schedules = self
            .store
            .list_schedules_by_patient(&patient.id)
            .map_err(|source| storage_error("patient", &patient.id, "schedules", source))?
            .into_iter()
            .map(|s| self.hydrate_schedule(s))
            .collect::<HydrateResult<_>>()?;
        patient.upcoming_dispense_events =
            self.load_upcoming(&patient.id, self.config.upcoming_limit as usize)?;

        debug!(
            patient_id = %patient.id,
            medications = patient.medications.len(),
            schedules = patient.schedules.len(),
            upcoming = patient.upcoming_dispense_events.len(),
            "hydrated patient"
        );
        Ok(patient)
    }

    fn load_medications(&self, patient_id: &str) -> HydrateResult<Vec<Medication>> {
        self.store
            .list_medications_by_patient(patient_id)
            .map_err(|source| storage_error("patient", patient_id, "medications", source))?
            .into_iter()
            .map(hydrate_medication)
            .collect()
    }

    /// Load and hydrate a schedule. `Ok(None)` if the schedule does not exist.
    pub fn load_schedule(&self, schedule_id: &str) -> HydrateResult<Option<Schedule>> {
        let record = self
            .store
            .get_schedule(schedule_id)
            .map_err(|source| storage_error("schedule", schedule_id, "schedule", source))?;
        record.map(|r| self.hydrate_schedule(r)).transpose()
    }

    /// Hydrate a schedule and its items, each carrying its medication.
    pub fn hydrate_schedule(&self, record: ScheduleRecord) -> HydrateResult<Schedule> {
        let id = record.id.clone();
        self.build_schedule(record).map_err(|e| aborted("schedule", &id, e))
    }

    fn build_schedule(&self, record: ScheduleRecord) -> HydrateResult<Schedule> {
        let mut schedule = schedule_fields(record)?;

        schedule.items = self
            .store
            .list_schedule_items_by_schedule(&schedule.id)
            .map_err(|source| storage_error("schedule", &schedule.id, "schedule items", source))?
            .into_iter()
            .map(hydrate_schedule_item)
            .collect::<HydrateResult<_>>()?;

        debug!(schedule_id = %schedule.id, items = schedule.items.len(), "hydrated schedule");
        Ok(schedule)
    }

    /// Events due in `[now, now + window]`, earliest first, at most `limit`.
    ///
    /// Ordering comes from the store; only the tail is dropped.
    pub fn load_upcoming(&self, patient_id: &str, limit: usize) -> HydrateResult<Vec<DispenseEvent>> {
        let window_end = self
            .now
            .checked_add_signed(self.config.upcoming_window())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let due_from = format_instant(&self.now);
        let due_to = format_instant(&window_end);

        let rows = self
            .store
            .list_dispense_events_by_patient(patient_id, &due_from, &due_to)
            .map_err(|source| storage_error("patient", patient_id, "upcoming dispense events", source))?;

        debug!(
            patient_id,
            due_from = %due_from,
            due_to = %due_to,
            rows = rows.len(),
            limit,
            "loaded dispense event window"
        );

        rows.into_iter().take(limit).map(hydrate_dispense_event).collect()
    }
}

fn storage_error(entity: &'static str, id: &str, relation: &'static str, source: DbError) -> HydrateError {
    HydrateError::Storage {
        entity,
        id: id.to_string(),
        relation,
        source,
    }
}

fn aborted(entity: &'static str, id: &str, err: HydrateError) -> HydrateError {
    warn!(entity, id, kind = %err.kind(), error = %err, "hydration aborted");
    err
}
