//! Field-level mapping from flat rows to domain models.
//!
//! Nothing here touches storage. Aggregates that own children (user,
//! patient, schedule) come back with empty child lists, which
//! [`Hydrator`](super::Hydrator) fills in.

use super::{HydrateError, HydrateResult};
use crate::db::{
    DispenseEventRecord, MedicationRecord, PatientRecord, ScheduleItemRow, ScheduleRecord,
    UserRecord,
};
use crate::models::{
    decode_metadata, DispenseEvent, Medication, Metadata, Patient, Schedule, ScheduleItem, User,
};
use crate::time::{parse_instant, parse_optional_instant, Instant};

/// Context for field errors on one row.
struct Fields<'r> {
    entity: &'static str,
    id: &'r str,
}

impl<'r> Fields<'r> {
    fn new(entity: &'static str, id: &'r str) -> Self {
        Self { entity, id }
    }

    fn instant(&self, field: &'static str, text: &str) -> HydrateResult<Instant> {
        parse_instant(text).map_err(|source| self.timestamp_error(field, source))
    }

    fn optional_instant(&self, field: &'static str, text: Option<&str>) -> HydrateResult<Option<Instant>> {
        parse_optional_instant(text).map_err(|source| self.timestamp_error(field, source))
    }

    fn metadata(&self, raw: Option<&str>) -> HydrateResult<Metadata> {
        decode_metadata(raw).map_err(|source| HydrateError::Metadata {
            entity: self.entity,
            id: self.id.to_string(),
            source,
        })
    }

    fn status<T>(&self, raw: &str) -> HydrateResult<T>
    where
        T: std::str::FromStr<Err = crate::models::UnknownStatus>,
    {
        raw.parse().map_err(|source| HydrateError::Status {
            entity: self.entity,
            id: self.id.to_string(),
            source,
        })
    }

    fn timestamp_error(&self, field: &'static str, source: crate::time::TimeError) -> HydrateError {
        HydrateError::Timestamp {
            entity: self.entity,
            id: self.id.to_string(),
            field,
            source,
        }
    }
}

/// User scalars, without patients.
pub fn user_fields(record: UserRecord) -> HydrateResult<User> {
    let f = Fields::new("user", &record.id);
    let created_at = f.instant("created_at", &record.created_at)?;
    let updated_at = f.instant("updated_at", &record.updated_at)?;

    Ok(User {
        id: record.id,
        email: record.email,
        full_name: record.full_name,
        phone: record.phone,
        timezone: record.timezone,
        created_at,
        updated_at,
        patients: Vec::new(),
    })
}

/// Patient scalars and metadata, without medications, schedules or events.
pub fn patient_fields(record: PatientRecord) -> HydrateResult<Patient> {
    let f = Fields::new("patient", &record.id);
    let date_of_birth = f.optional_instant("date_of_birth", record.date_of_birth.as_deref())?;
    let metadata = f.metadata(record.metadata.as_deref())?;
    let created_at = f.instant("created_at", &record.created_at)?;
    let updated_at = f.instant("updated_at", &record.updated_at)?;

    Ok(Patient {
        id: record.id,
        user_id: record.user_id,
        first_name: record.first_name,
        last_name: record.last_name,
        date_of_birth,
        gender: record.gender,
        timezone: record.timezone,
        preferred_language: record.preferred_language,
        caregiver_name: record.caregiver_name,
        caregiver_email: record.caregiver_email,
        caregiver_phone: record.caregiver_phone,
        notes: record.notes,
        metadata,
        created_at,
        updated_at,
        medications: Vec::new(),
        schedules: Vec::new(),
        upcoming_dispense_events: Vec::new(),
    })
}

/// Schedule scalars and metadata, without items.
pub fn schedule_fields(record: ScheduleRecord) -> HydrateResult<Schedule> {
    let f = Fields::new("schedule", &record.id);
    let start_date = f.instant("start_date", &record.start_date)?;
    let end_date = f.optional_instant("end_date", record.end_date.as_deref())?;
    let status = f.status(&record.status)?;
    let metadata = f.metadata(record.metadata.as_deref())?;
    let created_at = f.instant("created_at", &record.created_at)?;
    let updated_at = f.instant("updated_at", &record.updated_at)?;

    Ok(Schedule {
        id: record.id,
        patient_id: record.patient_id,
        title: record.title,
        timezone: record.timezone,
        rrule: record.rrule,
        start_date,
        end_date,
        lockout_minutes: record.lockout_minutes,
        snooze_interval_minutes: record.snooze_interval_minutes,
        snooze_max: record.snooze_max,
        status,
        notes: record.notes,
        metadata,
        items: Vec::new(),
        created_at,
        updated_at,
    })
}

pub fn hydrate_medication(record: MedicationRecord) -> HydrateResult<Medication> {
    let f = Fields::new("medication", &record.id);
    let metadata = f.metadata(record.metadata.as_deref())?;
    let created_at = f.instant("created_at", &record.created_at)?;
    let updated_at = f.instant("updated_at", &record.updated_at)?;

    Ok(Medication {
        id: record.id,
        patient_id: record.patient_id,
        name: record.name,
        nickname: record.nickname,
        color: record.color,
        shape: record.shape,
        dosage_form: record.dosage_form,
        strength: record.strength,
        dosage_mg: record.dosage_mg,
        instructions: record.instructions,
        stock_count: record.stock_count,
        low_stock_threshold: record.low_stock_threshold,
        cartridge_index: record.cartridge_index,
        manufacturer: record.manufacturer,
        external_id: record.external_id,
        max_daily_dose: record.max_daily_dose,
        metadata,
        created_at,
        updated_at,
    })
}

/// Rebuild an item from its join row. The embedded medication comes from
/// the row itself, not from another fetch.
pub fn hydrate_schedule_item(row: ScheduleItemRow) -> HydrateResult<ScheduleItem> {
    let medication = hydrate_medication(row.medication_record())?;

    Ok(ScheduleItem {
        id: row.schedule_item_id,
        schedule_id: row.schedule_id,
        medication,
        qty: row.qty,
        instructions: row.schedule_item_instructions,
    })
}

pub fn hydrate_dispense_event(record: DispenseEventRecord) -> HydrateResult<DispenseEvent> {
    let f = Fields::new("dispense_event", &record.id);
    let due_at = f.instant("due_at", &record.due_at)?;
    let acted_at = f.optional_instant("acted_at", record.acted_at.as_deref())?;
    let status = f.status(&record.status)?;
    let metadata = f.metadata(record.metadata.as_deref())?;
    let created_at = f.instant("created_at", &record.created_at)?;

    Ok(DispenseEvent {
        id: record.id,
        patient_id: record.patient_id,
        schedule_id: record.schedule_id,
        schedule_item_id: record.schedule_item_id,
        due_at,
        acted_at,
        status,
        action_source: record.action_source,
        notes: record.notes,
        metadata,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrate::ErrorKind;
    use crate::models::{DispenseStatus, ScheduleStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_medication_mixed_timestamp_layouts() {
        let mut record = MedicationRecord::new("p1".into(), "Metformin".into());
        record.created_at = "2024-01-03 08:00:00".into();
        record.updated_at = "2024-01-03T08:00:00.000000000Z".into();

        let medication = hydrate_medication(record).unwrap();
        assert_eq!(medication.created_at, medication.updated_at);
        assert!(medication.metadata.is_empty());
    }

    #[test]
    fn test_metadata_decoded() {
        let mut record = MedicationRecord::new("p1".into(), "Metformin".into());
        record.metadata = Some(r#"{"imprint":"M 500","tags":["am"]}"#.into());

        let medication = hydrate_medication(record).unwrap();
        assert_eq!(medication.metadata["imprint"], "M 500");
    }

    #[test]
    fn test_metadata_not_object_fails() {
        let mut record = MedicationRecord::new("p1".into(), "Metformin".into());
        record.metadata = Some("[1,2]".into());

        let err = hydrate_medication(record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMetadata);
    }

    #[test]
    fn test_schedule_bad_start_names_field() {
        let mut record = ScheduleRecord::new(
            "p1".into(),
            "Morning".into(),
            "FREQ=DAILY".into(),
            &Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        );
        record.start_date = "yesterday".into();
        let id = record.id.clone();

        match schedule_fields(record).unwrap_err() {
            HydrateError::Timestamp { entity, id: got, field, .. } => {
                assert_eq!(entity, "schedule");
                assert_eq!(got, id);
                assert_eq!(field, "start_date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schedule_blank_end_is_absent() {
        let mut record = ScheduleRecord::new(
            "p1".into(),
            "Morning".into(),
            "FREQ=DAILY".into(),
            &Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        );
        record.end_date = Some("  ".into());
        record.status = "Paused".into();

        let schedule = schedule_fields(record).unwrap();
        assert_eq!(schedule.end_date, None);
        assert_eq!(schedule.status, ScheduleStatus::Paused);
        assert!(schedule.items.is_empty());
    }

    #[test]
    fn test_event_unknown_status_is_invalid_record() {
        let mut record = DispenseEventRecord::pending(
            "p1".into(),
            "s1".into(),
            &Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap(),
        );
        record.status = "teleported".into();

        assert_eq!(hydrate_dispense_event(record).unwrap_err().kind(), ErrorKind::InvalidRecord);
    }

    #[test]
    fn test_event_fields() {
        let due = Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap();
        let mut record = DispenseEventRecord::pending("p1".into(), "s1".into(), &due);
        record.status = "dispensed".into();
        record.acted_at = Some("2024-01-03 08:02:00".into());

        let event = hydrate_dispense_event(record).unwrap();
        assert_eq!(event.due_at, due);
        assert_eq!(event.status, DispenseStatus::Dispensed);
        assert_eq!(event.acted_at, Some(Utc.with_ymd_and_hms(2024, 1, 3, 8, 2, 0).unwrap()));
        assert!(event.is_consistent());
    }

    #[test]
    fn test_item_embeds_medication_and_keeps_override() {
        let mut medication = MedicationRecord::new("p1".into(), "Lisinopril".into());
        medication.instructions = Some("with water".into());
        let mut item = crate::db::ScheduleItemRecord::new("s1".into(), medication.id.clone(), 2);
        item.instructions = Some("after breakfast".into());

        let hydrated = hydrate_schedule_item(ScheduleItemRow::flatten(&item, &medication)).unwrap();
        assert_eq!(hydrated.id, item.id);
        assert_eq!(hydrated.qty, 2);
        assert_eq!(hydrated.medication.id, medication.id);
        assert_eq!(hydrated.medication.name, "Lisinopril");
        assert_eq!(hydrated.effective_instructions(), Some("after breakfast"));
    }

    #[test]
    fn test_patient_optional_birth_date() {
        let mut record = PatientRecord::new("Ada".into(), "Lovelace".into());
        record.date_of_birth = Some("1815-12-10".into());

        let patient = patient_fields(record).unwrap();
        assert_eq!(
            patient.date_of_birth,
            Some(Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap())
        );
        assert!(patient.medications.is_empty());
    }
}
