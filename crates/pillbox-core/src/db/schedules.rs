//! Schedule and schedule item database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult, ScheduleItemRecord, ScheduleItemRow, ScheduleRecord};

const SCHEDULE_COLUMNS: &str = "id, patient_id, title, timezone, rrule, start_date, end_date, \
     lockout_minutes, snooze_interval_minutes, snooze_max, status, notes, metadata, \
     created_at, updated_at";

impl Database {
    /// Insert a new schedule.
    pub fn insert_schedule(&self, schedule: &ScheduleRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO schedules (
                id, patient_id, title, timezone, rrule, start_date, end_date,
                lockout_minutes, snooze_interval_minutes, snooze_max, status,
                notes, metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                schedule.id,
                schedule.patient_id,
                schedule.title,
                schedule.timezone,
                schedule.rrule,
                schedule.start_date,
                schedule.end_date,
                schedule.lockout_minutes,
                schedule.snooze_interval_minutes,
                schedule.snooze_max,
                schedule.status,
                schedule.notes,
                schedule.metadata,
                schedule.created_at,
                schedule.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Insert a schedule item referencing an existing medication.
    pub fn insert_schedule_item(&self, item: &ScheduleItemRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO schedule_items (id, schedule_id, medication_id, qty, instructions)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                item.id,
                item.schedule_id,
                item.medication_id,
                item.qty,
                item.instructions,
            ],
        )?;
        Ok(())
    }

    /// Get a schedule by ID.
    pub fn get_schedule(&self, schedule_id: &str) -> DbResult<Option<ScheduleRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM schedules WHERE id = ?", SCHEDULE_COLUMNS),
                [schedule_id],
                ScheduleRecord::from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's schedules, in insertion order.
    pub fn list_schedules_by_patient(&self, patient_id: &str) -> DbResult<Vec<ScheduleRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM schedules WHERE patient_id = ? ORDER BY rowid",
            SCHEDULE_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], ScheduleRecord::from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List a schedule's items joined with their medications, in insertion
    /// order.
    pub fn list_schedule_items_by_schedule(&self, schedule_id: &str) -> DbResult<Vec<ScheduleItemRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT si.id AS schedule_item_id,
                   si.schedule_id AS schedule_id,
                   si.qty AS qty,
                   si.instructions AS schedule_item_instructions,
                   m.id AS medication_id,
                   m.patient_id AS medication_patient_id,
                   m.name AS medication_name,
                   m.nickname AS medication_nickname,
                   m.color AS medication_color,
                   m.shape AS medication_shape,
                   m.dosage_form AS medication_dosage_form,
                   m.strength AS medication_strength,
                   m.dosage_mg AS medication_dosage_mg,
                   m.instructions AS medication_instructions,
                   m.stock_count AS medication_stock_count,
                   m.low_stock_threshold AS medication_low_stock_threshold,
                   m.cartridge_index AS medication_cartridge_index,
                   m.manufacturer AS medication_manufacturer,
                   m.external_id AS medication_external_id,
                   m.max_daily_dose AS medication_max_daily_dose,
                   m.metadata AS medication_metadata,
                   m.created_at AS medication_created_at,
                   m.updated_at AS medication_updated_at
            FROM schedule_items si
            JOIN medications m ON m.id = si.medication_id
            WHERE si.schedule_id = ?
            ORDER BY si.rowid
            "#,
        )?;

        let rows = stmt.query_map([schedule_id], ScheduleItemRow::from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MedicationRecord, PatientRecord};
    use chrono::{TimeZone, Utc};

    fn setup_db() -> (Database, PatientRecord) {
        let db = Database::open_in_memory().unwrap();
        let patient = PatientRecord::new("Ada".into(), "Lovelace".into());
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    fn start() -> crate::time::Instant {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get_schedule() {
        let (db, patient) = setup_db();

        let mut schedule = ScheduleRecord::new(
            patient.id.clone(),
            "Morning".into(),
            "RRULE:FREQ=DAILY".into(),
            &start(),
        );
        schedule.end_date = Some("2024-06-30".into());
        db.insert_schedule(&schedule).unwrap();

        assert_eq!(db.get_schedule(&schedule.id).unwrap().unwrap(), schedule);
        assert_eq!(db.list_schedules_by_patient(&patient.id).unwrap(), vec![schedule]);
    }

    #[test]
    fn test_items_embed_medication_in_storage_order() {
        let (db, patient) = setup_db();

        let schedule = ScheduleRecord::new(
            patient.id.clone(),
            "Morning".into(),
            "FREQ=DAILY".into(),
            &start(),
        );
        db.insert_schedule(&schedule).unwrap();

        let mut meds = Vec::new();
        for name in ["Warfarin", "Aspirin"] {
            let mut med = MedicationRecord::new(patient.id.clone(), name.into());
            med.color = Some("white".into());
            db.insert_medication(&med).unwrap();
            meds.push(med);
        }

        let mut first = ScheduleItemRecord::new(schedule.id.clone(), meds[0].id.clone(), 1);
        first.instructions = Some("With food".into());
        let second = ScheduleItemRecord::new(schedule.id.clone(), meds[1].id.clone(), 2);
        db.insert_schedule_item(&first).unwrap();
        db.insert_schedule_item(&second).unwrap();

        let rows = db.list_schedule_items_by_schedule(&schedule.id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ScheduleItemRow::flatten(&first, &meds[0]));
        assert_eq!(rows[1], ScheduleItemRow::flatten(&second, &meds[1]));
        assert_eq!(rows[1].medication_record(), meds[1]);
    }

    #[test]
    fn test_same_medication_in_two_schedules() {
        let (db, patient) = setup_db();

        let med = MedicationRecord::new(patient.id.clone(), "Levothyroxine".into());
        db.insert_medication(&med).unwrap();

        for title in ["Weekday", "Weekend"] {
            let schedule = ScheduleRecord::new(
                patient.id.clone(),
                title.into(),
                "FREQ=DAILY".into(),
                &start(),
            );
            db.insert_schedule(&schedule).unwrap();
            db.insert_schedule_item(&ScheduleItemRecord::new(schedule.id.clone(), med.id.clone(), 1))
                .unwrap();

            let rows = db.list_schedule_items_by_schedule(&schedule.id).unwrap();
            assert_eq!(rows[0].medication_id, med.id);
        }
    }
}
