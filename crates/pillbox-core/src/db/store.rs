//! Read contract consumed by the hydrator.

use super::{
    Database, DbResult, DispenseEventRecord, MedicationRecord, PatientRecord, ScheduleItemRow,
    ScheduleRecord, UserRecord,
};

/// Row-returning queries the hydrator needs.
///
/// Window bounds are passed pre-formatted by [`crate::time::format_instant`].
pub trait Store {
    fn get_user(&self, user_id: &str) -> DbResult<Option<UserRecord>>;

    fn get_patient(&self, patient_id: &str) -> DbResult<Option<PatientRecord>>;

    fn get_schedule(&self, schedule_id: &str) -> DbResult<Option<ScheduleRecord>>;

    /// Patients owned by a user, in load order.
    fn list_patients_by_user(&self, user_id: &str) -> DbResult<Vec<PatientRecord>>;

    fn list_medications_by_patient(&self, patient_id: &str) -> DbResult<Vec<MedicationRecord>>;

    fn list_schedules_by_patient(&self, patient_id: &str) -> DbResult<Vec<ScheduleRecord>>;

    /// Items of a schedule joined with their medication, in storage order.
    fn list_schedule_items_by_schedule(&self, schedule_id: &str) -> DbResult<Vec<ScheduleItemRow>>;

    /// Events due in `[due_from, due_to]`, ascending by due instant.
    fn list_dispense_events_by_patient(
        &self,
        patient_id: &str,
        due_from: &str,
        due_to: &str,
    ) -> DbResult<Vec<DispenseEventRecord>>;
}

impl Store for Database {
    fn get_user(&self, user_id: &str) -> DbResult<Option<UserRecord>> {
        Database::get_user(self, user_id)
    }

    fn get_patient(&self, patient_id: &str) -> DbResult<Option<PatientRecord>> {
        Database::get_patient(self, patient_id)
    }

    fn get_schedule(&self, schedule_id: &str) -> DbResult<Option<ScheduleRecord>> {
        Database::get_schedule(self, schedule_id)
    }

    fn list_patients_by_user(&self, user_id: &str) -> DbResult<Vec<PatientRecord>> {
        Database::list_patients_by_user(self, user_id)
    }

    fn list_medications_by_patient(&self, patient_id: &str) -> DbResult<Vec<MedicationRecord>> {
        Database::list_medications_by_patient(self, patient_id)
    }

    fn list_schedules_by_patient(&self, patient_id: &str) -> DbResult<Vec<ScheduleRecord>> {
        Database::list_schedules_by_patient(self, patient_id)
    }

    fn list_schedule_items_by_schedule(&self, schedule_id: &str) -> DbResult<Vec<ScheduleItemRow>> {
        Database::list_schedule_items_by_schedule(self, schedule_id)
    }

    fn list_dispense_events_by_patient(
        &self,
        patient_id: &str,
        due_from: &str,
        due_to: &str,
    ) -> DbResult<Vec<DispenseEventRecord>> {
        Database::list_dispense_events_by_patient(self, patient_id, due_from, due_to)
    }
}
