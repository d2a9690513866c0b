//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult, PatientRecord};

const PATIENT_COLUMNS: &str = "id, user_id, first_name, last_name, date_of_birth, gender, \
     timezone, preferred_language, caregiver_name, caregiver_email, caregiver_phone, \
     notes, metadata, created_at, updated_at";

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &PatientRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, user_id, first_name, last_name, date_of_birth, gender,
                timezone, preferred_language, caregiver_name, caregiver_email,
                caregiver_phone, notes, metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                patient.id,
                patient.user_id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.timezone,
                patient.preferred_language,
                patient.caregiver_name,
                patient.caregiver_email,
                patient.caregiver_phone,
                patient.notes,
                patient.metadata,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [patient_id],
                PatientRecord::from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List patients owned by a user, in insertion order.
    pub fn list_patients_by_user(&self, user_id: &str) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE user_id = ? ORDER BY rowid",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([user_id], PatientRecord::from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Attach a patient to a user account, or detach with `None`.
    pub fn assign_patient_user(&self, patient_id: &str, user_id: Option<&str>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET user_id = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![user_id, patient_id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRecord;

    fn setup_db() -> (Database, UserRecord) {
        let db = Database::open_in_memory().unwrap();
        let user = UserRecord::new("grace@example.com".into(), "Grace Hopper".into());
        db.insert_user(&user).unwrap();
        (db, user)
    }

    #[test]
    fn test_insert_and_get() {
        let (db, _) = setup_db();

        let mut patient = PatientRecord::new("Ada".into(), "Lovelace".into());
        patient.date_of_birth = Some("1815-12-10".into());
        patient.metadata = Some(r#"{"room": 12}"#.into());
        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_list_by_user_in_load_order() {
        let (db, user) = setup_db();

        let mut names = Vec::new();
        for name in ["Zed", "Amy", "Bob"] {
            let mut patient = PatientRecord::new(name.into(), "Doe".into());
            patient.user_id = Some(user.id.clone());
            db.insert_patient(&patient).unwrap();
            names.push(name.to_string());
        }
        db.insert_patient(&PatientRecord::new("Unowned".into(), "Doe".into()))
            .unwrap();

        let listed: Vec<String> = db
            .list_patients_by_user(&user.id)
            .unwrap()
            .into_iter()
            .map(|p| p.first_name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_assign_user() {
        let (db, user) = setup_db();

        let patient = PatientRecord::new("Ada".into(), "Lovelace".into());
        db.insert_patient(&patient).unwrap();
        assert!(db.list_patients_by_user(&user.id).unwrap().is_empty());

        assert!(db.assign_patient_user(&patient.id, Some(&user.id)).unwrap());
        assert_eq!(db.list_patients_by_user(&user.id).unwrap().len(), 1);

        assert!(db.assign_patient_user(&patient.id, None).unwrap());
        assert!(db.get_patient(&patient.id).unwrap().unwrap().user_id.is_none());
    }
}
