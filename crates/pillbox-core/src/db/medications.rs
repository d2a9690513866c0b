//! Medication database operations.

use rusqlite::params;

use super::{Database, DbResult, MedicationRecord};

impl Database {
    /// Insert a new medication.
    pub fn insert_medication(&self, medication: &MedicationRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medications (
                id, patient_id, name, nickname, color, shape, dosage_form, strength,
                dosage_mg, instructions, stock_count, low_stock_threshold, cartridge_index,
                manufacturer, external_id, max_daily_dose, metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                medication.id,
                medication.patient_id,
                medication.name,
                medication.nickname,
                medication.color,
                medication.shape,
                medication.dosage_form,
                medication.strength,
                medication.dosage_mg,
                medication.instructions,
                medication.stock_count,
                medication.low_stock_threshold,
                medication.cartridge_index,
                medication.manufacturer,
                medication.external_id,
                medication.max_daily_dose,
                medication.metadata,
                medication.created_at,
                medication.updated_at,
            ],
        )?;
        Ok(())
    }

    /// List a patient's medications, in insertion order.
    pub fn list_medications_by_patient(&self, patient_id: &str) -> DbResult<Vec<MedicationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, name, nickname, color, shape, dosage_form, strength,
                   dosage_mg, instructions, stock_count, low_stock_threshold, cartridge_index,
                   manufacturer, external_id, max_daily_dose, metadata, created_at, updated_at
            FROM medications
            WHERE patient_id = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([patient_id], MedicationRecord::from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
