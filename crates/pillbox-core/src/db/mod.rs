//! Database layer for pillbox.
//!
//! [`Store`] is the read contract the hydrator consumes; [`Database`] is
//! its SQLite implementation and also owns the write paths.

mod events;
mod medications;
mod patients;
mod records;
mod schedules;
mod schema;
mod store;
mod users;

pub use events::*;
pub use records::*;
pub use schema::*;
pub use store::*;

use rusqlite::{Connection, Transaction};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] crate::time::TimeError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` succeeds. On error the transaction is dropped
    /// uncommitted, which rolls it back, and the error is returned.
    pub fn with_transaction<T, F>(&mut self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> DbResult<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pillbox.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_patient(&PatientRecord::new("Ada".into(), "Lovelace".into()))
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "users",
            "patients",
            "medications",
            "schedules",
            "schedule_items",
            "dispense_events",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut db = Database::open_in_memory().unwrap();
        let patient = PatientRecord::new("Ada".into(), "Lovelace".into());

        let result: DbResult<()> = db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO patients (id, first_name) VALUES (?1, ?2)",
                [&patient.id, &patient.first_name],
            )?;
            Err(DbError::Constraint("abort".into()))
        });
        assert!(result.is_err());

        assert!(db.get_patient(&patient.id).unwrap().is_none());
    }

    #[test]
    fn test_transaction_commits() {
        let mut db = Database::open_in_memory().unwrap();
        let patient = PatientRecord::new("Ada".into(), "Lovelace".into());

        db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO patients (id, first_name) VALUES (?1, ?2)",
                [&patient.id, &patient.first_name],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.get_patient(&patient.id).unwrap().is_some());
    }
}
