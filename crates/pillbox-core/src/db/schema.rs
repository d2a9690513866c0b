//! SQLite schema definition.

/// Complete database schema for pillbox.
///
/// Timestamps are TEXT. Rows written by the core use the canonical
/// fixed-width RFC 3339 layout; column defaults use SQLite's
/// `datetime('now')` layout. Both parse through [`crate::time`].
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    phone TEXT,
    timezone TEXT NOT NULL DEFAULT 'UTC',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    user_id TEXT REFERENCES users(id) ON DELETE SET NULL,   -- NULL when detached
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL DEFAULT '',
    date_of_birth TEXT,
    gender TEXT,
    timezone TEXT NOT NULL DEFAULT 'UTC',
    preferred_language TEXT,
    caregiver_name TEXT,
    caregiver_email TEXT,
    caregiver_phone TEXT,
    notes TEXT,
    metadata TEXT,                                          -- JSON object
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_user ON patients(user_id);

-- ============================================================================
-- Medications
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    nickname TEXT,
    color TEXT,
    shape TEXT,
    dosage_form TEXT,
    strength TEXT,
    dosage_mg INTEGER,
    instructions TEXT,
    stock_count INTEGER NOT NULL DEFAULT 0,
    low_stock_threshold INTEGER NOT NULL DEFAULT 10,
    cartridge_index INTEGER,
    manufacturer TEXT,
    external_id TEXT,
    max_daily_dose INTEGER NOT NULL DEFAULT 1,
    metadata TEXT,                                          -- JSON object
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medications_patient ON medications(patient_id);

-- ============================================================================
-- Schedules
-- ============================================================================

CREATE TABLE IF NOT EXISTS schedules (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    timezone TEXT NOT NULL DEFAULT 'UTC',
    rrule TEXT NOT NULL,
    start_date TEXT NOT NULL,                               -- DTSTART
    end_date TEXT,
    lockout_minutes INTEGER NOT NULL DEFAULT 60,
    snooze_interval_minutes INTEGER NOT NULL DEFAULT 10,
    snooze_max INTEGER NOT NULL DEFAULT 3,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'paused', 'archived')),
    notes TEXT,
    metadata TEXT,                                          -- JSON object
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_schedules_patient ON schedules(patient_id);

CREATE TABLE IF NOT EXISTS schedule_items (
    id TEXT PRIMARY KEY,
    schedule_id TEXT NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
    medication_id TEXT NOT NULL REFERENCES medications(id) ON DELETE CASCADE,
    qty INTEGER NOT NULL DEFAULT 1 CHECK (qty > 0),
    instructions TEXT
);

CREATE INDEX IF NOT EXISTS idx_schedule_items_schedule ON schedule_items(schedule_id);
CREATE INDEX IF NOT EXISTS idx_schedule_items_medication ON schedule_items(medication_id);

-- ============================================================================
-- Dispense Events (append/transition only - no updated_at)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dispense_events (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    schedule_id TEXT NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
    schedule_item_id TEXT REFERENCES schedule_items(id) ON DELETE SET NULL,
    due_at TEXT NOT NULL,
    acted_at TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'dispensed', 'skipped', 'missed', 'snoozed')),
    action_source TEXT,
    notes TEXT,
    metadata TEXT,                                          -- JSON object
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_dispense_events_patient_due ON dispense_events(patient_id, due_at);
CREATE INDEX IF NOT EXISTS idx_dispense_events_status ON dispense_events(status);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_status_constraints() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, first_name) VALUES ('p1', 'Ada')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO schedules (id, patient_id, title, rrule, start_date, status)
             VALUES ('s1', 'p1', 'Morning', 'FREQ=DAILY', '2024-01-01', 'deleted')",
            [],
        );
        assert!(result.is_err());

        conn.execute(
            "INSERT INTO schedules (id, patient_id, title, rrule, start_date)
             VALUES ('s1', 'p1', 'Morning', 'FREQ=DAILY', '2024-01-01')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO dispense_events (id, patient_id, schedule_id, due_at, status)
             VALUES ('e1', 'p1', 's1', '2024-01-01', 'taken')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_qty_must_be_positive() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO patients (id, first_name) VALUES ('p1', 'Ada');
             INSERT INTO medications (id, patient_id, name) VALUES ('m1', 'p1', 'Aspirin');
             INSERT INTO schedules (id, patient_id, title, rrule, start_date)
                 VALUES ('s1', 'p1', 'Morning', 'FREQ=DAILY', '2024-01-01');",
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO schedule_items (id, schedule_id, medication_id, qty) VALUES ('i1', 's1', 'm1', 0)",
            [],
        );
        assert!(result.is_err());
    }
}
