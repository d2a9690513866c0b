//! Dispense event database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult, DispenseEventRecord};
use crate::models::DispenseStatus;
use crate::time::{format_instant, format_optional_instant, parse_instant, Instant};

const EVENT_COLUMNS: &str = "id, patient_id, schedule_id, schedule_item_id, due_at, acted_at, \
     status, action_source, notes, metadata, created_at";

/// A status transition applied to a pending or snoozed event.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseAction {
    pub status: DispenseStatus,
    /// Required for resolved statuses, forbidden otherwise
    pub acted_at: Option<Instant>,
    pub action_source: Option<String>,
    /// Replaces the event notes when set
    pub notes: Option<String>,
}

impl DispenseAction {
    /// Resolve an event at `acted_at`.
    pub fn resolve(status: DispenseStatus, acted_at: Instant, action_source: Option<String>) -> Self {
        Self {
            status,
            acted_at: Some(acted_at),
            action_source,
            notes: None,
        }
    }

    /// Snooze an event (no acted instant).
    pub fn snooze(action_source: Option<String>) -> Self {
        Self {
            status: DispenseStatus::Snoozed,
            acted_at: None,
            action_source,
            notes: None,
        }
    }
}

fn query_event(conn: &Connection, event_id: &str) -> DbResult<Option<DispenseEventRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM dispense_events WHERE id = ?", EVENT_COLUMNS),
        [event_id],
        DispenseEventRecord::from_row,
    )
    .optional()
    .map_err(Into::into)
}

impl Database {
    /// Insert a dispense event.
    pub fn insert_dispense_event(&self, event: &DispenseEventRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO dispense_events (
                id, patient_id, schedule_id, schedule_item_id, due_at, acted_at,
                status, action_source, notes, metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                event.id,
                event.patient_id,
                event.schedule_id,
                event.schedule_item_id,
                event.due_at,
                event.acted_at,
                event.status,
                event.action_source,
                event.notes,
                event.metadata,
                event.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a dispense event by ID.
    pub fn get_dispense_event(&self, event_id: &str) -> DbResult<Option<DispenseEventRecord>> {
        query_event(&self.conn, event_id)
    }

    /// List a patient's events due in `[due_from, due_to]`, earliest first.
    ///
    /// Stored `due_at` values may use any layout [`parse_instant`] accepts.
    /// SQLite narrows the rows by `julianday`, with a second of slack for
    /// its floating point resolution, and the exact bounds and order are
    /// applied on parsed instants. A row SQLite can place but
    /// [`parse_instant`] rejects is kept at the end, so hydration reports it.
    pub fn list_dispense_events_by_patient(
        &self,
        patient_id: &str,
        due_from: &str,
        due_to: &str,
    ) -> DbResult<Vec<DispenseEventRecord>> {
        let from = parse_instant(due_from)?;
        let to = parse_instant(due_to)?;
        if from > to {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dispense_events \
             WHERE patient_id = ?1 \
               AND julianday(due_at) BETWEEN julianday(?2) - ?4 AND julianday(?3) + ?4 \
             ORDER BY julianday(due_at) ASC, rowid ASC",
            EVENT_COLUMNS
        ))?;

        let slack_days = 1.0 / 86_400.0;
        let rows = stmt.query_map(
            params![patient_id, format_instant(&from), format_instant(&to), slack_days],
            DispenseEventRecord::from_row,
        )?;

        let mut keyed = Vec::new();
        for row in rows {
            let record = row?;
            match parse_instant(&record.due_at) {
                Ok(due) if due < from || due > to => {}
                Ok(due) => keyed.push((Some(due), record)),
                Err(_) => keyed.push((None, record)),
            }
        }
        keyed.sort_by_key(|(due, _)| (due.is_none(), *due));

        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }

    /// Apply a status transition to an unresolved event, atomically.
    ///
    /// Resolved events are final. A `dispensed` transition also draws the
    /// item quantity from the medication's stock, never below zero. Any
    /// failure leaves both rows untouched.
    pub fn record_dispense_action(
        &mut self,
        event_id: &str,
        action: &DispenseAction,
    ) -> DbResult<DispenseEventRecord> {
        if action.status.is_resolved() != action.acted_at.is_some() {
            return Err(DbError::Constraint(format!(
                "status {} {} an acted instant",
                action.status,
                if action.status.is_resolved() { "requires" } else { "forbids" }
            )));
        }
        if action.status == DispenseStatus::Pending {
            return Err(DbError::Constraint("cannot transition back to pending".into()));
        }

        self.with_transaction(|tx| {
            let current = query_event(tx, event_id)?
                .ok_or_else(|| DbError::NotFound(format!("dispense event {}", event_id)))?;

            let current_status: DispenseStatus = current
                .status
                .parse()
                .map_err(|e: crate::models::UnknownStatus| DbError::Constraint(e.to_string()))?;
            if current_status.is_resolved() {
                return Err(DbError::Constraint(format!(
                    "dispense event {} is already {}",
                    event_id, current_status
                )));
            }

            tx.execute(
                r#"
                UPDATE dispense_events SET
                    status = ?2,
                    acted_at = ?3,
                    action_source = ?4,
                    notes = COALESCE(?5, notes)
                WHERE id = ?1
                "#,
                params![
                    event_id,
                    action.status.as_str(),
                    format_optional_instant(action.acted_at.as_ref()),
                    action.action_source,
                    action.notes,
                ],
            )?;

            if action.status == DispenseStatus::Dispensed {
                if let (Some(item_id), Some(acted_at)) = (&current.schedule_item_id, &action.acted_at) {
                    tx.execute(
                        r#"
                        UPDATE medications SET
                            stock_count = MAX(stock_count - (SELECT qty FROM schedule_items WHERE id = ?1), 0),
                            updated_at = ?2
                        WHERE id = (SELECT medication_id FROM schedule_items WHERE id = ?1)
                        "#,
                        params![item_id, format_instant(acted_at)],
                    )?;
                }
            }

            query_event(tx, event_id)?
                .ok_or_else(|| DbError::NotFound(format!("dispense event {}", event_id)))
        })
    }
}
