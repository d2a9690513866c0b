//! Graph hydration.
//!
//! Builds fully typed aggregates from the flat rows a [`Store`] returns:
//!
//! ```text
//! User ─┬─ Patient ─┬─ Medication*
//!       │           ├─ Schedule* ── ScheduleItem* (embedded Medication)
//!       │           └─ upcoming DispenseEvent* (windowed, capped)
//!       └─ Patient ...
//! ```
//!
//! Hydration is all-or-nothing per aggregate. The first field or fetch
//! failure aborts the enclosing aggregate and reaches the caller with the
//! entity and field that caused it.
//!
//! [`Store`]: crate::db::Store

mod entities;
mod graph;

pub use entities::*;
pub use graph::*;

use std::fmt;

use thiserror::Error;

use crate::db::DbError;
use crate::models::{MetadataError, UnknownStatus};
use crate::recurrence::RecurrenceError;
use crate::time::TimeError;

/// Stable failure kinds. Messages may change; kinds do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTimestamp,
    InvalidRecurrenceRule,
    StorageUnavailable,
    InvalidMetadata,
    /// An enumerated column held a value outside its enumeration
    InvalidRecord,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidTimestamp => "invalid_timestamp",
            ErrorKind::InvalidRecurrenceRule => "invalid_recurrence_rule",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::InvalidMetadata => "invalid_metadata",
            ErrorKind::InvalidRecord => "invalid_record",
        };
        f.write_str(name)
    }
}

impl From<&TimeError> for ErrorKind {
    fn from(_: &TimeError) -> Self {
        ErrorKind::InvalidTimestamp
    }
}

impl From<&RecurrenceError> for ErrorKind {
    fn from(_: &RecurrenceError) -> Self {
        ErrorKind::InvalidRecurrenceRule
    }
}

/// Hydration errors. Every variant names the entity and id it aborted.
#[derive(Error, Debug)]
pub enum HydrateError {
    #[error("{entity} {id}: field {field}: {source}")]
    Timestamp {
        entity: &'static str,
        id: String,
        field: &'static str,
        #[source]
        source: TimeError,
    },

    #[error("{entity} {id}: field metadata: {source}")]
    Metadata {
        entity: &'static str,
        id: String,
        #[source]
        source: MetadataError,
    },

    #[error("{entity} {id}: field status: {source}")]
    Status {
        entity: &'static str,
        id: String,
        #[source]
        source: UnknownStatus,
    },

    #[error("{entity} {id}: loading {relation}: {source}")]
    Storage {
        entity: &'static str,
        id: String,
        relation: &'static str,
        #[source]
        source: DbError,
    },
}

impl HydrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HydrateError::Timestamp { .. } => ErrorKind::InvalidTimestamp,
            HydrateError::Metadata { .. } => ErrorKind::InvalidMetadata,
            HydrateError::Status { .. } => ErrorKind::InvalidRecord,
            HydrateError::Storage {
                source: DbError::Timestamp(_),
                ..
            } => ErrorKind::InvalidTimestamp,
            HydrateError::Storage { .. } => ErrorKind::StorageUnavailable,
        }
    }

    /// Entity kind and id of the aggregate that failed.
    pub fn entity(&self) -> (&'static str, &str) {
        match self {
            HydrateError::Timestamp { entity, id, .. }
            | HydrateError::Metadata { entity, id, .. }
            | HydrateError::Status { entity, id, .. }
            | HydrateError::Storage { entity, id, .. } => (*entity, id.as_str()),
        }
    }
}

pub type HydrateResult<T> = Result<T, HydrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_per_variant() {
        let timestamp = HydrateError::Timestamp {
            entity: "schedule",
            id: "s1".into(),
            field: "start_date",
            source: TimeError::Empty,
        };
        assert_eq!(timestamp.kind(), ErrorKind::InvalidTimestamp);
        assert_eq!(timestamp.entity(), ("schedule", "s1"));
        assert_eq!(
            timestamp.to_string(),
            "schedule s1: field start_date: empty timestamp"
        );

        let storage = HydrateError::Storage {
            entity: "patient",
            id: "p1".into(),
            relation: "medications",
            source: DbError::Unavailable("gone".into()),
        };
        assert_eq!(storage.kind(), ErrorKind::StorageUnavailable);

        let status = HydrateError::Status {
            entity: "dispense_event",
            id: "e1".into(),
            source: UnknownStatus("lost".into()),
        };
        assert_eq!(status.kind(), ErrorKind::InvalidRecord);
    }

    #[test]
    fn test_kind_display_is_stable() {
        assert_eq!(ErrorKind::StorageUnavailable.to_string(), "storage_unavailable");
        assert_eq!(
            ErrorKind::from(&RecurrenceError::InvalidRule {
                rule: "x".into(),
                reason: "y".into()
            }),
            ErrorKind::InvalidRecurrenceRule
        );
    }
}
