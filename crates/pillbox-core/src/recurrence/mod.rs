//! Recurrence expansion and due-dose evaluation.
//!
//! Pipeline: RRULE text + DTSTART → occurrences in a window → due verdict
//!
//! Everything here is pure: the evaluation instant is always supplied by the
//! caller, so the same inputs always produce the same answer.

mod due;
mod expand;
mod planning;

pub use due::*;
pub use expand::*;
pub use planning::*;

use thiserror::Error;

/// Recurrence errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecurrenceError {
    #[error("invalid recurrence rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },
}

pub type RecurrenceResult<T> = Result<T, RecurrenceError>;
