//! Domain models for the pillbox system.
//!
//! These are the canonical, fully hydrated shapes. The flat shapes read
//! from storage live in [`crate::db`].

mod dispense;
mod medication;
mod metadata;
mod patient;
mod schedule;
mod user;

pub use dispense::*;
pub use medication::*;
pub use metadata::*;
pub use patient::*;
pub use schedule::*;
pub use user::*;

/// A status column held a value outside its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0:?}")]
pub struct UnknownStatus(pub String);
