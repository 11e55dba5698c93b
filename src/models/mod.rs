//! Core data models for the VR calculation engine.
//!
//! This module contains the domain types shared across the pipeline stages.

mod competence;
mod payout;
mod record;

pub use competence::Competence;
pub use payout::PayoutRow;
pub use record::{EmployeeRecord, columns, parse_amount, parse_days};
