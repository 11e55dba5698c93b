//! Monthly VR (meal voucher) payout engine
//!
//! This crate merges the HR source rosters into a single employee base,
//! filters out ineligible records, computes entitled business days per
//! union, applies termination and rate rules, and produces the monthly
//! payout sheet with the 80/20 employer/employee cost split. Every stage
//! checkpoints its result as a `;`-delimited CSV next to a plain-text
//! audit log.

#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod roster;
pub mod tables;
