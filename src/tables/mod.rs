//! Read-only lookup tables shared across the pipeline.
//!
//! Both tables are constructed once per run from their source files and
//! passed explicitly into the stages that need them; no stage mutates them.

mod business_days;
mod rate_table;

pub use business_days::BusinessDayTable;
pub use rate_table::{RateMatchTier, RateTable, parse_rate};
