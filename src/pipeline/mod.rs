//! The checkpointed calculation pipeline.
//!
//! Six stages run in a fixed order, each reading the previous stage's
//! checkpoint from the output directory and writing its own one next to a
//! plain-text audit log. Because every intermediate lives on disk, a stage
//! can be re-run (or inspected) in isolation, and later stages fall back to
//! earlier checkpoints when an optional stage was skipped.

mod accrual;
mod audit;
pub mod checkpoint;
mod eligibility;
mod payout;
mod runner;
mod termination;

pub use accrual::compute_entitled_days;
pub use audit::{StageLog, log_path_for};
pub use checkpoint::find_latest_result;
pub use eligibility::filter_eligible;
pub use payout::{apply_rates, build_final_sheet};
pub use runner::run_pipeline;
pub use termination::apply_termination_rules;
