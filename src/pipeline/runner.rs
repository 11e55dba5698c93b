//! End-to-end pipeline orchestration.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::Competence;
use crate::roster::merge_rosters;

use super::{
    apply_rates, apply_termination_rules, build_final_sheet, compute_entitled_days,
    filter_eligible,
};

/// Runs every pipeline stage in order and returns the final sheet path.
///
/// Source tables are read from `input_dir`; checkpoints, audit logs, and the
/// result land in `output_dir`, created when absent. When `competence` is
/// `None` the current month is used. The first failing stage aborts the run;
/// checkpoints written so far are left in place for inspection.
pub fn run_pipeline(
    input_dir: &Path,
    output_dir: &Path,
    competence: Option<Competence>,
) -> EngineResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let run_id = Uuid::new_v4();
    let competence = competence.unwrap_or_default();
    let span = tracing::info_span!("pipeline", %run_id, %competence);
    let _guard = span.enter();
    info!(input = %input_dir.display(), output = %output_dir.display(), "pipeline started");

    let unified = merge_rosters(input_dir, output_dir)?;
    filter_eligible(input_dir, &unified)?;
    compute_entitled_days(input_dir, output_dir)?;
    apply_termination_rules(input_dir, output_dir)?;
    apply_rates(input_dir, output_dir)?;
    let result = build_final_sheet(input_dir, output_dir, competence)?;

    info!(result = %result.display(), "pipeline finished");
    Ok(result)
}
