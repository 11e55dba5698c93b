//! Checkpoint artifact naming and discovery.
//!
//! Each stage persists its output under a fixed file name in the output
//! directory; the next stage (or an external caller needing partial results)
//! reads it back from disk. Earlier checkpoints are superseded, never
//! deleted, so a run can be restarted from any stage and audited afterwards.

use std::path::{Path, PathBuf};

use crate::models::Competence;

/// The unified roster produced by the merge stage.
pub const UNIFIED: &str = "base_unificada.csv";
/// The roster after eligibility filtering and data repair.
pub const VALIDATED: &str = "base_unificada_validada.csv";
/// The roster with the entitled-days column.
pub const CALCULATED: &str = "base_unificada_calculation.csv";
/// The roster after termination-rule adjustments.
pub const TERMINATION: &str = "base_unificada_calculation_desligamento.csv";
/// The roster with resolved rates and totals.
pub const RATED: &str = "base_unificada_calculation_vr.csv";
/// Prefix of the final payout sheet file name.
pub const RESULT_PREFIX: &str = "RESULTADO_VR_MENSAL_";

/// The final sheet file name for a competence period.
pub fn result_filename(competence: Competence) -> String {
    format!("{RESULT_PREFIX}{}.csv", competence.file_suffix())
}

/// Returns the first of the named checkpoints that exists on disk.
///
/// Stages use this to fall back to an earlier checkpoint when an optional
/// one (e.g. the validated roster) was never produced.
pub fn first_existing(output_dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| output_dir.join(name))
        .find(|path| path.exists())
}

/// Finds the most recent final payout sheet, by modification time.
///
/// Absence is a legitimate "not produced yet" state, reported as `None`.
pub fn find_latest_result(output_dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(output_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(RESULT_PREFIX) && n.to_lowercase().ends_with(".csv"))
        })
        .collect();
    candidates.sort_by_key(|path| {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
    });
    candidates.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_filename_embeds_competence() {
        let competence: Competence = "05.2025".parse().unwrap();
        assert_eq!(
            result_filename(competence),
            "RESULTADO_VR_MENSAL_05_2025.csv"
        );
    }

    #[test]
    fn test_first_existing_prefers_earlier_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(UNIFIED), "MATRICULA\n").unwrap();
        std::fs::write(dir.path().join(VALIDATED), "MATRICULA\n").unwrap();

        let found = first_existing(dir.path(), &[VALIDATED, UNIFIED]).unwrap();
        assert_eq!(found.file_name().unwrap(), VALIDATED);
    }

    #[test]
    fn test_first_existing_none_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(first_existing(dir.path(), &[VALIDATED, UNIFIED]), None);
    }

    #[test]
    fn test_find_latest_result() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_latest_result(dir.path()), None);

        std::fs::write(dir.path().join("RESULTADO_VR_MENSAL_04_2025.csv"), "x").unwrap();
        let found = find_latest_result(dir.path()).unwrap();
        assert_eq!(
            found.file_name().unwrap(),
            "RESULTADO_VR_MENSAL_04_2025.csv"
        );
    }

    #[test]
    fn test_find_latest_result_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(UNIFIED), "x").unwrap();
        std::fs::write(dir.path().join("RESULTADO_VR_MENSAL_05_2025.txt"), "x").unwrap();
        assert_eq!(find_latest_result(dir.path()), None);
    }
}
