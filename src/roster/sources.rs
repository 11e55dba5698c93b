//! Locating source tables inside the input directory.
//!
//! Source files are named by convention (`ATIVOS`, `FÉRIAS`, ...) but arrive
//! with accent, case, and suffix variations (`ADMISSÃO ABRIL.csv`). Lookup
//! goes through the normalizer so any of those spellings resolve.

use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::normalize::normalize;

/// Normalized name prefix of the active-employee roster.
pub const ACTIVE: &str = "ATIVOS";
/// Normalized name prefix of the vacation roster.
pub const VACATION: &str = "FERIAS";
/// Normalized name prefix of the terminated-employee roster.
pub const TERMINATED: &str = "DESLIGADOS";
/// Normalized name prefix of the new-admission roster.
pub const ADMISSION: &str = "ADMISSAO";
/// Normalized name prefix of the absence roster.
pub const ABSENCE: &str = "AFASTAMENTOS";
/// Normalized name prefix of the union×business-days table.
pub const BUSINESS_DAYS: &str = "BASE DIAS UTEIS";
/// Normalized name prefix of the union×rate table.
pub const RATES: &str = "BASE SINDICATO X VALOR";
/// Normalized name prefix of the optional eligibility table.
pub const ELIGIBILITY: &str = "BASE TRATAMENTO EXCLUSOES";

/// Finds the first `.csv` file whose normalized stem starts with the prefix.
/// Underscores in file names count as spaces.
///
/// Directory entries are scanned in name order for determinism. Returns
/// `None` when nothing matches (including when the directory is unreadable);
/// optional sources treat that as "everyone eligible".
pub fn find_source(input_dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .collect();
    entries.sort();

    entries.into_iter().find(|path| {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| normalize(&s.replace('_', " ")))
            .unwrap_or_default();
        is_csv && stem.starts_with(&normalize(prefix))
    })
}

/// Like [`find_source`], but a miss is a fatal [`EngineError::SourceNotFound`].
pub fn require_source(input_dir: &Path, prefix: &str) -> EngineResult<PathBuf> {
    find_source(input_dir, prefix).ok_or_else(|| EngineError::SourceNotFound {
        path: format!("{}/{prefix}*.csv", input_dir.display()),
    })
}
