//! The accrual stage: entitled business days per employee.
//!
//! Starts from the union's business-day count for the competence month, then
//! applies the period events in order: an in-period termination halves the
//! base (floor division), vacation days recorded in the vacation roster are
//! subtracted, and an absence entry zeroes whatever remains. The result is
//! clamped at zero and appended to the checkpoint as `DIAS_UTEIS`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{columns, parse_days};
use crate::normalize::normalize;
use crate::roster::{COLUMN_SYNONYMS, Table, require_source, source_names};
use crate::tables::BusinessDayTable;

use super::{StageLog, checkpoint};

/// Computes entitled business days and writes the calculation checkpoint.
///
/// Reads the validated roster (falling back to the raw unified roster when
/// the eligibility stage did not run), writes
/// `base_unificada_calculation.csv` plus its log into `output_dir`, and
/// returns the new checkpoint path.
pub fn compute_entitled_days(input_dir: &Path, output_dir: &Path) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("calculo_dias");
    let source = checkpoint::first_existing(
        output_dir,
        &[checkpoint::VALIDATED, checkpoint::UNIFIED],
    )
    .ok_or_else(|| EngineError::PipelineError {
        message: format!(
            "no roster checkpoint in {}: run the merge stage first",
            output_dir.display()
        ),
    })?;
    let mut table = Table::read_delimited(&source)?;

    let business_days =
        BusinessDayTable::from_path(&require_source(input_dir, source_names::BUSINESS_DAYS)?)?;
    let vacation_days = read_vacation_days(input_dir)?;
    let absent = read_absence_set(input_dir)?;
    info!(
        rows = table.len(),
        unions = business_days.len(),
        absences = absent.len(),
        "accrual inputs loaded"
    );

    let mut entitled = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let matricula = table.get(row, columns::MATRICULA).trim().to_string();
        let sindicato = table.get(row, columns::SINDICATO).trim().to_string();
        let base = match business_days.days_for(&sindicato) {
            Some(days) => days,
            None => {
                warn!(matricula = %matricula, sindicato = %sindicato, "union missing from business-day table");
                0
            }
        };
        let mut line = format!(
            "Matrícula {matricula}: sindicato='{sindicato}' dias_uteis_base={base}"
        );

        // Any non-empty termination cell halves the base, parsable or not.
        let terminated = !table.get(row, columns::DATA_DEMISSAO).trim().is_empty();
        let mut days = base;
        if terminated {
            days = base / 2;
            line.push_str(&format!(" | Desligamento: dias_uteis {base} -> {days}"));
        }

        let vacation = vacation_days.get(&matricula).copied().unwrap_or(0);
        if vacation > 0 {
            line.push_str(&format!(" | Férias: -{vacation}"));
        }

        let mut result = days - vacation;
        if absent.contains(&matricula) {
            line.push_str(&format!(" | Afastamento: -{days} (afastado)"));
            result -= days;
        }

        let result = result.max(0);
        line.push_str(&format!(" | DIAS_UTEIS final: {result}"));
        log.push(line);
        entitled.push(result.to_string());
    }
    table.push_column(columns::DIAS_UTEIS, entitled);

    let path = output_dir.join(checkpoint::CALCULATED);
    table.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(path = %path.display(), "calculation checkpoint written");
    Ok(path)
}

/// Sums vacation days per employee from the vacation roster.
fn read_vacation_days(input_dir: &Path) -> EngineResult<HashMap<String, i64>> {
    let mut table = Table::read_delimited(&require_source(input_dir, source_names::VACATION)?)?;
    table.apply_synonyms(COLUMN_SYNONYMS);

    let mut sums: HashMap<String, i64> = HashMap::new();
    for row in 0..table.len() {
        let matricula = table.get(row, columns::MATRICULA).trim().to_string();
        if matricula.is_empty() {
            continue;
        }
        let days = parse_days(table.get(row, columns::DIAS_FERIAS)).max(0);
        *sums.entry(matricula).or_default() += days;
    }
    Ok(sums)
}

/// Collects the set of employees with an absence entry.
fn read_absence_set(input_dir: &Path) -> EngineResult<HashSet<String>> {
    let mut table = Table::read_delimited(&require_source(input_dir, source_names::ABSENCE)?)?;
    table.apply_synonyms(COLUMN_SYNONYMS);

    let column = table
        .find_column(|name| name == normalize(columns::MATRICULA))
        .ok_or_else(|| EngineError::MissingColumn {
            path: source_names::ABSENCE.to_string(),
            expected: columns::MATRICULA.to_string(),
        })?;
    Ok((0..table.len())
        .map(|row| table.cell(row, column).trim().to_string())
        .filter(|m| !m.is_empty())
        .collect())
}
