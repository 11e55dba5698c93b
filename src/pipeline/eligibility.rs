//! The eligibility filter: exclusions, date repair, and field cleanup.
//!
//! Removes records the benefit does not cover (directors, interns,
//! apprentices, employees on leave, overseas staff, and anyone outside the
//! optional eligibility list), then repairs the data that survives: broken
//! dates, missing fields, and out-of-range vacation day counts. Bad cells
//! degrade to defaults and are counted in the stage log; only a missing
//! checkpoint aborts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::EngineResult;
use crate::models::{columns, parse_days};
use crate::normalize::normalize;
use crate::roster::{Table, find_source, format_dmy, parse_date_flexible, source_names};

use super::{StageLog, checkpoint};

/// Job-title tokens that exclude a record, in normalized form.
const EXCLUDED_TITLES: [&str; 3] = ["DIRETOR", "ESTAGIARIO", "APRENDIZ"];
/// Status tokens that mark an employee as away or on leave.
const LEAVE_TOKENS: [&str; 2] = ["AFAST", "LICEN"];
/// Job-title token for overseas staff.
const OVERSEAS_TOKEN: &str = "EXTERIOR";
/// Vacation day counts above this are treated as data errors.
const MAX_VACATION_DAYS: i64 = 60;

/// Filters the unified roster down to eligible records and repairs them.
///
/// Reads the checkpoint at `unified_path`, writes
/// `base_unificada_validada.csv` (plus its log) into the same directory, and
/// returns the new checkpoint path.
pub fn filter_eligible(input_dir: &Path, unified_path: &Path) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("validacao");
    let mut table = Table::read_delimited(unified_path)?;
    info!(rows = table.len(), "roster loaded for eligibility filtering");

    let allowlist = read_allowlist(input_dir)?;
    let situation_col = table
        .find_column(|name| name.contains("SITUACAO"))
        .map(|i| table.columns()[i].clone());

    let mut keep = Vec::with_capacity(table.len());
    let mut removed_by_title = 0usize;
    let mut removed_by_leave = 0usize;
    let mut removed_by_overseas = 0usize;
    let mut removed_by_allowlist = 0usize;
    let mut removed_ids = Vec::new();

    for row in 0..table.len() {
        let matricula = table.get(row, columns::MATRICULA).trim().to_string();
        let title = normalize(table.get(row, columns::CARGO));
        let situation = situation_col
            .as_deref()
            .map(|c| normalize(table.get(row, c)))
            .unwrap_or_default();

        let mut reason = None;
        if EXCLUDED_TITLES.iter().any(|t| title.contains(t)) {
            removed_by_title += 1;
            reason = Some("cargo excluído");
        } else if LEAVE_TOKENS.iter().any(|t| situation.contains(t)) {
            removed_by_leave += 1;
            reason = Some("afastamento/licença");
        } else if title.contains(OVERSEAS_TOKEN) {
            removed_by_overseas += 1;
            reason = Some("atuação no exterior");
        } else if let Some(allowed) = &allowlist {
            if !allowed.contains(&matricula) {
                removed_by_allowlist += 1;
                reason = Some("fora da lista de elegíveis");
            }
        }

        match reason {
            Some(reason) => {
                log.push(format!("Matrícula {matricula}: removida ({reason})"));
                removed_ids.push(matricula);
                keep.push(false);
            }
            None => {
                log.push(format!("Matrícula {matricula}: elegível"));
                keep.push(true);
            }
        }
    }
    table.retain_rows(&keep);

    log.push(format!("Removidos por cargo: {removed_by_title}"));
    log.push(format!("Removidos por afastamento/licença: {removed_by_leave}"));
    log.push(format!("Removidos por atuação no exterior: {removed_by_overseas}"));
    log.push(format!("Removidos por lista de elegíveis: {removed_by_allowlist}"));
    log.push(format!(
        "Total removidos: {} | Matrículas: [{}]",
        removed_ids.len(),
        removed_ids.join(", ")
    ));

    repair_dates(&mut table, &mut log);
    fill_missing(&mut table, &mut log);
    clamp_vacation_days(&mut table, &mut log);

    let path = unified_path.with_file_name(checkpoint::VALIDATED);
    table.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(rows = table.len(), path = %path.display(), "validated roster written");
    Ok(path)
}

/// Reads the optional eligibility list; `None` means everyone is eligible.
fn read_allowlist(input_dir: &Path) -> EngineResult<Option<HashSet<String>>> {
    let Some(path) = find_source(input_dir, source_names::ELIGIBILITY) else {
        return Ok(None);
    };
    let table = Table::read_delimited(&path)?;
    let set = (0..table.len())
        .map(|row| table.get(row, columns::MATRICULA).trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    Ok(Some(set))
}

/// Repairs every date-like column via ISO → day-first → Excel serial.
///
/// The admission column keeps its `dd/mm/yyyy` display form; other date
/// columns are rewritten as ISO. Unparsable cells become empty.
fn repair_dates(table: &mut Table, log: &mut StageLog) {
    let date_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|name| {
            let n = normalize(name);
            n.contains("DATA") || n.contains("ADMISS")
        })
        .cloned()
        .collect();

    for column in date_columns {
        let mut invalid = 0usize;
        for row in 0..table.len() {
            let cell = table.get(row, &column).to_string();
            if cell.trim().is_empty() {
                continue;
            }
            let repaired = match parse_date_flexible(&cell) {
                Some(date) if column == columns::ADMISSAO => format_dmy(date),
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => {
                    invalid += 1;
                    String::new()
                }
            };
            table.set(row, &column, repaired);
        }
        if invalid > 0 {
            log.push(format!(
                "Coluna {column}: {invalid} datas inválidas substituídas por vazio"
            ));
        }
    }
}

/// Fills missing numeric cells with zero. Text and date cells stay empty.
fn fill_missing(table: &mut Table, log: &mut StageLog) {
    let mut filled = 0usize;
    for row in 0..table.len() {
        if table.get(row, columns::DIAS_FERIAS).trim().is_empty() {
            table.set(row, columns::DIAS_FERIAS, "0".to_string());
            filled += 1;
        }
    }
    if filled > 0 {
        log.push(format!(
            "Coluna {}: {filled} valores faltantes preenchidos com 0",
            columns::DIAS_FERIAS
        ));
    }
}

/// Clamps vacation days outside [0, 60] to zero.
fn clamp_vacation_days(table: &mut Table, log: &mut StageLog) {
    let mut corrected = 0usize;
    for row in 0..table.len() {
        let cell = table.get(row, columns::DIAS_FERIAS).to_string();
        let days = parse_days(&cell);
        if days < 0 || days > MAX_VACATION_DAYS {
            table.set(row, columns::DIAS_FERIAS, "0".to_string());
            corrected += 1;
        } else if cell.trim() != days.to_string() {
            // Normalize float-ish cells like "5.0" to their integer form.
            table.set(row, columns::DIAS_FERIAS, days.to_string());
        }
    }
    if corrected > 0 {
        log.push(format!(
            "Corrigidos {corrected} registros de férias fora do intervalo [0, {MAX_VACATION_DAYS}]"
        ));
    }
}
