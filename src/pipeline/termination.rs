//! The termination stage: the day-15 notice cut-off rule.
//!
//! An employee whose termination notice is `OK` loses the whole month when
//! the termination date falls on or before the 15th, and keeps a floored
//! half of the already-computed days when it falls after. Any other notice
//! value, or an unparsable date, leaves the entitlement untouched.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Datelike;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{columns, parse_days};
use crate::roster::{COLUMN_SYNONYMS, Table, find_source, parse_date_flexible, require_source, source_names};

use super::{StageLog, checkpoint};

/// Day of month on or before which a notified termination zeroes the benefit.
const NOTICE_CUTOFF_DAY: u32 = 15;

/// Applies the termination cut-off rule to the calculation checkpoint.
///
/// Writes `base_unificada_calculation_desligamento.csv` plus its log into
/// `output_dir` and returns the new checkpoint path.
pub fn apply_termination_rules(input_dir: &Path, output_dir: &Path) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("desligamento");
    let source = output_dir.join(checkpoint::CALCULATED);
    if !source.is_file() {
        return Err(EngineError::SourceNotFound {
            path: source.display().to_string(),
        });
    }
    let mut table = Table::read_delimited(&source)?;

    let terminations = read_terminations(input_dir)?;
    let eligible = read_eligible_set(input_dir)?;
    info!(
        rows = table.len(),
        terminations = terminations.len(),
        "termination roster loaded"
    );

    for row in 0..table.len() {
        let matricula = table.get(row, columns::MATRICULA).trim().to_string();
        if let Some(allowed) = &eligible {
            if !allowed.contains(&matricula) {
                log.push(format!(
                    "Matrícula {matricula}: não elegível ao benefício (exclusão)"
                ));
                continue;
            }
        }
        let Some((comunicado, date_cell)) = terminations.get(&matricula) else {
            continue;
        };

        let current = parse_days(table.get(row, columns::DIAS_UTEIS));
        let notified = comunicado.trim().eq_ignore_ascii_case("OK");
        match parse_date_flexible(date_cell) {
            Some(date) if notified && date.day() <= NOTICE_CUTOFF_DAY => {
                table.set(row, columns::DIAS_UTEIS, "0".to_string());
                log.push(format!(
                    "Matrícula {matricula}: comunicado OK até dia {NOTICE_CUTOFF_DAY} ({date}), DIAS_UTEIS=0"
                ));
            }
            Some(date) if notified => {
                let halved = current / 2;
                table.set(row, columns::DIAS_UTEIS, halved.to_string());
                log.push(format!(
                    "Matrícula {matricula}: comunicado OK após dia {NOTICE_CUTOFF_DAY} ({date}), DIAS_UTEIS={halved} (proporcional)"
                ));
            }
            _ => {
                log.push(format!(
                    "Matrícula {matricula}: comunicado '{comunicado}' ou data de demissão inválida, DIAS_UTEIS mantido ({current})"
                ));
            }
        }
    }

    let path = output_dir.join(checkpoint::TERMINATION);
    table.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(path = %path.display(), "termination checkpoint written");
    Ok(path)
}

/// Maps matrícula → (notice status, raw termination date cell).
fn read_terminations(input_dir: &Path) -> EngineResult<HashMap<String, (String, String)>> {
    let mut table = Table::read_delimited(&require_source(input_dir, source_names::TERMINATED)?)?;
    table.apply_synonyms(COLUMN_SYNONYMS);

    let mut map = HashMap::new();
    for row in 0..table.len() {
        let matricula = table.get(row, columns::MATRICULA).trim().to_string();
        if matricula.is_empty() {
            continue;
        }
        map.entry(matricula).or_insert_with(|| {
            (
                table.get(row, columns::COMUNICADO).trim().to_string(),
                table.get(row, columns::DATA_DEMISSAO).trim().to_string(),
            )
        });
    }
    Ok(map)
}

/// The optional eligibility list; `None` means every record is eligible.
fn read_eligible_set(input_dir: &Path) -> EngineResult<Option<HashSet<String>>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_calculated(output: &Path, rows: &[&str]) {
        let mut header: Vec<&str> = columns::UNIFIED.to_vec();
        header.push(columns::DIAS_UTEIS);
        let mut content = format!("{}\n", header.join(";"));
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(output.join(checkpoint::CALCULATED), content).unwrap();
    }

    #[test]
    fn test_notice_on_or_before_day_15_zeroes_days() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n1001;2024-01-10;OK\n",
        )
        .unwrap();
        write_calculated(
            output.path(),
            &["1001;;Analista;Trabalhando;0;SIND SP;2024-01-10;OK;11"],
        );

        let path = apply_termination_rules(input.path(), output.path()).unwrap();
        let table = Table::read_delimited(&path).unwrap();
        assert_eq!(table.get(0, columns::DIAS_UTEIS), "0");
    }

    #[test]
    fn test_notice_after_day_15_halves_days() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n1002;20/01/2024;OK\n",
        )
        .unwrap();
        write_calculated(
            output.path(),
            &["1002;;Analista;Trabalhando;0;SIND SP;20/01/2024;OK;21"],
        );

        let path = apply_termination_rules(input.path(), output.path()).unwrap();
        let table = Table::read_delimited(&path).unwrap();
        // Floored half of 21.
        assert_eq!(table.get(0, columns::DIAS_UTEIS), "10");
    }

    #[test]
    fn test_non_ok_notice_keeps_days() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n1003;2024-01-10;PENDENTE\n",
        )
        .unwrap();
        write_calculated(
            output.path(),
            &["1003;;Analista;Trabalhando;0;SIND SP;2024-01-10;PENDENTE;11"],
        );

        let path = apply_termination_rules(input.path(), output.path()).unwrap();
        let table = Table::read_delimited(&path).unwrap();
        assert_eq!(table.get(0, columns::DIAS_UTEIS), "11");
    }

    #[test]
    fn test_unparsable_date_keeps_days_with_log() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n1004;em breve;OK\n",
        )
        .unwrap();
        write_calculated(
            output.path(),
            &["1004;;Analista;Trabalhando;0;SIND SP;;;15"],
        );

        let path = apply_termination_rules(input.path(), output.path()).unwrap();
        let table = Table::read_delimited(&path).unwrap();
        assert_eq!(table.get(0, columns::DIAS_UTEIS), "15");
        let log =
            fs::read_to_string(output.path().join(
                "base_unificada_calculation_desligamento_log.txt",
            ))
            .unwrap();
        assert!(log.contains("DIAS_UTEIS mantido (15)"));
    }

    #[test]
    fn test_eligibility_list_skips_excluded_records() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n1005;2024-01-10;OK\n",
        )
        .unwrap();
        fs::write(
            input.path().join("BASE TRATAMENTO EXCLUSOES.csv"),
            "MATRICULA\n9999\n",
        )
        .unwrap();
        write_calculated(
            output.path(),
            &["1005;;Analista;Trabalhando;0;SIND SP;2024-01-10;OK;11"],
        );

        let path = apply_termination_rules(input.path(), output.path()).unwrap();
        let table = Table::read_delimited(&path).unwrap();
        // Rule not applied; the record is outside the eligibility list.
        assert_eq!(table.get(0, columns::DIAS_UTEIS), "11");
        let log =
            fs::read_to_string(output.path().join(
                "base_unificada_calculation_desligamento_log.txt",
            ))
            .unwrap();
        assert!(log.contains("Matrícula 1005: não elegível ao benefício (exclusão)"));
    }

    #[test]
    fn test_missing_calculation_checkpoint_is_fatal() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("DESLIGADOS.csv"),
            "MATRICULA;DATA DEMISSÃO;COMUNICADO DE DESLIGAMENTO\n",
        )
        .unwrap();

        let result = apply_termination_rules(input.path(), output.path());
        assert!(matches!(result, Err(EngineError::SourceNotFound { .. })));
    }
}
