//! The payout stages: rate application and the final sheet.
//!
//! [`apply_rates`] multiplies each record's entitled days by the per-day
//! rate resolved from the union×rate table and checkpoints the totals.
//! [`build_final_sheet`] turns the rated checkpoint into the sheet sent to
//! the benefit operator: per-day value, 80/20 cost split, and an
//! observation trail explaining every degraded or zero-valued row.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{Competence, EmployeeRecord, PayoutRow, columns};
use crate::roster::{Table, format_dmy, parse_date_flexible, require_source, source_names};
use crate::tables::{RateMatchTier, RateTable};

use super::{StageLog, checkpoint};

/// Observation for a row with no union affiliation.
const OBS_NO_UNION: &str = "Sindicato não informado";
/// Observation for a row with zero entitled days.
const OBS_NO_DAYS: &str = "Sem dias úteis no período";
/// Observation when no rate tier matched.
const OBS_NO_RATE: &str = "Valor unitário do sindicato/estado não encontrado";
/// Observation when an exact-union rate backfilled the per-day value.
const OBS_RATE_FALLBACK: &str = "Valor diário obtido por fallback";
/// Observation for a termination notified on or before the cut-off day.
const OBS_TERMINATED_EARLY: &str = "Desligamento comunicado até dia 15";
/// Observation for a termination notified after the cut-off day.
const OBS_TERMINATED_LATE: &str = "Desligamento após dia 15 (proporcional)";

/// Resolves each record's rate and checkpoints `VALOR TOTAL VR`.
///
/// Reads the termination checkpoint (falling back to the calculation one),
/// writes `base_unificada_calculation_vr.csv` plus its log into
/// `output_dir`, and returns the new checkpoint path.
pub fn apply_rates(input_dir: &Path, output_dir: &Path) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("valor_vr");
    let source = checkpoint::first_existing(
        output_dir,
        &[checkpoint::TERMINATION, checkpoint::CALCULATED],
    )
    .ok_or_else(|| EngineError::PipelineError {
        message: format!(
            "no calculation checkpoint in {}: run the accrual stage first",
            output_dir.display()
        ),
    })?;
    let mut table = Table::read_delimited(&source)?;

    let rates = RateTable::from_path(&require_source(input_dir, source_names::RATES)?)?;
    if rates.is_empty() {
        warn!("rate table is empty, every row will resolve to zero");
    }

    let mut totals = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let record = EmployeeRecord::from_row(&table, row);
        let state = state_of(&table, row);
        let days = record.dias_uteis.max(0);

        let (rate, reason) = match rates.resolve(&record.sindicato, state) {
            Some((rate, tier)) => (rate, tier.to_string()),
            None => (Decimal::ZERO, "no_match".to_string()),
        };
        let total = rate * Decimal::from(days);
        log.push(format!(
            "Matrícula {}: sindicato='{}', valor_unitario={rate}, dias_uteis={days}, VALOR TOTAL VR={total} (reason={reason})",
            record.matricula, record.sindicato
        ));
        totals.push(total.to_string());
    }
    table.push_column(columns::VALOR_TOTAL, totals);

    let path = output_dir.join(checkpoint::RATED);
    table.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(path = %path.display(), "rated checkpoint written");
    Ok(path)
}

/// Builds the final payout sheet for the given competence.
///
/// Reads the rated checkpoint (falling back to the calculation one), writes
/// `RESULTADO_VR_MENSAL_{MM_YYYY}.csv` plus its log into `output_dir`, and
/// returns the result path.
pub fn build_final_sheet(
    input_dir: &Path,
    output_dir: &Path,
    competence: Competence,
) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("resultado_final");
    let source = checkpoint::first_existing(
        output_dir,
        &[checkpoint::RATED, checkpoint::CALCULATED],
    )
    .ok_or_else(|| EngineError::PipelineError {
        message: format!(
            "no rated checkpoint in {}: run the rate stage first",
            output_dir.display()
        ),
    })?;
    let table = Table::read_delimited(&source)?;
    let rates = RateTable::from_path(&require_source(input_dir, source_names::RATES)?)?;

    let mut sheet = Table::new(PayoutRow::COLUMNS.iter().map(|c| c.to_string()).collect());
    for row in 0..table.len() {
        let record = EmployeeRecord::from_row(&table, row);
        let days = record.dias_uteis.max(0);
        let mut obs = Vec::new();

        if record.sindicato.is_empty() {
            obs.push(OBS_NO_UNION.to_string());
        }
        if days == 0 {
            obs.push(OBS_NO_DAYS.to_string());
        }

        // With days on the clock the per-day value falls out of the total;
        // otherwise it is backfilled from the rate table so the sheet still
        // shows what a day would have cost.
        let (valor_diario, reason) = if days > 0 {
            (record.valor_total / Decimal::from(days), "calc_from_total".to_string())
        } else {
            match rates.resolve(&record.sindicato, state_of(&table, row)) {
                Some((rate, tier)) => {
                    obs.push(rate_note(&tier).to_string());
                    (rate, tier.to_string())
                }
                None => {
                    obs.push(OBS_NO_RATE.to_string());
                    (Decimal::ZERO, "no_match".to_string())
                }
            }
        };
        let total = if days > 0 {
            record.valor_total
        } else {
            Decimal::ZERO
        };

        if let Some(date) = record.data_demissao {
            if record.comunicado.eq_ignore_ascii_case("OK") {
                use chrono::Datelike;
                if date.day() <= 15 {
                    obs.push(OBS_TERMINATED_EARLY.to_string());
                } else {
                    obs.push(OBS_TERMINATED_LATE.to_string());
                }
            }
        }

        let obs = join_obs(obs);
        log.push(format!(
            "Matrícula {}: dias={days}, valor_diario={valor_diario}, total={total} (reason={reason}) obs='{obs}'",
            record.matricula
        ));

        let admissao = parse_date_flexible(&record.admissao)
            .map(format_dmy)
            .unwrap_or_else(|| record.admissao.clone());
        let payout = PayoutRow::new(
            record.matricula,
            admissao,
            record.sindicato,
            competence,
            days,
            valor_diario,
            total,
            obs,
        );
        sheet.push_row(payout.to_record());
    }

    let path = output_dir.join(checkpoint::result_filename(competence));
    sheet.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(rows = sheet.len(), path = %path.display(), "final payout sheet written");
    Ok(path)
}

/// The first non-empty state/UF column of a row, as `(column, value)`.
fn state_of<'t>(table: &'t Table, row: usize) -> Option<(&'static str, &'t str)> {
    columns::STATE_CANDIDATES
        .iter()
        .map(|c| (*c, table.get(row, c).trim()))
        .find(|(_, v)| !v.is_empty())
}

/// The observation attached to a backfilled per-day rate.
fn rate_note(tier: &RateMatchTier) -> &'static str {
    tier.obs_note().unwrap_or(OBS_RATE_FALLBACK)
}

/// Joins observations with ` | `, dropping duplicates but keeping first-seen
/// order.
fn join_obs(obs: Vec<String>) -> String {
    let mut seen = Vec::new();
    for o in obs {
        if !seen.contains(&o) {
            seen.push(o);
        }
    }
    seen.join(" | ")
}
