//! The roster merger: N labeled source rosters in, one unified roster out.
//!
//! Sources are read with their headers normalized through the synonym map,
//! outer-joined on `MATRICULA`, and coalesced so that the unified checkpoint
//! carries exactly one column per canonical field. The unified roster is the
//! first pipeline checkpoint; everything downstream reads it from disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::columns;
use crate::pipeline::{StageLog, checkpoint};

use super::dates::{format_dmy, parse_date_flexible};
use super::sources;
use super::table::Table;

/// Header synonyms mapped to their canonical column name.
///
/// Matching is whitespace- and case-insensitive, so each entry also covers
/// its casing variants.
pub const COLUMN_SYNONYMS: &[(&str, &str)] = &[
    ("MATRICULA", columns::MATRICULA),
    ("ADMISSÃO", columns::ADMISSAO),
    ("DATA ADMISSAO", columns::ADMISSAO),
    ("CARGO", columns::CARGO),
    ("TITULO DO CARGO", columns::CARGO),
    ("DESC. SITUACAO", columns::DESC_SITUACAO),
    ("DIAS DE FÉRIAS", columns::DIAS_FERIAS),
    ("SINDICATO", columns::SINDICATO),
    ("DATA DEMISSÃO", columns::DATA_DEMISSAO),
    ("COMUNICADO DE DESLIGAMENTO", columns::COMUNICADO),
];

/// The labeled source rosters feeding the merge, in join order.
const SOURCES: [(&str, &str); 4] = [
    (sources::ACTIVE, "ATIVOS"),
    (sources::VACATION, "FÉRIAS"),
    (sources::TERMINATED, "DESLIGADOS"),
    (sources::ADMISSION, "ADMISSÃO"),
];

/// Merges the four source rosters into the unified roster checkpoint.
///
/// Returns the path of `base_unificada.csv`. Fails only on structural
/// problems: a missing source file, or a source without a `MATRICULA`
/// column. Unparsable admission dates become empty cells, not errors.
pub fn merge_rosters(input_dir: &Path, output_dir: &Path) -> EngineResult<PathBuf> {
    let mut log = StageLog::new("unificacao");
    let mut presence: HashMap<String, Vec<&'static str>> = HashMap::new();
    let mut prepared: Vec<Table> = Vec::new();

    for (prefix, label) in SOURCES {
        let path = sources::require_source(input_dir, prefix)?;
        let table = read_and_prepare(&path)?;
        if table.column_index(columns::MATRICULA).is_none() {
            return Err(EngineError::MissingColumn {
                path: path.display().to_string(),
                expected: columns::MATRICULA.to_string(),
            });
        }
        info!(source = label, rows = table.len(), "source roster loaded");
        for row in 0..table.len() {
            let matricula = table.get(row, columns::MATRICULA).trim();
            if !matricula.is_empty() {
                presence.entry(matricula.to_string()).or_default().push(label);
            }
        }
        prepared.push(table);
    }

    let mut iter = prepared.into_iter();
    let mut merged = iter.next().expect("SOURCES is non-empty");
    for mut right in iter {
        merged.dedup_columns();
        right.dedup_columns();
        merged = merged.outer_join(&right, columns::MATRICULA)?;
        merged.coalesce_dup_columns();
        merged.dedup_columns();
    }

    for name in columns::UNIFIED {
        if merged.column_index(name).is_none() {
            warn!(column = name, "column absent from every source, emitting empty");
            log.push(format!("Coluna '{name}' ausente em todas as fontes; emitida vazia."));
        }
    }
    let mut unified = merged.select_columns(&columns::UNIFIED);

    for row in 0..unified.len() {
        let cell = unified.get(row, columns::ADMISSAO).to_string();
        let formatted = parse_date_flexible(&cell).map(format_dmy).unwrap_or_default();
        unified.set(row, columns::ADMISSAO, formatted);
    }

    for row in 0..unified.len() {
        let matricula = unified.get(row, columns::MATRICULA);
        let from = presence
            .get(matricula)
            .map(|labels| labels.join(", "))
            .unwrap_or_default();
        log.push(format!("Matrícula {matricula}: unificada a partir de [{from}]"));
    }

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(checkpoint::UNIFIED);
    unified.write_delimited(&path)?;
    log.write_beside(&path)?;
    info!(rows = unified.len(), path = %path.display(), "unified roster written");
    Ok(path)
}

/// Reads one source roster and normalizes it to canonical columns.
fn read_and_prepare(path: &Path) -> EngineResult<Table> {
    let mut table = Table::read_delimited(path)?;
    table.drop_unnamed_columns();
    table.apply_synonyms(COLUMN_SYNONYMS);
    table.dedup_columns();
    let present: Vec<&str> = columns::UNIFIED
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_some())
        .collect();
    Ok(table.select_columns(&present))
}
