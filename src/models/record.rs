//! The canonical employee record and its column vocabulary.
//!
//! After the merge phase every checkpoint carries the same canonical column
//! set. [`EmployeeRecord`] is the strongly-typed read view the calculation
//! stages use; writes still go through the checkpoint table so that unknown
//! columns survive untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use crate::roster::{Table, parse_date_flexible};

/// Canonical column names shared by every checkpoint.
pub mod columns {
    /// Employee identifier, the merge key.
    pub const MATRICULA: &str = "MATRICULA";
    /// Admission date, formatted `dd/mm/yyyy` in checkpoints.
    pub const ADMISSAO: &str = "Admissão";
    /// Job title.
    pub const CARGO: &str = "Cargo";
    /// Status description (leave, active, ...).
    pub const DESC_SITUACAO: &str = "DESC. SITUACAO";
    /// Vacation days taken in the period.
    pub const DIAS_FERIAS: &str = "DIAS DE FÉRIAS";
    /// Union affiliation.
    pub const SINDICATO: &str = "Sindicato";
    /// Termination date, when present.
    pub const DATA_DEMISSAO: &str = "DATA DEMISSÃO";
    /// Termination notice status (`OK` triggers the cut-off rule).
    pub const COMUNICADO: &str = "COMUNICADO DE DESLIGAMENTO";
    /// Entitled business days, appended by the accrual stage.
    pub const DIAS_UTEIS: &str = "DIAS_UTEIS";
    /// Total payout, appended by the rate stage.
    pub const VALOR_TOTAL: &str = "VALOR TOTAL VR";

    /// The fixed column order of the unified roster checkpoint.
    pub const UNIFIED: [&str; 8] = [
        MATRICULA,
        ADMISSAO,
        CARGO,
        DESC_SITUACAO,
        DIAS_FERIAS,
        SINDICATO,
        DATA_DEMISSAO,
        COMUNICADO,
    ];

    /// Column names that may carry a state or UF value.
    pub const STATE_CANDIDATES: [&str; 3] = ["ESTADO", "UF", "STATE"];
}

/// One employee, as read from a checkpoint row.
///
/// Numeric and date fields are parsed leniently; anything unreadable falls
/// back to zero / `None`, per the data-quality policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeRecord {
    /// Unique employee identifier.
    pub matricula: String,
    /// Admission date in display form (may be empty).
    pub admissao: String,
    /// Job title.
    pub cargo: String,
    /// Status description.
    pub situacao: String,
    /// Vacation days recorded on this row.
    pub dias_ferias: i64,
    /// Union affiliation, as written in the source.
    pub sindicato: String,
    /// Termination date, when present and parsable.
    pub data_demissao: Option<NaiveDate>,
    /// Termination notice status.
    pub comunicado: String,
    /// Entitled business days (0 before the accrual stage runs).
    pub dias_uteis: i64,
    /// Total payout (0 before the rate stage runs).
    pub valor_total: Decimal,
    /// Value of the first non-empty state/UF column, if the checkpoint has one.
    pub estado: Option<String>,
}

impl EmployeeRecord {
    /// Builds the typed view of one checkpoint row.
    pub fn from_row(table: &Table, row: usize) -> Self {
        let estado = columns::STATE_CANDIDATES
            .iter()
            .map(|c| table.get(row, c))
            .find(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string());

        Self {
            matricula: table.get(row, columns::MATRICULA).trim().to_string(),
            admissao: table.get(row, columns::ADMISSAO).trim().to_string(),
            cargo: table.get(row, columns::CARGO).trim().to_string(),
            situacao: table.get(row, columns::DESC_SITUACAO).trim().to_string(),
            dias_ferias: parse_days(table.get(row, columns::DIAS_FERIAS)),
            sindicato: table.get(row, columns::SINDICATO).trim().to_string(),
            data_demissao: parse_date_flexible(table.get(row, columns::DATA_DEMISSAO)),
            comunicado: table.get(row, columns::COMUNICADO).trim().to_string(),
            dias_uteis: parse_days(table.get(row, columns::DIAS_UTEIS)),
            valor_total: parse_amount(table.get(row, columns::VALOR_TOTAL)),
            estado,
        }
    }
}

/// Parses a day-count cell leniently: integer, then float (floored), then 0.
pub fn parse_days(cell: &str) -> i64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return 0;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return n;
    }
    cell.parse::<f64>().map(|f| f.floor() as i64).unwrap_or(0)
}

/// Parses a decimal amount cell; unreadable input is zero.
pub fn parse_amount(cell: &str) -> Decimal {
    Decimal::from_str(cell.trim()).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::new(
            [
                columns::MATRICULA,
                columns::ADMISSAO,
                columns::CARGO,
                columns::DIAS_FERIAS,
                columns::SINDICATO,
                columns::DATA_DEMISSAO,
                columns::COMUNICADO,
                columns::DIAS_UTEIS,
                "UF",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        );
        table.push_row(
            [
                "1001",
                "05/03/2020",
                "Analista",
                "5",
                "SINDICATO DE SAO PAULO",
                "2024-01-20",
                "OK",
                "17",
                "SP",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        );
        table
    }

    #[test]
    fn test_from_row_reads_typed_fields() {
        let record = EmployeeRecord::from_row(&sample_table(), 0);
        assert_eq!(record.matricula, "1001");
        assert_eq!(record.dias_ferias, 5);
        assert_eq!(record.dias_uteis, 17);
        assert_eq!(
            record.data_demissao,
            NaiveDate::from_ymd_opt(2024, 1, 20)
        );
        assert_eq!(record.estado.as_deref(), Some("SP"));
    }

    #[test]
    fn test_missing_columns_default_quietly() {
        let mut table = Table::new(vec![columns::MATRICULA.to_string()]);
        table.push_row(vec!["2002".to_string()]);

        let record = EmployeeRecord::from_row(&table, 0);
        assert_eq!(record.matricula, "2002");
        assert_eq!(record.dias_uteis, 0);
        assert_eq!(record.valor_total, Decimal::ZERO);
        assert_eq!(record.data_demissao, None);
        assert_eq!(record.estado, None);
    }

    #[test]
    fn test_parse_days_is_lenient() {
        assert_eq!(parse_days("15"), 15);
        assert_eq!(parse_days("15.0"), 15);
        assert_eq!(parse_days("15.9"), 15);
        assert_eq!(parse_days(""), 0);
        assert_eq!(parse_days("quinze"), 0);
        assert_eq!(parse_days("-3"), -3);
    }

    #[test]
    fn test_parse_amount_is_lenient() {
        assert_eq!(parse_amount("350.00"), Decimal::new(35000, 2));
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
    }
}
