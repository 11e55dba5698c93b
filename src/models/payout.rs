//! The final payout sheet row and its cost split.

use rust_decimal::Decimal;
use serde::Serialize;

use super::Competence;

/// Employer share of the benefit cost (80%).
fn employer_share() -> Decimal {
    Decimal::new(8, 1)
}

/// Employee share of the benefit cost (20%).
fn employee_share() -> Decimal {
    Decimal::new(2, 1)
}

/// Rounds to cents and pins the scale so the sheet always shows two decimals.
fn cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// One row of the final payout sheet sent to the benefit operator.
///
/// # Example
///
/// ```
/// use vr_engine::models::{Competence, PayoutRow};
/// use rust_decimal::Decimal;
///
/// let row = PayoutRow::new(
///     "1001".to_string(),
///     "01/02/2020".to_string(),
///     "SINDICATO DE SAO PAULO".to_string(),
///     "05.2025".parse::<Competence>().unwrap(),
///     10,
///     Decimal::new(3500, 2),
///     Decimal::new(35000, 2),
///     "".to_string(),
/// );
/// assert_eq!(row.custo_empresa, Decimal::new(28000, 2));
/// assert_eq!(row.desconto_profissional, Decimal::new(7000, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutRow {
    /// Employee identifier.
    pub matricula: String,
    /// Admission date in `dd/mm/yyyy` form (may be empty).
    pub admissao: String,
    /// Union affiliation, as written in the roster.
    pub sindicato: String,
    /// The billing cycle this sheet covers.
    pub competencia: Competence,
    /// Entitled business days.
    pub dias: i64,
    /// Per-day rate, rounded to cents.
    pub valor_diario: Decimal,
    /// Total payout, rounded to cents.
    pub total: Decimal,
    /// Employer share: 80% of the total.
    pub custo_empresa: Decimal,
    /// Employee share: 20% of the total.
    pub desconto_profissional: Decimal,
    /// Accumulated observations, ` | `-joined.
    pub obs: String,
}

impl PayoutRow {
    /// Header of the final sheet, in its fixed order.
    pub const COLUMNS: [&'static str; 10] = [
        "Matricula",
        "Admissão",
        "Sindicato do Colaborador",
        "Competência",
        "Dias",
        "VALOR DIÁRIO VR",
        "TOTAL",
        "Custo empresa",
        "Desconto profissional",
        "OBS GERAL",
    ];

    /// Builds a row, rounding the monetary fields and deriving the cost split.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        matricula: String,
        admissao: String,
        sindicato: String,
        competencia: Competence,
        dias: i64,
        valor_diario: Decimal,
        total: Decimal,
        obs: String,
    ) -> Self {
        Self {
            matricula,
            admissao,
            sindicato,
            competencia,
            dias,
            valor_diario: cents(valor_diario),
            total: cents(total),
            custo_empresa: cents(total * employer_share()),
            desconto_profissional: cents(total * employee_share()),
            obs,
        }
    }

    /// The row as string cells, in [`PayoutRow::COLUMNS`] order.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.matricula.clone(),
            self.admissao.clone(),
            self.sindicato.clone(),
            self.competencia.to_string(),
            self.dias.to_string(),
            self.valor_diario.to_string(),
            self.total.to_string(),
            self.custo_empresa.to_string(),
            self.desconto_profissional.to_string(),
            self.obs.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn competence() -> Competence {
        "05.2025".parse().unwrap()
    }

    #[test]
    fn test_cost_split_is_80_20() {
        let row = PayoutRow::new(
            "1001".into(),
            "".into(),
            "SINDICATO".into(),
            competence(),
            10,
            dec("35.00"),
            dec("350.00"),
            "".into(),
        );
        assert_eq!(row.custo_empresa, dec("280.00"));
        assert_eq!(row.desconto_profissional, dec("70.00"));
    }

    #[test]
    fn test_split_rounds_to_cents() {
        let row = PayoutRow::new(
            "1001".into(),
            "".into(),
            "S".into(),
            competence(),
            3,
            dec("33.33"),
            dec("99.99"),
            "".into(),
        );
        assert_eq!(row.custo_empresa, dec("79.99"));
        assert_eq!(row.desconto_profissional, dec("20.00"));
    }

    #[test]
    fn test_to_record_matches_column_order() {
        let row = PayoutRow::new(
            "1001".into(),
            "01/02/2020".into(),
            "SINDICATO DE SAO PAULO".into(),
            competence(),
            10,
            dec("35.00"),
            dec("350.00"),
            "Sem observações".into(),
        );
        let record = row.to_record();
        assert_eq!(record.len(), PayoutRow::COLUMNS.len());
        assert_eq!(record[0], "1001");
        assert_eq!(record[3], "05.2025");
        assert_eq!(record[4], "10");
        assert_eq!(record[6], "350.00");
        assert_eq!(record[9], "Sem observações");
    }

    #[test]
    fn test_monetary_cells_always_show_two_decimals() {
        let row = PayoutRow::new(
            "1001".into(),
            "".into(),
            "S".into(),
            competence(),
            0,
            dec("35"),
            dec("0"),
            "".into(),
        );
        assert_eq!(row.valor_diario.to_string(), "35.00");
        assert_eq!(row.total.to_string(), "0.00");
        assert_eq!(row.custo_empresa.to_string(), "0.00");
    }
}
