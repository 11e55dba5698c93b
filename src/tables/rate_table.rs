//! The union/state → per-day-rate lookup table.
//!
//! Built once per pipeline run from the `Base sindicato x valor` table and
//! passed read-only into the payout stage. Keys are held in two forms (raw
//! uppercased and fully normalized) and state-name keys are additionally
//! aliased by their two-letter UF code, so the multi-tier resolution in
//! [`RateTable::resolve`] can match sloppy union strings.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::normalize::{normalize, state_for_uf, uf_for_state};
use crate::roster::Table;

/// Accepted key-column headers, in normalized form.
const KEY_HEADERS: [&str; 3] = ["SINDICATO", "SINDICADO", "ESTADO"];
/// Accepted value-column headers, in normalized form.
const VALUE_HEADERS: [&str; 3] = ["VALOR", "VALOR VR", "VALORVR"];

/// Which resolution tier produced a rate match.
///
/// Recorded in the stage log and in the row observation so that every
/// resolved rate can be traced back to the lookup strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "tier", content = "matched")]
pub enum RateMatchTier {
    /// Tier 1: the canonicalized union name was a table key.
    ExactUnion,
    /// Tier 2: a state/UF column on the record matched.
    StateColumn {
        /// The column the value came from.
        column: String,
    },
    /// Tier 3: a standalone two-letter UF token inside the union name matched.
    UfToken {
        /// The token that matched.
        uf: String,
    },
    /// Tier 4: a table key occurred as a substring of the union name.
    Substring {
        /// The normalized table key that matched.
        key: String,
    },
}

impl RateMatchTier {
    /// A short observation note for the final sheet, when the match was not
    /// an exact union hit.
    pub fn obs_note(&self) -> Option<&'static str> {
        match self {
            RateMatchTier::ExactUnion => None,
            RateMatchTier::StateColumn { .. } | RateMatchTier::UfToken { .. } => {
                Some("Valor diário obtido por fallback (UF/Estado)")
            }
            RateMatchTier::Substring { .. } => {
                Some("Valor diário obtido por fallback (substring)")
            }
        }
    }
}

impl fmt::Display for RateMatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateMatchTier::ExactUnion => write!(f, "match_exact_sindicato"),
            RateMatchTier::StateColumn { column } => {
                write!(f, "match_estado_column:{column}")
            }
            RateMatchTier::UfToken { uf } => write!(f, "match_uf_in_sindicato:{uf}"),
            RateMatchTier::Substring { key } => write!(f, "match_substring_norm:{key}"),
        }
    }
}

/// Immutable union/state → per-day monetary rate lookup.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    raw: HashMap<String, Decimal>,
    norm: HashMap<String, Decimal>,
    // Normalized keys in insertion order; the substring tier scans these so
    // its result does not depend on hash ordering.
    norm_order: Vec<String>,
}

impl RateTable {
    /// Loads the rate table from a `;`-delimited file.
    ///
    /// The key column is the first of `SINDICATO`/`SINDICADO`/`ESTADO` and
    /// the value column the first of `VALOR`/`VALOR VR`/`VALORVR`, matched
    /// case- and whitespace-insensitively. Missing either is fatal.
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let table = Table::read_delimited(path)?;

        let key_col = table
            .find_column(|name| KEY_HEADERS.contains(&name))
            .ok_or_else(|| EngineError::MissingColumn {
                path: path.display().to_string(),
                expected: KEY_HEADERS.join(", "),
            })?;
        let value_col = table
            .find_column(|name| VALUE_HEADERS.contains(&name))
            .ok_or_else(|| EngineError::MissingColumn {
                path: path.display().to_string(),
                expected: VALUE_HEADERS.join(", "),
            })?;

        let entries = (0..table.len()).filter_map(|row| {
            let key = table.cell(row, key_col).trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some((key, parse_rate(table.cell(row, value_col))))
            }
        });
        Ok(Self::from_entries(entries))
    }

    /// Builds a rate table from pre-parsed `(key, rate)` entries.
    ///
    /// Applies the same dual-form and UF aliasing as [`RateTable::from_path`].
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut rates = Self::default();
        for (key, rate) in entries {
            rates.insert(&key.trim().to_uppercase(), rate);
        }

        // UF aliasing: a key that names a state also answers to its code.
        let state_keys: Vec<(String, Decimal)> = rates
            .norm_order
            .iter()
            .filter_map(|k| {
                uf_for_state(k).map(|uf| (uf.to_string(), rates.norm[k]))
            })
            .collect();
        for (uf, rate) in state_keys {
            rates.insert(&uf, rate);
        }
        rates
    }

    fn insert(&mut self, raw_key: &str, rate: Decimal) {
        self.raw.insert(raw_key.to_string(), rate);
        let norm_key = normalize(raw_key);
        if self.norm.insert(norm_key.clone(), rate).is_none() {
            self.norm_order.push(norm_key);
        }
    }

    /// The number of distinct normalized keys.
    pub fn len(&self) -> usize {
        self.norm_order.len()
    }

    /// Returns true when no rates were loaded.
    pub fn is_empty(&self) -> bool {
        self.norm_order.is_empty()
    }

    /// Resolves the per-day rate for an employee.
    ///
    /// Tries, in order: exact union key, the record's state/UF column, UF
    /// tokens inside the union name, and substring containment of any table
    /// key. `state` is the first non-empty state column as
    /// `(column name, value)`. Returns `None` when every tier misses; the
    /// caller records that as `no_match` with rate zero.
    pub fn resolve(
        &self,
        union: &str,
        state: Option<(&str, &str)>,
    ) -> Option<(Decimal, RateMatchTier)> {
        let union_raw = union.trim().to_uppercase();
        let union_norm = normalize(union);

        // Tier 1: exact union name.
        if !union_raw.is_empty() {
            if let Some(&rate) = self.raw.get(&union_raw) {
                return Some((rate, RateMatchTier::ExactUnion));
            }
        }

        // Tier 2: state/UF column on the record.
        if let Some((column, value)) = state {
            if let Some(rate) = self.lookup_state_value(value) {
                return Some((
                    rate,
                    RateMatchTier::StateColumn {
                        column: column.to_string(),
                    },
                ));
            }
        }

        // Tier 3: standalone two-letter UF tokens inside the union name.
        for token in union_raw.split(|c: char| !c.is_alphanumeric()) {
            if token.len() != 2 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            if state_for_uf(token).is_some() {
                if let Some(rate) = self.lookup_state_value(token) {
                    return Some((
                        rate,
                        RateMatchTier::UfToken {
                            uf: token.to_string(),
                        },
                    ));
                }
            }
        }

        // Tier 4: any table key contained in the union name.
        if !union_norm.is_empty() {
            for key in &self.norm_order {
                if !key.is_empty() && union_norm.contains(key.as_str()) {
                    return Some((
                        self.norm[key],
                        RateMatchTier::Substring { key: key.clone() },
                    ));
                }
            }
        }

        None
    }

    /// Looks up a state-ish value: as written, normalized, and (for UF
    /// codes) via the mapped state name.
    fn lookup_state_value(&self, value: &str) -> Option<Decimal> {
        let raw = value.trim().to_uppercase();
        let mut candidates = vec![raw.clone(), normalize(&raw)];
        if let Some(state) = state_for_uf(&raw) {
            candidates.push(state.to_string());
            candidates.push(normalize(state));
        }
        for candidate in candidates {
            if let Some(&rate) = self.raw.get(&candidate) {
                return Some(rate);
            }
            if let Some(&rate) = self.norm.get(&candidate) {
                return Some(rate);
            }
        }
        None
    }
}

/// Parses a currency cell using the Brazilian convention (`.` thousands,
/// `,` decimals) and applies the power-of-ten scale correction.
///
/// Some source files carry an extra zero (`350` meaning `35,00`); a positive
/// value is divided by 1, 10, 100, 1000 in turn and the first quotient in
/// the plausible per-day range [10, 100] wins. Unparsable cells are zero.
pub fn parse_rate(cell: &str) -> Decimal {
    let cleaned: String = cell
        .replace("R$", "")
        .replace('\u{a0}', "")
        .trim()
        .replace('.', "")
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Decimal::ZERO;
    }
    let value = Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO);
    correct_scale(value)
}

fn correct_scale(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return value;
    }
    let low = Decimal::from(10);
    let high = Decimal::from(100);
    for scale in [1u32, 10, 100, 1000] {
        let candidate = value / Decimal::from(scale);
        if candidate >= low && candidate <= high {
            return candidate;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn write_rates_file(dir: &Path, header: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join("Base sindicato x valor.csv");
        let mut content = format!("{header}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_rate_brazilian_convention() {
        assert_eq!(parse_rate("R$ 35,00"), dec("35.00"));
        assert_eq!(parse_rate("1.250,00"), dec("12.5000"));
        assert_eq!(parse_rate("R$\u{a0}42,50"), dec("42.50"));
    }

    #[test]
    fn test_parse_rate_scale_correction() {
        // "350,00" parses to 350.00; divided by 10 lands in [10, 100].
        assert_eq!(parse_rate("350,00"), dec("35.0000"));
        assert_eq!(parse_rate("3500"), dec("35"));
        assert_eq!(parse_rate("35000"), dec("35"));
    }

    #[test]
    fn test_parse_rate_keeps_values_outside_heuristic() {
        // No power of ten brings 5 into [10, 100].
        assert_eq!(parse_rate("5,00"), dec("5.00"));
        assert_eq!(parse_rate("0"), dec("0"));
    }

    #[test]
    fn test_parse_rate_unparsable_is_zero() {
        assert_eq!(parse_rate(""), Decimal::ZERO);
        assert_eq!(parse_rate("-"), Decimal::ZERO);
        assert_eq!(parse_rate("n/d"), Decimal::ZERO);
    }

    #[test]
    fn test_from_path_accepts_header_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rates_file(dir.path(), "Sindicado;Valor VR", &["SAO PAULO;35,00"]);

        let rates = RateTable::from_path(&path).unwrap();
        assert_eq!(rates.resolve("SAO PAULO", None), Some((dec("35.00"), RateMatchTier::ExactUnion)));
    }

    #[test]
    fn test_from_path_missing_columns_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rates_file(dir.path(), "Nome;Preço", &["SAO PAULO;35,00"]);

        let result = RateTable::from_path(&path);
        assert!(matches!(result, Err(EngineError::MissingColumn { .. })));
    }

    #[test]
    fn test_uf_alias_added_for_state_keys() {
        let rates = RateTable::from_entries([("São Paulo".to_string(), dec("35.00"))]);
        assert_eq!(
            rates.resolve("SP", None),
            Some((dec("35.00"), RateMatchTier::ExactUnion))
        );
    }

    #[test]
    fn test_resolve_tier_2_state_column() {
        let rates = RateTable::from_entries([("SAO PAULO".to_string(), dec("35.00"))]);
        let resolved = rates.resolve("SINDICATO SEM CADASTRO", Some(("UF", "sp")));
        assert_eq!(
            resolved,
            Some((
                dec("35.00"),
                RateMatchTier::StateColumn {
                    column: "UF".to_string()
                }
            ))
        );
    }

    #[test]
    fn test_resolve_tier_3_uf_token() {
        let rates = RateTable::from_entries([("RIO DE JANEIRO".to_string(), dec("28.00"))]);
        let resolved = rates.resolve("SINDICATO ESTADO DO RJ", None);
        assert_eq!(
            resolved,
            Some((
                dec("28.00"),
                RateMatchTier::UfToken {
                    uf: "RJ".to_string()
                }
            ))
        );
    }

    #[test]
    fn test_resolve_tier_4_substring() {
        let rates = RateTable::from_entries([("SAO PAULO".to_string(), dec("35.00"))]);
        let resolved = rates.resolve("SINDICATO DO ESTADO DE SAO PAULO", None);
        assert_eq!(
            resolved,
            Some((
                dec("35.00"),
                RateMatchTier::Substring {
                    key: "SAO PAULO".to_string()
                }
            ))
        );
    }

    #[test]
    fn test_resolve_no_match_is_none() {
        let rates = RateTable::from_entries([("BAHIA".to_string(), dec("20.00"))]);
        assert_eq!(rates.resolve("SINDICATO DO PARANA", None), None);
        assert_eq!(rates.resolve("", None), None);
    }

    #[test]
    fn test_tier_serializes_tagged() {
        let tier = RateMatchTier::UfToken {
            uf: "SP".to_string(),
        };
        let value = serde_json::to_value(&tier).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"tier": "uf_token", "matched": {"uf": "SP"}})
        );
    }

    #[test]
    fn test_tier_order_exact_beats_substring() {
        let rates = RateTable::from_entries([
            ("SINDICATO DE SAO PAULO".to_string(), dec("40.00")),
            ("SAO PAULO".to_string(), dec("35.00")),
        ]);
        let resolved = rates.resolve("Sindicato de Sao Paulo", None);
        // The raw-uppercased form of the union matches the full key first.
        assert_eq!(resolved, Some((dec("40.00"), RateMatchTier::ExactUnion)));
    }

    #[test]
    fn test_tier_display_strings() {
        assert_eq!(RateMatchTier::ExactUnion.to_string(), "match_exact_sindicato");
        assert_eq!(
            RateMatchTier::StateColumn { column: "UF".into() }.to_string(),
            "match_estado_column:UF"
        );
        assert_eq!(
            RateMatchTier::UfToken { uf: "SP".into() }.to_string(),
            "match_uf_in_sindicato:SP"
        );
        assert_eq!(
            RateMatchTier::Substring { key: "SAO PAULO".into() }.to_string(),
            "match_substring_norm:SAO PAULO"
        );
    }
}
