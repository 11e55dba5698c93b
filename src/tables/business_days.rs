//! The union → base business-days lookup table.
//!
//! Built from the `Base dias uteis` table. The source sheet sometimes ships
//! with a banner line above the real header, so loading scans the first few
//! rows for one that carries both a union column and a business-days column.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::parse_days;
use crate::normalize::normalize;

/// How many leading rows are searched for the header.
const HEADER_SCAN_ROWS: usize = 5;

/// Immutable union → base business-day lookup, keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct BusinessDayTable {
    days: HashMap<String, i64>,
}

impl BusinessDayTable {
    /// Loads the table from a `;`-delimited file.
    ///
    /// The union column is `SINDICATO`/`SINDICADO` and the days column any
    /// header reading `DIAS UTEIS` (accents and spacing ignored). Rows above
    /// the header are skipped; no recognizable header at all is fatal.
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::SourceNotFound {
                    path: path.display().to_string(),
                }
            } else {
                EngineError::Io(e)
            }
        })?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .has_headers(false)
            .from_reader(content.as_bytes());
        let rows: Vec<Vec<String>> = reader
            .records()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|r| r.iter().map(|c| c.trim().to_string()).collect())
            .collect();

        let header = rows
            .iter()
            .take(HEADER_SCAN_ROWS)
            .enumerate()
            .find_map(|(i, row)| {
                let union_col = row
                    .iter()
                    .position(|c| matches!(normalize(c).as_str(), "SINDICATO" | "SINDICADO"))?;
                let days_col = row
                    .iter()
                    .position(|c| normalize(c).replace(' ', "") == "DIASUTEIS")?;
                Some((i, union_col, days_col))
            });
        let Some((header_row, union_col, days_col)) = header else {
            return Err(EngineError::MissingColumn {
                path: path.display().to_string(),
                expected: "SINDICATO/SINDICADO and DIAS UTEIS".to_string(),
            });
        };

        let mut days = HashMap::new();
        for row in rows.iter().skip(header_row + 1) {
            let union = row.get(union_col).map(|c| normalize(c)).unwrap_or_default();
            if union.is_empty() {
                continue;
            }
            let count = row.get(days_col).map(|c| parse_days(c)).unwrap_or(0);
            days.entry(union).or_insert(count.max(0));
        }
        Ok(Self { days })
    }

    /// Base business days for a union, looked up by normalized name.
    pub fn days_for(&self, union: &str) -> Option<i64> {
        self.days.get(&normalize(union)).copied()
    }

    /// The number of unions loaded.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Returns true when no unions were loaded.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
