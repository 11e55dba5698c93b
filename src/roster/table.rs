//! A dynamic, loosely-typed table of string cells.
//!
//! Roster spreadsheets arrive with unpredictable headers and ragged rows, so
//! the merge phase works over this untyped representation. Once columns have
//! been normalized to their canonical names the calculation stages switch to
//! the strongly-typed [`crate::models::EmployeeRecord`] view.
//!
//! Tables are persisted as `;`-delimited UTF-8 files with a byte-order mark,
//! matching the checkpoint format consumed by external callers.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::normalize::normalize;

/// Suffix attached to right-side columns that collide during a join.
pub const DUP_SUFFIX: &str = "_dup";

/// An in-memory table: named columns over rows of string cells.
///
/// Every row always has exactly one cell per column; readers pad or truncate
/// ragged input rows to keep that invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Reads a `;`-delimited table, tolerating a UTF-8 BOM and ragged rows.
    ///
    /// A missing file maps to [`EngineError::SourceNotFound`].
    pub fn read_delimited<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
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
            .from_reader(content.as_bytes());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Writes the table as `;`-delimited UTF-8 with a byte-order mark.
    pub fn write_delimited<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        let mut file = fs::File::create(path.as_ref())?;
        file.write_all("\u{feff}".as_bytes())?;

        let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// The column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Finds the first column whose normalized name satisfies the predicate.
    pub fn find_column<F: Fn(&str) -> bool>(&self, predicate: F) -> Option<usize> {
        self.columns.iter().position(|c| predicate(&normalize(c)))
    }

    /// Returns a cell by row index and column name, or `""` when the column
    /// does not exist.
    pub fn get(&self, row: usize, column: &str) -> &str {
        self.column_index(column)
            .and_then(|c| self.rows.get(row).map(|r| r[c].as_str()))
            .unwrap_or("")
    }

    /// Returns a cell by row and column index.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row][column].as_str()
    }

    /// Overwrites a cell; returns false when the column does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: String) -> bool {
        match self.column_index(column) {
            Some(c) if row < self.rows.len() => {
                self.rows[row][c] = value;
                true
            }
            _ => false,
        }
    }

    /// Appends a data row, padded or truncated to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Appends a new column with one value per existing row.
    ///
    /// Shorter value vectors are padded with empty strings.
    pub fn push_column(&mut self, name: &str, mut values: Vec<String>) {
        values.resize(self.rows.len(), String::new());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Keeps only the rows whose flag is set. The slice must be produced from
    /// this table's current row order.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut index = 0;
        self.rows.retain(|_| {
            let kept = keep.get(index).copied().unwrap_or(true);
            index += 1;
            kept
        });
    }

    /// Renames headers matching a synonym to its canonical name.
    ///
    /// Matching is whitespace- and case-insensitive (normalized form), so
    /// `" matricula "` maps through a `("Matricula", "MATRICULA")` entry.
    pub fn apply_synonyms(&mut self, synonyms: &[(&str, &str)]) {
        for column in &mut self.columns {
            let key = normalize(column);
            if let Some((_, canonical)) = synonyms
                .iter()
                .find(|(variant, _)| normalize(variant) == key)
            {
                *column = (*canonical).to_string();
            }
        }
    }

    /// Drops auto-generated unnamed columns (`Unnamed: 0` and friends).
    pub fn drop_unnamed_columns(&mut self) {
        let drop: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.is_empty() || name.starts_with("Unnamed"))
            .map(|(i, _)| i)
            .collect();
        for &index in drop.iter().rev() {
            self.remove_column(index);
        }
    }

    /// Removes later occurrences of same-named columns; the first wins.
    pub fn dedup_columns(&mut self) {
        let mut seen = HashSet::new();
        let drop: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| !seen.insert(name.to_string()))
            .map(|(i, _)| i)
            .collect();
        for &index in drop.iter().rev() {
            self.remove_column(index);
        }
    }

    /// Projects the table onto the given columns, in the given order.
    ///
    /// A requested column that does not exist comes back empty; the caller
    /// decides whether that is worth logging.
    pub fn select_columns(&self, names: &[&str]) -> Table {
        let indices: Vec<Option<usize>> = names.iter().map(|n| self.column_index(n)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|i| i.map(|c| row[c].clone()).unwrap_or_default())
                    .collect()
            })
            .collect();
        Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows,
        }
    }

    /// Outer-joins another table on a shared key column.
    ///
    /// Right-side columns whose name already exists on the left come back
    /// with the [`DUP_SUFFIX`] attached, to be folded by
    /// [`Table::coalesce_dup_columns`]. When the right side has several rows
    /// for one key, the first wins. Right-only keys are appended after the
    /// left rows, in right-side order.
    pub fn outer_join(&self, right: &Table, key: &str) -> EngineResult<Table> {
        let left_key = self
            .column_index(key)
            .ok_or_else(|| EngineError::MissingColumn {
                path: "left side of join".to_string(),
                expected: key.to_string(),
            })?;
        let right_key = right
            .column_index(key)
            .ok_or_else(|| EngineError::MissingColumn {
                path: "right side of join".to_string(),
                expected: key.to_string(),
            })?;

        let mut columns = self.columns.clone();
        // (source index in right, output name)
        let mut right_columns: Vec<(usize, String)> = Vec::new();
        for (i, name) in right.columns.iter().enumerate() {
            if i == right_key {
                continue;
            }
            let out_name = if columns.iter().any(|c| c == name) {
                format!("{name}{DUP_SUFFIX}")
            } else {
                name.clone()
            };
            columns.push(out_name.clone());
            right_columns.push((i, out_name));
        }

        let mut right_index = std::collections::HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            let k = row[right_key].trim();
            if !k.is_empty() {
                right_index.entry(k.to_string()).or_insert(i);
            }
        }

        let mut left_keys = HashSet::new();
        let mut rows = Vec::new();
        for left_row in &self.rows {
            let k = left_row[left_key].trim().to_string();
            let mut out = left_row.clone();
            match right_index.get(&k) {
                Some(&ri) => {
                    for (src, _) in &right_columns {
                        out.push(right.rows[ri][*src].clone());
                    }
                }
                None => out.resize(columns.len(), String::new()),
            }
            left_keys.insert(k);
            rows.push(out);
        }

        // Right-only keys become new records with empty left-side fields.
        for (i, row) in right.rows.iter().enumerate() {
            let k = row[right_key].trim();
            if k.is_empty() || left_keys.contains(k) || right_index.get(k) != Some(&i) {
                continue;
            }
            let mut out = vec![String::new(); self.columns.len()];
            out[left_key] = k.to_string();
            for (src, _) in &right_columns {
                out.push(row[*src].clone());
            }
            rows.push(out);
        }

        Ok(Table { columns, rows })
    }

    /// Folds `_dup` columns into their base column.
    ///
    /// The base value wins; empty base cells fall back to the duplicate.
    /// A duplicate without a base column is simply renamed. Afterwards no
    /// column name carries the suffix.
    pub fn coalesce_dup_columns(&mut self) {
        loop {
            let Some(dup_index) = self
                .columns
                .iter()
                .position(|c| c.ends_with(DUP_SUFFIX) && c.len() > DUP_SUFFIX.len())
            else {
                break;
            };
            let base_name = self.columns[dup_index]
                .strip_suffix(DUP_SUFFIX)
                .unwrap_or_default()
                .to_string();
            match self.column_index(&base_name) {
                Some(base_index) => {
                    for row in &mut self.rows {
                        if row[base_index].trim().is_empty() {
                            row[base_index] = row[dup_index].clone();
                        }
                    }
                    self.remove_column(dup_index);
                }
                None => self.columns[dup_index] = base_name,
            }
        }
    }

    fn remove_column(&mut self, index: usize) {
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
    }
}
