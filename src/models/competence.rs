//! Competence period (`MM.YYYY`) handling.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The monthly billing cycle a payout sheet covers, displayed as `MM.YYYY`.
///
/// # Example
///
/// ```
/// use vr_engine::models::Competence;
///
/// let competence: Competence = "05.2025".parse().unwrap();
/// assert_eq!(competence.to_string(), "05.2025");
/// assert_eq!(competence.file_suffix(), "05_2025");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competence {
    /// The month (1-12).
    pub month: u32,
    /// The four-digit year.
    pub year: i32,
}

impl Competence {
    /// Returns the competence for the current month (UTC).
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            month: now.month(),
            year: now.year(),
        }
    }

    /// Returns the `MM_YYYY` form used in output file names.
    pub fn file_suffix(&self) -> String {
        format!("{:02}_{:04}", self.month, self.year)
    }
}

impl Default for Competence {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Competence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:04}", self.month, self.year)
    }
}

impl FromStr for Competence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("invalid competence '{s}': expected MM.YYYY"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid competence month in '{s}'"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid competence year in '{s}'"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("competence month out of range in '{s}'"));
        }
        Ok(Self { month, year })
    }
}
