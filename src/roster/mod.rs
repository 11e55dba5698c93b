//! Roster ingestion: dynamic tables, source discovery, and the merger.

mod dates;
mod merge;
mod sources;
mod table;

pub use dates::{format_dmy, parse_date_flexible};
pub use merge::{COLUMN_SYNONYMS, merge_rosters};
pub use sources::{find_source, require_source};
pub use table::{DUP_SUFFIX, Table};

/// Normalized source-file name prefixes.
pub mod source_names {
    pub use super::sources::{
        ABSENCE, ACTIVE, ADMISSION, BUSINESS_DAYS, ELIGIBILITY, RATES, TERMINATED, VACATION,
    };
}
