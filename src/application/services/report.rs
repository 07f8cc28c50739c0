//! Terminal run report.

use serde::{Deserialize, Serialize};

/// Detail record for a row removed by the owner's blacklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistedRow {
    /// 1-based row number in the source file.
    pub row_number: usize,
    pub business_name: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
}

/// Detail record for a row that failed processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number in the source file.
    pub row_number: usize,
    pub business_name: Option<String>,
    pub message: String,
}

/// Aggregated counters and detail lists for one import run.
///
/// The report is always produced on row-level partial failure; only a fatal
/// campaign-code conflict suppresses it (an error report is written
/// instead).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_rows: usize,
    /// Rows inside the limit that were neither blacklisted nor errored.
    pub processed: usize,
    pub targets_created: usize,
    pub links_created: usize,
    /// Rows whose link id already existed under `skip_existing`.
    pub links_skipped_existing: usize,
    /// Rows that got an `excluded` target because no destination was given.
    pub excluded_no_destination: usize,
    pub blacklisted_count: usize,
    pub blacklisted: Vec<BlacklistedRow>,
    pub error_count: usize,
    pub errors: Vec<RowError>,
    pub geocoded_ok: usize,
    pub geocoded_failed: usize,
}

impl ImportReport {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub fn record_blacklisted(
        &mut self,
        row_number: usize,
        business_name: Option<String>,
        postcode: Option<String>,
        city: Option<String>,
    ) {
        self.blacklisted_count += 1;
        self.blacklisted.push(BlacklistedRow {
            row_number,
            business_name,
            postcode,
            city,
        });
    }

    pub fn record_error(
        &mut self,
        row_number: usize,
        business_name: Option<String>,
        message: impl ToString,
    ) {
        self.error_count += 1;
        self.errors.push(RowError {
            row_number,
            business_name,
            message: message.to_string(),
        });
    }
}
