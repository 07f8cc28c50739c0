//! Error taxonomy for the import pipeline.
//!
//! Errors fall into two classes with very different handling:
//!
//! - **Fatal / run-terminating** — a campaign code that is already bound to a
//!   different campaign. The importer deletes everything written under this
//!   run's campaign before re-raising, so a retried import starts clean.
//! - **Row-local** — any failure while processing a single row. These are
//!   caught inside the row loop, recorded in the report's error list, and
//!   processing continues with the next row.
//!
//! [`ImportError::is_fatal`] tells the two classes apart.

use crate::domain::store::StoreError;

/// Errors produced by the import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The requested campaign code is already bound to a different campaign.
    ///
    /// Run-terminating: the caller must sweep this run's campaign artifacts
    /// before surfacing the error.
    #[error("campaign code '{code}' already belongs to campaign '{existing_id}'")]
    DuplicateCampaignCode { code: String, existing_id: String },

    /// A campaign id must be supplied by the run configuration.
    #[error("campaign id is required but missing")]
    MissingCampaignId,

    /// The input file extension is neither CSV nor XLSX/XLS.
    #[error("unsupported input file '{0}' (expected .csv, .xlsx or .xls)")]
    UnsupportedInput(String),

    /// The input file could not be read or parsed.
    #[error("failed to read '{path}': {message}")]
    InputRead { path: String, message: String },

    /// The rewritten output file or a report could not be written.
    #[error("failed to write '{path}': {message}")]
    OutputWrite { path: String, message: String },

    /// A link id collided on create and collided again after the single
    /// retry with the next free suffix. Surfaced as a row-local error.
    #[error("link id '{id}' still collides after retry")]
    LinkIdExhausted { id: String },

    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    pub fn input_read(path: impl Into<String>, message: impl ToString) -> Self {
        Self::InputRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn output_write(path: impl Into<String>, message: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Returns true for errors that terminate the run and trigger the
    /// compensating campaign cleanup sweep.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateCampaignCode { .. })
    }
}
