//! File input/output: row sources and typed column resolution.
//!
//! - [`row_source`] - CSV (delimiter auto-detection) and XLSX reading,
//!   output write-back
//! - [`columns`] - Case-insensitive synonym-table column resolver

pub mod columns;
pub mod row_source;

pub use columns::{Column, ColumnResolver};
pub use row_source::{ImportRow, RowSet};
