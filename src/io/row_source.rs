//! Reading CSV/XLSX inputs and writing the rewritten output file.
//!
//! CSV inputs arrive with any of four delimiters and often a UTF-8 BOM;
//! XLSX inputs are read from the first sheet with every cell stringified.
//! Either way the result is a [`RowSet`]: ordered headers plus one
//! [`ImportRow`] per data row.
//!
//! The output is always CSV (the letter-shop flow consuming it reads CSV),
//! with the `tracking_link` column appended last and blacklisted rows
//! removed.

use crate::error::ImportError;
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Column delimiters recognized in CSV inputs.
const CSV_DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

/// How much of the file feeds the delimiter sniffer.
const SNIFF_LEN: usize = 4096;

/// Suffix appended to the input file stem for the rewritten output.
const OUTPUT_SUFFIX: &str = "_with_links";

/// The appended output column carrying the tracking URL.
pub const TRACKING_LINK_COLUMN: &str = "tracking_link";

/// One source row: its 0-based position in the file plus the column values.
#[derive(Debug, Clone)]
pub struct ImportRow {
    index: usize,
    values: HashMap<String, String>,
}

impl ImportRow {
    pub fn new(index: usize, values: HashMap<String, String>) -> Self {
        Self { index, values }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(String::as_str)
    }

    /// Sets (or overwrites) a column value, e.g. the tracking link or the
    /// adjusted template filename.
    pub fn set(&mut self, header: &str, value: String) {
        self.values.insert(header.to_string(), value);
    }

    /// The verbatim row content, as stored on targets for audit.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

/// An ordered set of rows read from one input file.
#[derive(Debug, Clone)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

/// Reads an input file, dispatching on its extension.
///
/// # Errors
///
/// Returns [`ImportError::UnsupportedInput`] for unknown extensions and
/// [`ImportError::InputRead`] when the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<RowSet, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xls" => read_xlsx(path),
        _ => Err(ImportError::UnsupportedInput(path.display().to_string())),
    }
}

fn read_csv(path: &Path) -> Result<RowSet, ImportError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ImportError::input_read(path.display().to_string(), e))?;
    let content = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let sample: String = content.chars().take(SNIFF_LEN).collect();
    let delimiter = detect_delimiter(&sample);
    tracing::debug!(delimiter = %char::from(delimiter), "detected csv delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::input_read(path.display().to_string(), e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ImportError::input_read(path.display().to_string(), e))?;
        let values = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(ImportRow::new(index, values));
    }

    Ok(RowSet { headers, rows })
}

/// Picks the delimiter with the highest count in the sample; falls back to
/// a comma when none occurs.
fn detect_delimiter(sample: &str) -> u8 {
    let first_line = sample.lines().next().unwrap_or(sample);
    CSV_DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, first_line.matches(char::from(d)).count()))
        .max_by_key(|(_, count)| *count)
        .filter(|(_, count)| *count > 0)
        .map_or(b',', |(d, _)| d)
}

fn read_xlsx(path: &Path) -> Result<RowSet, ImportError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ImportError::input_read(path.display().to_string(), e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::input_read(path.display().to_string(), "workbook has no sheets"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::input_read(path.display().to_string(), e))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|cells| cells.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let mut rows = Vec::new();
    for (index, cells) in sheet_rows.enumerate() {
        let values = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = cells.get(i).map(cell_to_string).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        rows.push(ImportRow::new(index, values));
    }

    Ok(RowSet { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Derives the output path next to the input: `{stem}_with_links.csv`.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("import");
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.csv"))
}

/// Writes the rewritten rows as CSV next to the input file.
///
/// The column order is the original header order with `tracking_link`
/// forced last; rows whose index is in `skip_rows` (the blacklisted ones)
/// are dropped from the output.
///
/// # Errors
///
/// Returns [`ImportError::OutputWrite`] on any I/O failure.
pub fn write_back_csv(
    input: &Path,
    rowset: &RowSet,
    skip_rows: &HashSet<usize>,
) -> Result<PathBuf, ImportError> {
    let out_path = output_path(input);
    let display = out_path.display().to_string();

    let mut fieldnames: Vec<&str> = rowset
        .headers
        .iter()
        .map(String::as_str)
        .filter(|h| *h != TRACKING_LINK_COLUMN)
        .collect();
    fieldnames.push(TRACKING_LINK_COLUMN);

    let mut writer = csv::Writer::from_path(&out_path)
        .map_err(|e| ImportError::output_write(display.as_str(), e))?;
    writer
        .write_record(&fieldnames)
        .map_err(|e| ImportError::output_write(display.as_str(), e))?;

    for row in &rowset.rows {
        if skip_rows.contains(&row.index()) {
            continue;
        }
        let record: Vec<&str> = fieldnames
            .iter()
            .map(|field| row.get(field).unwrap_or(""))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| ImportError::output_write(display.as_str(), e))?;
    }

    writer
        .flush()
        .map_err(|e| ImportError::output_write(display.as_str(), e))?;
    Ok(out_path)
}
