//! Typed, case-insensitive column resolution.
//!
//! Input files arrive with German or English headers in unpredictable
//! casing. Instead of scanning row keys per cell, a [`ColumnResolver`] is
//! built once per file from the declared synonym table and maps each
//! logical [`Column`] to the actual header present in the file.

use crate::io::row_source::ImportRow;
use std::collections::HashMap;

/// Logical columns the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    BusinessName,
    Street,
    HouseNumber,
    Postcode,
    City,
    FirstName,
    LastName,
    PhonePrefix,
    Phone,
    Email,
    Salutation,
    Template,
    Destination,
    LinkId,
    Country,
}

/// Header synonyms per logical column, matched case-insensitively in order.
const SYNONYMS: &[(Column, &[&str])] = &[
    (Column::BusinessName, &["Namenszeile", "business_name", "company"]),
    (Column::Street, &["Straße", "Strasse", "Str", "Str."]),
    (Column::HouseNumber, &["Hausnummer", "HNr", "Hnr", "Nr"]),
    (Column::Postcode, &["PLZ", "Postleitzahl"]),
    (Column::City, &["Ort", "Stadt", "City"]),
    (
        Column::FirstName,
        &["Entscheider 1 Vorname", "Vorname", "Anrede Vorname"],
    ),
    (Column::LastName, &["Entscheider 1 Nachname", "Nachname"]),
    (
        Column::PhonePrefix,
        &["Vorwahl Telefon", "Vorwahl", "Telefon Vorwahl"],
    ),
    (Column::Phone, &["Telefonnummer", "Telefon", "Phone"]),
    (
        Column::Email,
        &["E-Mail-Adresse", "Email", "E-Mail", "Mail"],
    ),
    (Column::Salutation, &["Entscheider 1 Anrede", "Salutation"]),
    (Column::Template, &["Template"]),
    (Column::Destination, &["destination", "url"]),
    (Column::LinkId, &["id", "link_id"]),
    (Column::Country, &["Country", "Land"]),
];

/// Maps logical columns to the headers actually present in one file.
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    resolved: HashMap<Column, String>,
}

impl ColumnResolver {
    /// Builds the resolver from a file's header row.
    ///
    /// For each logical column the first synonym that matches a header
    /// (case-insensitively) wins; the header's original spelling is kept so
    /// write-back targets the exact same column.
    pub fn from_headers(headers: &[String]) -> Self {
        let by_lower: HashMap<String, &String> = headers
            .iter()
            .map(|h| (h.trim().to_lowercase(), h))
            .collect();

        let mut resolved = HashMap::new();
        for (column, names) in SYNONYMS {
            for name in *names {
                if let Some(header) = by_lower.get(&name.to_lowercase()) {
                    resolved.insert(*column, (*header).clone());
                    break;
                }
            }
        }
        Self { resolved }
    }

    /// The file's actual header for a logical column, if present.
    pub fn header(&self, column: Column) -> Option<&str> {
        self.resolved.get(&column).map(String::as_str)
    }

    /// Reads a column value from a row. Whitespace-only values count as
    /// absent.
    pub fn get<'r>(&self, row: &'r ImportRow, column: Column) -> Option<&'r str> {
        let header = self.resolved.get(&column)?;
        let value = row.get(header)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }

    /// Reads a column value as an owned string.
    pub fn get_owned(&self, row: &ImportRow, column: Column) -> Option<String> {
        self.get(row, column).map(str::to_string)
    }
}
