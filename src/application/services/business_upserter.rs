//! Idempotent business upserts built from import rows.
//!
//! A business document is merged (never overwritten) on every sight of its
//! identifier, and its owner set grows through a separate array-union
//! write. Both operations are commutative and idempotent: re-running the
//! same row, or running it concurrently from another owner, never loses
//! previously stored fields or owners.

use crate::application::batch::BatchWriter;
use crate::domain::entities::{Business, Coordinate};
use crate::domain::store::{fields_of, DocRef, DocumentStore, StoreError, WriteOp};
use crate::io::{Column, ColumnResolver, ImportRow};
use crate::utils::slug::business_id;
use chrono::Utc;
use serde_json::json;

const BUSINESSES: &str = "businesses";

/// Composes a human-readable address from the individual columns:
/// `"Hauptstraße 12a, 53177 Bonn, Germany"`.
pub fn compose_full_address(
    street: Option<&str>,
    house_number: Option<&str>,
    postcode: Option<&str>,
    city: Option<&str>,
    country: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(street) = street {
        parts.push(street.trim().to_string());
    }
    if let Some(house_number) = house_number {
        match parts.last_mut() {
            Some(last) => {
                last.push(' ');
                last.push_str(house_number.trim());
            }
            None => parts.push(house_number.trim().to_string()),
        }
    }
    let line2 = [postcode, city]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !line2.is_empty() {
        parts.push(line2.trim().to_string());
    }
    if !country.is_empty() {
        parts.push(country.to_string());
    }
    parts.join(", ")
}

/// Builds the business identifier and canonical merge payload from a row.
pub fn build_business(
    row: &ImportRow,
    cols: &ColumnResolver,
    coordinate: Option<Coordinate>,
) -> (String, Business) {
    let business_name = cols.get_owned(row, Column::BusinessName);
    let street = cols.get_owned(row, Column::Street);
    let house_number = cols.get_owned(row, Column::HouseNumber);
    let postcode = cols.get_owned(row, Column::Postcode);
    let city = cols.get_owned(row, Column::City);

    let contact_name = join_present(&[
        cols.get(row, Column::FirstName),
        cols.get(row, Column::LastName),
    ]);
    let phone = join_present(&[
        cols.get(row, Column::PhonePrefix),
        cols.get(row, Column::Phone),
    ]);
    let address = compose_full_address(
        street.as_deref(),
        house_number.as_deref(),
        postcode.as_deref(),
        city.as_deref(),
        "Germany",
    );

    let id = business_id(
        business_name.as_deref().unwrap_or(""),
        postcode.as_deref().unwrap_or(""),
    );

    let now = Utc::now();
    let business = Business {
        business_name,
        street,
        house_number,
        postcode,
        city,
        name: contact_name,
        phone,
        email: cols.get_owned(row, Column::Email),
        address: (!address.is_empty()).then_some(address),
        salutation: cols.get_owned(row, Column::Salutation),
        coordinate,
        hit_count: 0,
        business_id: id.clone(),
        created_at: now,
        updated_at: now,
    };
    (id, business)
}

/// Enqueues the merge-set and owner-union writes for a row's business.
///
/// Returns the business document reference for the row's target and link.
///
/// # Errors
///
/// Propagates a commit failure when enqueuing triggers an automatic flush.
pub async fn upsert<S: DocumentStore>(
    batch: &mut BatchWriter<S>,
    row: &ImportRow,
    cols: &ColumnResolver,
    owner_id: &str,
    coordinate: Option<Coordinate>,
) -> Result<DocRef, StoreError> {
    let (id, business) = build_business(row, cols, coordinate);
    let doc = DocRef::new(BUSINESSES, &id);

    batch
        .push(WriteOp::SetMerge {
            doc: doc.clone(),
            fields: fields_of(&business),
        })
        .await?;
    batch
        .push(WriteOp::ArrayUnion {
            doc: doc.clone(),
            field: "owner_ids".to_string(),
            values: vec![json!(owner_id)],
        })
        .await?;

    Ok(doc)
}

fn join_present(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
