//! Business entity: the canonical per-company record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geocoordinate resolved for a composed postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
    /// Which geocoder produced the value (e.g. `"mapbox"`).
    pub source: String,
}

/// Canonical business record, keyed by the normalized `{name-slug}-{plz}`
/// identifier.
///
/// A business is created on first sight of its identifier and merged
/// (non-destructively) on every later sight, across imports and owners.
/// The owner set lives outside this payload: it is maintained through a
/// separate array-union write so a merge can never shrink it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub business_name: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    /// Contact person, composed from first and last name columns.
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Human-readable full address composed from the individual columns.
    pub address: Option<String>,
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    pub hit_count: i64,
    pub business_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
