//! Link entity: the externally resolvable short identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable copy of the mailing-relevant fields taken at link creation.
///
/// Deliberately decoupled from later business edits: the snapshot records
/// where the physical mailing actually went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingSnapshot {
    pub business_name: Option<String>,
    pub recipient_name: Option<String>,
    pub address_lines: Vec<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: String,
}

impl MailingSnapshot {
    /// Builds the snapshot from row columns; `street house_number` forms the
    /// single address line when either part is present.
    pub fn from_parts(
        business_name: Option<String>,
        street: Option<&str>,
        house_number: Option<&str>,
        postcode: Option<String>,
        city: Option<String>,
        country: Option<String>,
    ) -> Self {
        let mut address_lines = Vec::new();
        let line1 = [street, house_number]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !line1.is_empty() {
            address_lines.push(line1);
        }
        Self {
            business_name,
            recipient_name: None,
            address_lines,
            postcode,
            city,
            country: country.unwrap_or_else(|| "DE".to_string()),
        }
    }
}

/// A tracking link, keyed by its allocated final id.
///
/// Links are create-only: once a document exists at an id it is never
/// overwritten by the import pipeline. `short_code` always mirrors the
/// document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Path of the owning campaign document.
    pub campaign_ref: String,
    pub business_ref: String,
    pub target_ref: String,
    pub destination: String,
    pub template_id: Option<String>,
    pub short_code: String,
    pub active: bool,
    pub hit_count: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub owner_id: String,
    pub snapshot_mailing: MailingSnapshot,
    pub campaign_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_composes_address_line() {
        let snapshot = MailingSnapshot::from_parts(
            Some("Acme Bau".to_string()),
            Some("Hauptstraße"),
            Some("12a"),
            Some("53177".to_string()),
            Some("Bonn".to_string()),
            None,
        );
        assert_eq!(snapshot.address_lines, vec!["Hauptstraße 12a".to_string()]);
        assert_eq!(snapshot.country, "DE");
    }

    #[test]
    fn test_snapshot_without_street_has_no_lines() {
        let snapshot = MailingSnapshot::from_parts(None, None, None, None, None, None);
        assert!(snapshot.address_lines.is_empty());
        assert!(snapshot.recipient_name.is_none());
    }

    #[test]
    fn test_link_serializes_refs_as_paths() {
        let link = Link {
            campaign_ref: "campaigns/camp-1".to_string(),
            business_ref: "businesses/acme-53177".to_string(),
            target_ref: "campaigns/camp-1/targets/t-1".to_string(),
            destination: "https://example.com/offer".to_string(),
            template_id: Some("flyer_qr_track.pdf".to_string()),
            short_code: "acme-53177".to_string(),
            active: true,
            hit_count: 0,
            last_hit_at: None,
            owner_id: "owner-1".to_string(),
            snapshot_mailing: MailingSnapshot::from_parts(None, None, None, None, None, None),
            campaign_name: Some("Spring".to_string()),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["campaign_ref"], "campaigns/camp-1");
        assert_eq!(value["short_code"], "acme-53177");
        assert_eq!(value["active"], true);
    }
}
