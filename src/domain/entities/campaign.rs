//! Campaign entity: an owner-scoped grouping of imported rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running totals on a campaign.
///
/// Maintained exclusively through atomic increments so concurrent imports
/// into the same campaign never lose updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignTotals {
    pub targets: i64,
    pub links: i64,
    pub hits: i64,
    pub unique_ips: i64,
}

/// A campaign document, keyed by an externally supplied id.
///
/// The `code` is the human-facing campaign label; at most one non-deleted
/// campaign may hold a given code. That invariant is enforced by
/// [`crate::application::services::CampaignResolver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_name: String,
    pub code: Option<String>,
    pub owner_id: String,
    pub status: String,
    pub totals: CampaignTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Creates a fresh draft campaign with zeroed totals.
    ///
    /// The display name falls back to the code, then to "Untitled Campaign".
    pub fn new(owner_id: &str, name: Option<&str>, code: Option<String>) -> Self {
        let now = Utc::now();
        let campaign_name = name
            .map(str::to_string)
            .or_else(|| code.clone())
            .unwrap_or_else(|| "Untitled Campaign".to_string());
        Self {
            campaign_name,
            code,
            owner_id: owner_id.to_string(),
            status: "draft".to_string(),
            totals: CampaignTotals::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
