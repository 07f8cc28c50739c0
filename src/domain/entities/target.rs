//! Target entity: the per-row audit record under a campaign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Terminal status of an imported row's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// A link was created (or reused) for this row.
    Linked,
    /// The row passed validation but no link was requested.
    Validated,
    /// The row carried no destination URL; no link exists.
    Excluded,
}

/// One target per imported row, stored under `campaigns/{id}/targets`.
///
/// Targets are immutable audit records: the verbatim import row, the
/// name+address dedupe fingerprint and the link/status fields set at
/// creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Path of the owning business document.
    pub business_ref: String,
    pub status: TargetStatus,
    pub reason_excluded: Option<String>,
    /// Path of the created link document, when one exists.
    pub link_ref: Option<String>,
    /// The source row exactly as read from the file.
    pub import_row: HashMap<String, String>,
    pub dedupe_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Target {
    /// A target for a row that produced (or reuses) a link.
    pub fn linked(
        business_ref: String,
        link_ref: String,
        import_row: HashMap<String, String>,
        dedupe_key: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            business_ref,
            status: TargetStatus::Linked,
            reason_excluded: None,
            link_ref: Some(link_ref),
            import_row,
            dedupe_key,
            created_at: now,
            updated_at: now,
        }
    }

    /// A target for a row without a destination URL.
    pub fn excluded(
        business_ref: String,
        import_row: HashMap<String, String>,
        dedupe_key: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            business_ref,
            status: TargetStatus::Excluded,
            reason_excluded: Some("No destination".to_string()),
            link_ref: None,
            import_row,
            dedupe_key,
            created_at: now,
            updated_at: now,
        }
    }
}
