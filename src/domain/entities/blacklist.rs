//! Owner-scoped blacklist entries, read-only input to the pipeline.

use serde::{Deserialize, Serialize};

/// One entry under `customers/{owner}/blacklist`.
///
/// Newer entries carry the business id directly; legacy entries only hold a
/// reference path to the business document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistEntry {
    #[serde(default)]
    pub business_id: Option<String>,
    /// Legacy reference-path string, e.g. `businesses/acme-53177` or
    /// `/businesses/acme-53177`.
    #[serde(default)]
    pub business_ref: Option<String>,
}

impl BlacklistEntry {
    /// Resolves the blacklisted business identifier from either field.
    pub fn business_identifier(&self) -> Option<String> {
        if let Some(id) = &self.business_id {
            let id = id.trim();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
        self.business_ref
            .as_deref()
            .and_then(|path| path.trim_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}
