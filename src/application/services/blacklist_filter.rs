//! Owner-scoped blacklist filtering.

use crate::domain::entities::BlacklistEntry;
use crate::domain::store::{DocumentStore, StoreError};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

/// In-memory set of blacklisted business identifiers for one owner.
///
/// Loaded once per run from `customers/{owner}/blacklist`; a row is
/// blacklisted iff its computed business id is in the set. Blacklisted rows
/// never reach any downstream write and are removed from the output file.
pub struct BlacklistFilter {
    ids: HashSet<String>,
}

impl BlacklistFilter {
    /// Loads every blacklist entry under an owner.
    ///
    /// Both entry shapes are supported: a direct `business_id` field and
    /// the legacy reference-path string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the collection cannot be listed.
    pub async fn load<S: DocumentStore + ?Sized>(
        store: &S,
        owner_id: &str,
    ) -> Result<Self, StoreError> {
        let collection = format!("customers/{owner_id}/blacklist");
        let entries = store.list_all(&collection).await?;

        let ids: HashSet<String> = entries
            .into_iter()
            .filter_map(|(_, fields)| {
                serde_json::from_value::<BlacklistEntry>(Value::Object(fields)).ok()
            })
            .filter_map(|entry| entry.business_identifier())
            .collect();

        info!(owner_id, entries = ids.len(), "loaded blacklist");
        Ok(Self { ids })
    }

    /// Builds a filter from explicit ids (tests, dry runs).
    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn is_blacklisted(&self, business_id: &str) -> bool {
        self.ids.contains(business_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
