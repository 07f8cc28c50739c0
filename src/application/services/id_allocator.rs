//! Link id allocation: deterministic bases, collision-free suffixes.
//!
//! Allocation is two-phase. The **base id** is computed per row from
//! identity fields by a fixed priority chain. The **final id** is then
//! allocated against the link collection: rows are grouped by base, one
//! ids-only range query per distinct base fetches the taken set, and every
//! row of the group draws from that same in-memory set — so rows sharing a
//! base within one run can never collide with each other, even before any
//! write lands.
//!
//! Across concurrent runs the existence check and the later create are not
//! atomic; that race is handled by the one-shot create retry in the
//! importer.

use crate::domain::store::{DocumentStore, StoreError};
use crate::io::{Column, ColumnResolver, ImportRow};
use crate::utils::slug::{normalize_business_name, sanitize_id};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

const LINKS: &str = "links";

/// How many range queries are in flight during the taken-set prefetch.
/// Read-only fan-out purely to cut network round-trips.
const PREFETCH_CONCURRENCY: usize = 8;

/// Email providers whose domain says nothing about the business identity.
const GENERIC_EMAIL_PROVIDERS: &[&str] = &[
    "gmail",
    "googlemail",
    "yahoo",
    "hotmail",
    "outlook",
    "live",
    "msn",
    "aol",
    "icloud",
    "me",
    "gmx",
    "web",
    "t-online",
    "freenet",
    "posteo",
    "mail",
    "email",
    "arcor",
    "protonmail",
    "proton",
];

/// Allocates collision-free link ids against the link collection.
pub struct IdAllocator<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> IdAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Computes a row's deterministic base id.
    ///
    /// Priority: explicit `id`/`link_id` column → email domain label when
    /// `derive_from_identity` is set and the email is at a non-generic
    /// provider → normalized business-name slug → sequential
    /// `{CODE}-{row_number}` fallback. The result is always re-sanitized to
    /// `[A-Za-z0-9-]`.
    pub fn base_id(
        cols: &ColumnResolver,
        row: &ImportRow,
        campaign_code: Option<&str>,
        derive_from_identity: bool,
    ) -> String {
        if let Some(explicit) = cols.get(row, Column::LinkId) {
            return sanitize_id(explicit);
        }

        if derive_from_identity {
            if let Some(label) = cols
                .get(row, Column::Email)
                .and_then(email_domain_label)
            {
                return label;
            }
        }

        if let Some(slug) = cols
            .get(row, Column::BusinessName)
            .and_then(normalize_business_name)
        {
            return sanitize_id(&slug);
        }

        let code = campaign_code
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "L".to_string());
        sanitize_id(&format!("{}-{}", code, row.index() + 1))
    }

    /// Allocates pairwise-distinct final ids for `(row_index, base)` pairs.
    ///
    /// One range query per distinct base, fanned out over a small worker
    /// pool; allocation itself runs in row order so re-imports are
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a range query fails.
    pub async fn allocate(
        &self,
        bases: &[(usize, String)],
    ) -> Result<HashMap<usize, String>, StoreError> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row_index, base) in bases {
            groups.entry(base.clone()).or_default().push(*row_index);
        }

        let mut taken_by_base: HashMap<String, HashSet<String>> =
            HashMap::with_capacity(groups.len());
        let mut fetches = stream::iter(groups.keys().cloned().map(|base| {
            let store = Arc::clone(&self.store);
            async move {
                let ids = store.list_ids_with_prefix(LINKS, &base).await?;
                Ok::<_, StoreError>((base, ids))
            }
        }))
        .buffer_unordered(PREFETCH_CONCURRENCY);

        while let Some(fetched) = fetches.next().await {
            let (base, ids) = fetched?;
            let taken = variant_set(&base, ids);
            if !taken.is_empty() {
                debug!(base, taken = taken.len(), "existing id variants");
            }
            taken_by_base.insert(base, taken);
        }
        drop(fetches);

        let mut allocated = HashMap::with_capacity(bases.len());
        for (base, row_indexes) in &groups {
            let taken = taken_by_base.entry(base.clone()).or_default();
            for row_index in row_indexes {
                let id = next_free(base, taken);
                taken.insert(id.clone());
                allocated.insert(*row_index, id);
            }
        }
        Ok(allocated)
    }

    /// Re-queries a base's variants after a create collision and returns
    /// the next free suffix. Used by the importer's one-shot retry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the range query fails.
    pub async fn next_free_after_requery(&self, base: &str) -> Result<String, StoreError> {
        let ids = self.store.list_ids_with_prefix(LINKS, base).await?;
        let taken = variant_set(base, ids);
        Ok(next_free(base, &taken))
    }
}

/// Keeps only the ids that actually contend with `base`: the base itself
/// and its numeric `-n` variants. A prefix query also returns unrelated
/// longer slugs (`acme-bau` for base `acme`) which do not collide.
fn variant_set(base: &str, ids: Vec<String>) -> HashSet<String> {
    ids.into_iter()
        .filter(|id| {
            id == base
                || id
                    .strip_prefix(base)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .collect()
}

/// The base itself when free, else `base-{n}` for the smallest unused
/// `n ≥ 1`.
fn next_free(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn email_domain_label(email: &str) -> Option<String> {
    let domain = email.rsplit_once('@')?.1.trim().to_lowercase();
    let label = domain.split('.').next()?.to_string();
    if label.is_empty() || GENERIC_EMAIL_PROVIDERS.contains(&label.as_str()) {
        return None;
    }
    let sanitized = sanitize_id(&label).to_lowercase();
    (!sanitized.is_empty()).then_some(sanitized)
}
