//! The import pipeline driver.
//!
//! Orchestrates one run end to end: read rows, resolve the campaign, drop
//! blacklisted rows, allocate link ids, then walk the rows sequentially —
//! business merge, target write and link create per row — with batched
//! commits, per-row error recovery and a terminal report.
//!
//! Per-row state machine: `pending → excluded` (no destination), `→ linked`
//! (create succeeded, possibly after the one retry) or `→ errored`.
//! Exactly one terminal state is reached per row and the states are
//! mutually exclusive.

use crate::application::batch::{create_with_retry, BatchWriter};
use crate::application::services::blacklist_filter::BlacklistFilter;
use crate::application::services::business_upserter::{self, compose_full_address};
use crate::application::services::campaign_resolver::CampaignResolver;
use crate::application::services::id_allocator::IdAllocator;
use crate::application::services::report::ImportReport;
use crate::config::ImportConfig;
use crate::domain::entities::{Coordinate, Link, MailingSnapshot, Target};
use crate::domain::store::{fields_of, DocRef, DocumentStore, StoreError, WriteOp};
use crate::error::ImportError;
use crate::infrastructure::geocode::Geocoder;
use crate::io::row_source::{self, TRACKING_LINK_COLUMN};
use crate::io::{Column, ColumnResolver, ImportRow};
use crate::utils::qr_template::{build_tracking_link, template_with_qr_suffix};
use crate::utils::slug::{business_id, dedupe_key};
use chrono::Utc;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const LINKS: &str = "links";
const CAMPAIGNS: &str = "campaigns";

/// Chunk size for the `skip_existing` bulk existence pre-scan.
const EXISTENCE_CHUNK: usize = 300;

/// Result of a successful run.
#[derive(Debug)]
pub struct ImportOutcome {
    pub report: ImportReport,
    /// The rewritten input file (`{stem}_with_links.csv`).
    pub output_path: PathBuf,
    /// The JSON report written next to it.
    pub report_path: PathBuf,
    pub campaign: DocRef,
}

/// Per-row data computed before any write, so the existence pre-scan and
/// suffix allocation can run over the whole file at once.
struct PreparedRow {
    index: usize,
    destination: Option<String>,
    /// Deterministic base id; present iff the row has a destination.
    base_id: Option<String>,
    business_name: Option<String>,
    template_raw: Option<String>,
    /// Set by the `skip_existing` pre-scan: a link already exists at the
    /// base id, keep the target and reuse the id without creating.
    skip_existing_hit: bool,
}

/// Drives one import run against a document store and a geocoder.
pub struct Importer<S, G> {
    store: Arc<S>,
    geocoder: Arc<G>,
    config: ImportConfig,
}

impl<S: DocumentStore, G: Geocoder> Importer<S, G> {
    pub fn new(store: Arc<S>, geocoder: Arc<G>, config: ImportConfig) -> Self {
        Self {
            store,
            geocoder,
            config,
        }
    }

    /// Runs the import for one input file.
    ///
    /// On a fatal campaign-code conflict every artifact under this run's
    /// campaign root is deleted and a JSON error report is written before
    /// the error is surfaced, so a retried import starts clean. Row-local
    /// failures never abort the run; they end up in the report instead.
    ///
    /// # Errors
    ///
    /// - [`ImportError::DuplicateCampaignCode`] after cleanup, see above
    /// - [`ImportError::InputRead`] / [`ImportError::UnsupportedInput`] when
    ///   the input cannot be loaded
    /// - [`ImportError::Store`] when a batch commit or query fails
    pub async fn run(&self, input: &Path) -> Result<ImportOutcome, ImportError> {
        match self.run_inner(input).await {
            Err(err) if err.is_fatal() => {
                error!(error = %err, "fatal conflict, aborting run");
                // When the conflict names this very campaign id, the
                // document pre-existed with another code and this run wrote
                // nothing under it. Sweeping would delete someone else's
                // campaign.
                let conflict_is_own_doc = matches!(
                    &err,
                    ImportError::DuplicateCampaignCode { existing_id, .. }
                        if existing_id == &self.config.campaign_id
                );
                if !conflict_is_own_doc {
                    if let Err(cleanup_err) = self.cleanup_campaign().await {
                        error!(error = %cleanup_err, "campaign cleanup failed");
                    }
                }
                if let Err(report_err) = self.write_error_report(input, &err) {
                    error!(error = %report_err, "could not write error report");
                }
                Err(err)
            }
            other => other,
        }
    }

    async fn run_inner(&self, input: &Path) -> Result<ImportOutcome, ImportError> {
        let cfg = &self.config;
        let mut rowset = row_source::load(input)?;
        let cols = ColumnResolver::from_headers(&rowset.headers);
        let total_rows = rowset.rows.len();
        info!(
            total_rows,
            owner_id = %cfg.owner_id,
            campaign_id = %cfg.campaign_id,
            "starting import"
        );

        let campaigns = CampaignResolver::new(Arc::clone(&self.store));
        let campaign = campaigns
            .get_or_create(
                &cfg.owner_id,
                &cfg.campaign_id,
                cfg.campaign_name.as_deref(),
                cfg.campaign_code.as_deref(),
            )
            .await?;

        let blacklist = BlacklistFilter::load(self.store.as_ref(), &cfg.owner_id).await?;

        let mut report = ImportReport::new(total_rows);
        let mut blacklisted_rows: HashSet<usize> = HashSet::new();
        let mut prepared: Vec<PreparedRow> = Vec::new();

        for row in &rowset.rows {
            let index = row.index();
            if cfg.limit > 0 && index >= cfg.limit {
                continue;
            }

            let business_name = cols.get_owned(row, Column::BusinessName);
            let postcode = cols.get_owned(row, Column::Postcode);
            let biz_id = business_id(
                business_name.as_deref().unwrap_or(""),
                postcode.as_deref().unwrap_or(""),
            );
            if blacklist.is_blacklisted(&biz_id) {
                blacklisted_rows.insert(index);
                report.record_blacklisted(
                    index + 1,
                    business_name,
                    postcode,
                    cols.get_owned(row, Column::City),
                );
                continue;
            }

            let destination = cols
                .get_owned(row, Column::Destination)
                .or_else(|| cfg.destination.clone());
            let base_id = destination.is_some().then(|| {
                IdAllocator::<S>::base_id(
                    &cols,
                    row,
                    cfg.campaign_code.as_deref(),
                    cfg.derive_id_from_identity,
                )
            });
            prepared.push(PreparedRow {
                index,
                destination,
                base_id,
                business_name,
                template_raw: cols.get_owned(row, Column::Template),
                skip_existing_hit: false,
            });
        }

        if cfg.skip_existing {
            self.prescan_existing(&mut prepared).await?;
        }

        let to_allocate: Vec<(usize, String)> = prepared
            .iter()
            .filter(|p| !p.skip_existing_hit)
            .filter_map(|p| p.base_id.clone().map(|base| (p.index, base)))
            .collect();
        let allocator = IdAllocator::new(Arc::clone(&self.store));
        let allocated = allocator.allocate(&to_allocate).await?;

        let mut batch = BatchWriter::new(Arc::clone(&self.store));
        for prep in &prepared {
            let row = &mut rowset.rows[prep.index];
            match self
                .process_row(&mut batch, &allocator, &campaign, &cols, row, prep, &allocated, &mut report)
                .await
            {
                Ok(()) => report.processed += 1,
                Err(err) if !err.is_fatal() => {
                    warn!(row = prep.index + 1, error = %err, "row failed");
                    report.record_error(prep.index + 1, prep.business_name.clone(), &err);
                    row.set(TRACKING_LINK_COLUMN, String::new());
                }
                Err(err) => return Err(err),
            }
        }

        // Rows beyond the limit stay in the output with an empty link.
        if cfg.limit > 0 {
            for row in rowset.rows.iter_mut().skip(cfg.limit) {
                row.set(TRACKING_LINK_COLUMN, String::new());
            }
        }

        batch.flush().await?;
        campaigns
            .increment_totals(
                &campaign,
                report.targets_created as i64,
                report.links_created as i64,
            )
            .await?;

        let output_path = row_source::write_back_csv(input, &rowset, &blacklisted_rows)?;
        let report_path = self.write_report(input, &report)?;
        info!(
            links = report.links_created,
            targets = report.targets_created,
            blacklisted = report.blacklisted_count,
            errors = report.error_count,
            "import finished"
        );

        Ok(ImportOutcome {
            report,
            output_path,
            report_path,
            campaign,
        })
    }

    /// Bulk existence check over the deterministic base ids, chunked to
    /// bound the per-request document count.
    async fn prescan_existing(&self, prepared: &mut [PreparedRow]) -> Result<(), StoreError> {
        let refs: Vec<DocRef> = prepared
            .iter()
            .filter_map(|p| p.base_id.as_ref())
            .map(|base| DocRef::new(LINKS, base))
            .collect();
        if refs.is_empty() {
            return Ok(());
        }

        let mut existing: HashSet<String> = HashSet::new();
        for chunk in refs.chunks(EXISTENCE_CHUNK) {
            existing.extend(self.store.existing_ids(chunk).await?);
        }
        if !existing.is_empty() {
            info!(existing = existing.len(), "pre-scan found existing link ids");
        }

        for prep in prepared {
            if prep.base_id.as_ref().is_some_and(|base| existing.contains(base)) {
                prep.skip_existing_hit = true;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_row(
        &self,
        batch: &mut BatchWriter<S>,
        allocator: &IdAllocator<S>,
        campaign: &DocRef,
        cols: &ColumnResolver,
        row: &mut ImportRow,
        prep: &PreparedRow,
        allocated: &HashMap<usize, String>,
        report: &mut ImportReport,
    ) -> Result<(), ImportError> {
        let coordinate = self.maybe_geocode(cols, row, report).await;
        let business =
            business_upserter::upsert(batch, row, cols, &self.config.owner_id, coordinate).await?;

        let fingerprint = dedupe_key(
            prep.business_name.as_deref().unwrap_or(""),
            cols.get(row, Column::Street).unwrap_or(""),
            cols.get(row, Column::HouseNumber).unwrap_or(""),
            cols.get(row, Column::Postcode).unwrap_or(""),
            cols.get(row, Column::City).unwrap_or(""),
        );
        let targets_collection = format!("{}/targets", campaign.path());
        let target_doc = DocRef::new(&targets_collection, &Uuid::new_v4().to_string());

        match (&prep.destination, &prep.base_id) {
            (Some(destination), Some(base)) => {
                let link_doc = if prep.skip_existing_hit {
                    report.links_skipped_existing += 1;
                    DocRef::new(LINKS, base)
                } else {
                    let first_id = allocated
                        .get(&prep.index)
                        .cloned()
                        .unwrap_or_else(|| base.clone());
                    let doc = self
                        .create_link(allocator, campaign, &business, &target_doc, cols, row, prep, destination, base, first_id)
                        .await?;
                    report.links_created += 1;
                    doc
                };

                let target = Target::linked(
                    business.path().to_string(),
                    link_doc.path().to_string(),
                    row.values().clone(),
                    fingerprint,
                );
                batch
                    .push(WriteOp::Set {
                        doc: target_doc,
                        fields: fields_of(&target),
                    })
                    .await?;
                report.targets_created += 1;
                row.set(
                    TRACKING_LINK_COLUMN,
                    build_tracking_link(&self.config.base_url, link_doc.id()),
                );
            }
            _ => {
                let target = Target::excluded(
                    business.path().to_string(),
                    row.values().clone(),
                    fingerprint,
                );
                batch
                    .push(WriteOp::Set {
                        doc: target_doc,
                        fields: fields_of(&target),
                    })
                    .await?;
                report.targets_created += 1;
                report.excluded_no_destination += 1;
                row.set(TRACKING_LINK_COLUMN, String::new());
            }
        }

        if let Some(adjusted) = prep
            .template_raw
            .as_deref()
            .and_then(template_with_qr_suffix)
        {
            let header = cols.header(Column::Template).unwrap_or("Template").to_string();
            row.set(&header, adjusted);
        }
        Ok(())
    }

    /// Creates the link document, retrying exactly once with the next free
    /// suffix when a concurrent writer won the race for the same id.
    #[allow(clippy::too_many_arguments)]
    async fn create_link(
        &self,
        allocator: &IdAllocator<S>,
        campaign: &DocRef,
        business: &DocRef,
        target: &DocRef,
        cols: &ColumnResolver,
        row: &ImportRow,
        prep: &PreparedRow,
        destination: &str,
        base: &str,
        first_id: String,
    ) -> Result<DocRef, ImportError> {
        let snapshot = MailingSnapshot::from_parts(
            prep.business_name.clone(),
            cols.get(row, Column::Street),
            cols.get(row, Column::HouseNumber),
            cols.get_owned(row, Column::Postcode),
            cols.get_owned(row, Column::City),
            cols.get_owned(row, Column::Country),
        );
        let link = Link {
            campaign_ref: campaign.path().to_string(),
            business_ref: business.path().to_string(),
            target_ref: target.path().to_string(),
            destination: destination.to_string(),
            template_id: prep
                .template_raw
                .as_deref()
                .and_then(template_with_qr_suffix),
            short_code: first_id.clone(),
            active: true,
            hit_count: 0,
            last_hit_at: None,
            owner_id: self.config.owner_id.clone(),
            snapshot_mailing: snapshot,
            campaign_name: self.config.campaign_name.clone(),
            created_at: Utc::now(),
        };

        create_with_retry(
            self.store.as_ref(),
            DocRef::new(LINKS, &first_id),
            2,
            |doc| {
                let mut link = link.clone();
                link.short_code = doc.id().to_string();
                fields_of(&link)
            },
            || async move {
                let next = allocator.next_free_after_requery(base).await?;
                Ok(DocRef::new(LINKS, &next))
            },
        )
        .await
    }

    async fn maybe_geocode(
        &self,
        cols: &ColumnResolver,
        row: &ImportRow,
        report: &mut ImportReport,
    ) -> Option<Coordinate> {
        if !self.config.geocode {
            return None;
        }
        let address = compose_full_address(
            cols.get(row, Column::Street),
            cols.get(row, Column::HouseNumber),
            cols.get(row, Column::Postcode),
            cols.get(row, Column::City),
            "Germany",
        );
        if address.is_empty() {
            return None;
        }
        match self.geocoder.geocode(&address).await {
            Some(coordinate) => {
                report.geocoded_ok += 1;
                Some(coordinate)
            }
            None => {
                report.geocoded_failed += 1;
                None
            }
        }
    }

    /// Compensating sweep for the fatal path: deletes this run's campaign
    /// targets, its links and the campaign document in bounded batches.
    async fn cleanup_campaign(&self) -> Result<(), StoreError> {
        let campaign = DocRef::new(CAMPAIGNS, &self.config.campaign_id);
        let mut batch = BatchWriter::new(Arc::clone(&self.store));

        let targets_collection = format!("{}/targets", campaign.path());
        for (id, _) in self.store.list_all(&targets_collection).await? {
            batch
                .push(WriteOp::Delete {
                    doc: DocRef::new(&targets_collection, &id),
                })
                .await?;
        }
        for (id, _) in self
            .store
            .query_eq(LINKS, "campaign_ref", &json!(campaign.path()))
            .await?
        {
            batch
                .push(WriteOp::Delete {
                    doc: DocRef::new(LINKS, &id),
                })
                .await?;
        }
        batch.push(WriteOp::Delete { doc: campaign }).await?;
        batch.flush().await?;
        info!(campaign_id = %self.config.campaign_id, "campaign artifacts removed");
        Ok(())
    }

    fn write_report(&self, input: &Path, report: &ImportReport) -> Result<PathBuf, ImportError> {
        let path = sibling_json(input, "_report");
        let display = path.display().to_string();
        let body = serde_json::to_string_pretty(report)
            .map_err(|e| ImportError::output_write(display.as_str(), e))?;
        std::fs::write(&path, body).map_err(|e| ImportError::output_write(display.as_str(), e))?;
        Ok(path)
    }

    fn write_error_report(&self, input: &Path, err: &ImportError) -> Result<PathBuf, ImportError> {
        let path = sibling_json(input, "_error");
        let display = path.display().to_string();
        let body = serde_json::to_string_pretty(&json!({
            "error": err.to_string(),
            "code": "duplicate_campaign_code",
            "campaign_id": self.config.campaign_id,
        }))
        .map_err(|e| ImportError::output_write(display.as_str(), e))?;
        std::fs::write(&path, body).map_err(|e| ImportError::output_write(display.as_str(), e))?;
        Ok(path)
    }
}

/// `{stem}{suffix}.json` next to the input file.
fn sibling_json(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("import");
    input.with_file_name(format!("{stem}{suffix}.json"))
}
