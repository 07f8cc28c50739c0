//! Application layer implementing the import business logic.
//!
//! Services consume the [`crate::domain::store::DocumentStore`] and
//! [`crate::infrastructure::geocode::Geocoder`] ports and are wired
//! together by [`services::Importer`]:
//!
//! - [`services::campaign_resolver::CampaignResolver`] - Campaign
//!   get-or-create with code-uniqueness enforcement
//! - [`services::blacklist_filter::BlacklistFilter`] - Owner-scoped row
//!   exclusion
//! - [`services::id_allocator::IdAllocator`] - Deterministic base ids and
//!   collision-free suffix allocation
//! - [`services::business_upserter`] - Idempotent business merges
//! - [`services::report::ImportReport`] - Terminal run report
//! - [`batch::BatchWriter`] - Bounded batched commits

pub mod batch;
pub mod services;

pub use batch::{create_with_retry, BatchWriter, MAX_BATCH_OPS};
