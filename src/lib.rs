//! # Linkseed
//!
//! Bulk address-list import pipeline: turns each CSV/XLSX row into a
//! durable, uniquely identifiable tracking artifact — a business record, a
//! campaign target and, when a destination URL is present, a tracking link
//! with a short, collision-free, human-meaningful identifier.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer
//! separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities and the document-store
//!   port
//! - **Application Layer** ([`application`]) - Import services and the
//!   pipeline driver
//! - **Infrastructure Layer** ([`infrastructure`]) - In-memory store and
//!   geocoder implementations
//! - **I/O Layer** ([`io`]) - CSV/XLSX row sources and typed column
//!   resolution
//!
//! ## Guarantees
//!
//! - Link ids are globally unique: deterministic bases plus collision-free
//!   suffix allocation, with a one-shot retry on concurrent create races
//! - Campaign codes are unique across all campaigns; a conflict aborts the
//!   run and sweeps its artifacts
//! - Business upserts are commutative and idempotent across imports and
//!   owners
//! - Owner-blacklisted businesses never produce targets or links
//!
//! ## Quick Start
//!
//! ```ignore
//! use linkseed::prelude::*;
//! use std::sync::Arc;
//!
//! let config = linkseed::config::load_from_env()?;
//! linkseed::telemetry::init(&config.log_level, &config.log_format);
//!
//! let store = Arc::new(MemoryStore::new());
//! let geocoder = Arc::new(linkseed::infrastructure::NullGeocoder);
//! let importer = Importer::new(store, geocoder, config);
//! let outcome = importer.run(std::path::Path::new("businesses.csv")).await?;
//! println!("{}", serde_json::to_string_pretty(&outcome.report)?);
//! ```
//!
//! ## Configuration
//!
//! Run parameters are loaded from environment variables via
//! [`config::ImportConfig`]. See the [`config`] module for available
//! options.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod io;
pub mod telemetry;
pub mod utils;

pub use error::ImportError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::batch::BatchWriter;
    pub use crate::application::services::{
        BlacklistFilter, CampaignResolver, IdAllocator, ImportOutcome, ImportReport, Importer,
    };
    pub use crate::config::ImportConfig;
    pub use crate::domain::entities::{
        Business, Campaign, Coordinate, Link, Target, TargetStatus,
    };
    pub use crate::domain::store::{DocRef, DocumentStore, Fields, StoreError, WriteOp};
    pub use crate::error::ImportError;
    pub use crate::infrastructure::{CachedGeocoder, Geocoder, MemoryStore, NullGeocoder};
}
