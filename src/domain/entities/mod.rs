//! Core domain entities representing the import data model.
//!
//! Entities are plain data structures without persistence logic; they
//! serialize straight into the document-store field maps via
//! [`crate::domain::store::fields_of`].
//!
//! # Entity Types
//!
//! - [`Business`] - Canonical per-company record, merged on every sight
//! - [`Campaign`] - Owner-scoped grouping with a globally unique code
//! - [`Target`] - Per-row audit record under a campaign
//! - [`Link`] - Create-only tracking link with its mailing snapshot
//! - [`BlacklistEntry`] - Read-only owner-scoped exclusion entry

pub mod blacklist;
pub mod business;
pub mod campaign;
pub mod link;
pub mod target;

pub use blacklist::BlacklistEntry;
pub use business::{Business, Coordinate};
pub use campaign::{Campaign, CampaignTotals};
pub use link::{Link, MailingSnapshot};
pub use target::{Target, TargetStatus};
