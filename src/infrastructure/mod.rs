//! Infrastructure layer: concrete implementations of domain ports.
//!
//! # Modules
//!
//! - [`memory`] - In-memory [`crate::domain::store::DocumentStore`] used by
//!   tests and local runs
//! - [`geocode`] - Geocoder port with null and caching implementations

pub mod geocode;
pub mod memory;

pub use geocode::{CachedGeocoder, Geocoder, NullGeocoder};
pub use memory::MemoryStore;
