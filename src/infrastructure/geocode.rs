//! Geocoding port and wrappers.
//!
//! The actual HTTP geocoding client lives outside this crate; the pipeline
//! only consumes the [`Geocoder`] trait. [`CachedGeocoder`] adds the
//! per-address memoization every import run wants (address lists repeat
//! addresses heavily), [`NullGeocoder`] serves runs with geocoding
//! disabled.

use crate::domain::entities::Coordinate;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Resolves postal addresses to coordinates.
///
/// Implementations must be infallible from the pipeline's perspective:
/// lookup failures are expressed as `None` and counted in the report, never
/// raised.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns the coordinate for a composed address, or `None` when the
    /// address cannot be resolved.
    async fn geocode(&self, address: &str) -> Option<Coordinate>;
}

/// A geocoder that resolves nothing.
///
/// Used when geocoding is disabled or no token is configured.
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn geocode(&self, _address: &str) -> Option<Coordinate> {
        None
    }
}

/// Memoizing wrapper around another geocoder.
///
/// Each distinct address is resolved at most once per run; negative results
/// are cached too, so a dead address does not trigger repeated lookups.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<String, Option<Coordinate>>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct addresses resolved so far.
    pub async fn cached_addresses(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Option<Coordinate> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(address) {
            debug!(address, "geocode cache hit");
            return cached.clone();
        }
        let resolved = self.inner.geocode(address).await;
        cache.insert(address.to_string(), resolved.clone());
        resolved
    }
}
