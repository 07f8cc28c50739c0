//! Run configuration loaded from environment variables.
//!
//! The configuration *struct* is owned here; populating it is the job of
//! the outer trigger plumbing (manifest loader, object metadata, CLI). For
//! headless runs [`load_from_env`] reads the same fields from environment
//! variables and validates them before anything touches the store.
//!
//! ## Required Variables
//!
//! - `OWNER_ID` - UID of the user owning this import
//! - `BASE_URL` - Base URL for tracking links, e.g. `https://qr.example.com`
//! - `CAMPAIGN_ID` - Document id of the campaign to import into
//!
//! ## Optional Variables
//!
//! - `DESTINATION` - Default destination URL for rows without one
//! - `CAMPAIGN_CODE` / `CAMPAIGN_NAME` - Human code and display name
//! - `IMPORT_LIMIT` - Row cap, `0` = all (default: 0)
//! - `SKIP_EXISTING` - Pre-scan and skip existing link ids (default: false)
//! - `GEOCODE` - Resolve coordinates for business addresses (default: false)
//! - `DERIVE_ID_FROM_IDENTITY` - Use non-generic email domains as link id
//!   bases (default: false)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)

use anyhow::{Context, Result};
use std::env;
use url::Url;

/// Import run configuration.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub owner_id: String,
    pub base_url: String,
    /// Default destination for rows without a `destination`/`url` column.
    pub destination: Option<String>,
    pub campaign_code: Option<String>,
    pub campaign_name: Option<String>,
    pub campaign_id: String,
    /// Only process the first N rows; `0` processes everything.
    pub limit: usize,
    /// Pre-scan link ids and skip creating those that already exist.
    pub skip_existing: bool,
    pub geocode: bool,
    /// Derive link id bases from non-generic email domains before falling
    /// back to the business-name slug.
    pub derive_id_from_identity: bool,
    pub log_level: String,
    pub log_format: String,
}

impl ImportConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let owner_id = env::var("OWNER_ID").context("OWNER_ID must be set")?;
        let base_url = env::var("BASE_URL").context("BASE_URL must be set")?;
        let campaign_id = env::var("CAMPAIGN_ID").context("CAMPAIGN_ID must be set")?;

        let limit = env::var("IMPORT_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            owner_id,
            base_url,
            destination: env::var("DESTINATION").ok().filter(|v| !v.is_empty()),
            campaign_code: env::var("CAMPAIGN_CODE").ok().filter(|v| !v.is_empty()),
            campaign_name: env::var("CAMPAIGN_NAME").ok().filter(|v| !v.is_empty()),
            campaign_id,
            limit,
            skip_existing: env_flag("SKIP_EXISTING"),
            geocode: env_flag("GEOCODE"),
            derive_id_from_identity: env_flag("DERIVE_ID_FROM_IDENTITY"),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `owner_id` or `campaign_id` is empty
    /// - `base_url` is not a valid HTTP(S) URL
    /// - `log_format` is not `text` or `json`
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            anyhow::bail!("OWNER_ID must not be empty");
        }
        if self.campaign_id.trim().is_empty() {
            anyhow::bail!("CAMPAIGN_ID must not be empty");
        }

        let url = Url::parse(&self.base_url)
            .with_context(|| format!("BASE_URL is not a valid URL: '{}'", self.base_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!(
                "BASE_URL must use http or https, got '{}'",
                url.scheme()
            );
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        Ok(())
    }

    /// Prints a configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Owner: {}", self.owner_id);
        tracing::info!("  Campaign: {} ({:?})", self.campaign_id, self.campaign_code);
        tracing::info!("  Base URL: {}", self.base_url);
        tracing::info!(
            "  Limit: {}",
            if self.limit == 0 {
                "all".to_string()
            } else {
                self.limit.to_string()
            }
        );
        tracing::info!("  Skip existing: {}", self.skip_existing);
        tracing::info!("  Geocode: {}", self.geocode);
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
pub fn load_from_env() -> Result<ImportConfig> {
    let config = ImportConfig::from_env()?;
    config.validate()?;
    Ok(config)
}
