#![allow(dead_code)]

use async_trait::async_trait;
use linkseed::domain::entities::Coordinate;
use linkseed::domain::store::{DocRef, DocumentStore, Fields};
use linkseed::infrastructure::{Geocoder, MemoryStore, NullGeocoder};
use linkseed::prelude::{ImportConfig, Importer};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub fn test_config() -> ImportConfig {
    ImportConfig {
        owner_id: "owner-1".to_string(),
        base_url: "https://qr.test".to_string(),
        destination: None,
        campaign_code: Some("ADM-01".to_string()),
        campaign_name: Some("Spring Mailing".to_string()),
        campaign_id: "camp-1".to_string(),
        limit: 0,
        skip_existing: false,
        geocode: false,
        derive_id_from_identity: false,
        log_level: "info".to_string(),
        log_format: "text".to_string(),
    }
}

pub fn importer(
    store: Arc<MemoryStore>,
    config: ImportConfig,
) -> Importer<MemoryStore, NullGeocoder> {
    Importer::new(store, Arc::new(NullGeocoder), config)
}

/// Writes a CSV input file into a fresh temp dir and returns both.
pub fn write_csv(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.csv");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

pub async fn seed_link(store: &MemoryStore, id: &str) {
    let mut fields = Fields::new();
    fields.insert("short_code".to_string(), json!(id));
    fields.insert("destination".to_string(), json!("https://example.com/seeded"));
    store
        .create(&DocRef::new("links", id), fields)
        .await
        .unwrap();
}

pub async fn seed_blacklist(store: &MemoryStore, owner_id: &str, business_id: &str) {
    let mut fields = Fields::new();
    fields.insert("business_id".to_string(), json!(business_id));
    store
        .create(
            &DocRef::new(
                &format!("customers/{owner_id}/blacklist"),
                &format!("bl-{business_id}"),
            ),
            fields,
        )
        .await
        .unwrap();
}

pub async fn seed_campaign(store: &MemoryStore, campaign_id: &str, code: Option<&str>) {
    let mut fields = Fields::new();
    fields.insert("campaign_name".to_string(), json!(campaign_id));
    fields.insert("code".to_string(), code.map_or(json!(null), |c| json!(c)));
    fields.insert("owner_id".to_string(), json!("owner-1"));
    fields.insert("status".to_string(), json!("draft"));
    store
        .create(&DocRef::new("campaigns", campaign_id), fields)
        .await
        .unwrap();
}

pub async fn all_link_ids(store: &MemoryStore) -> Vec<String> {
    store.list_ids_with_prefix("links", "").await.unwrap()
}

pub async fn target_count(store: &MemoryStore, campaign_id: &str) -> usize {
    store
        .list_all(&format!("campaigns/{campaign_id}/targets"))
        .await
        .unwrap()
        .len()
}

/// Geocoder resolving every address to the same coordinate.
pub struct StaticGeocoder;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, _address: &str) -> Option<Coordinate> {
        Some(Coordinate {
            lat: 50.73,
            lon: 7.1,
            source: "static".to_string(),
        })
    }
}
