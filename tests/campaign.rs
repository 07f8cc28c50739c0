mod common;

use linkseed::domain::store::{DocRef, DocumentStore, Fields};
use linkseed::infrastructure::MemoryStore;
use linkseed::prelude::{CampaignResolver, ImportError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_get_or_create_creates_then_reuses() {
    let store = Arc::new(MemoryStore::new());
    let resolver = CampaignResolver::new(Arc::clone(&store));

    let first = resolver
        .get_or_create("owner-1", "camp-1", Some("Spring"), Some("adm 01"))
        .await
        .unwrap();
    let second = resolver
        .get_or_create("owner-1", "camp-1", Some("Spring"), Some("ADM-01"))
        .await
        .unwrap();

    assert_eq!(first, second);
    let stored = store.document(&DocRef::new("campaigns", "camp-1")).unwrap();
    assert_eq!(stored["code"], json!("ADM-01"));
    assert_eq!(stored["campaign_name"], json!("Spring"));
    assert_eq!(stored["totals"]["targets"], json!(0));
}

#[tokio::test]
async fn test_duplicate_code_under_second_id_errors_without_write() {
    let store = Arc::new(MemoryStore::new());
    let resolver = CampaignResolver::new(Arc::clone(&store));

    resolver
        .get_or_create("owner-1", "camp-b", None, Some("X"))
        .await
        .unwrap();

    let err = resolver
        .get_or_create("owner-1", "camp-a", None, Some("X"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::DuplicateCampaignCode { ref code, ref existing_id }
            if code == "X" && existing_id == "camp-b"
    ));
    assert!(store.document(&DocRef::new("campaigns", "camp-a")).is_none());
}

#[tokio::test]
async fn test_codeless_campaigns_never_conflict() {
    let store = Arc::new(MemoryStore::new());
    let resolver = CampaignResolver::new(Arc::clone(&store));

    resolver
        .get_or_create("owner-1", "camp-a", None, None)
        .await
        .unwrap();
    resolver
        .get_or_create("owner-1", "camp-b", None, None)
        .await
        .unwrap();

    assert!(store.document(&DocRef::new("campaigns", "camp-a")).is_some());
    assert!(store.document(&DocRef::new("campaigns", "camp-b")).is_some());
}

#[tokio::test]
async fn test_increment_totals_accumulates() {
    let store = Arc::new(MemoryStore::new());
    let resolver = CampaignResolver::new(Arc::clone(&store));
    let campaign = resolver
        .get_or_create("owner-1", "camp-1", None, None)
        .await
        .unwrap();

    resolver.increment_totals(&campaign, 10, 7).await.unwrap();
    resolver.increment_totals(&campaign, 5, 2).await.unwrap();

    let stored = store.document(&campaign).unwrap();
    assert_eq!(stored["totals"]["targets"], json!(15));
    assert_eq!(stored["totals"]["links"], json!(9));
}

#[tokio::test]
async fn test_fatal_conflict_aborts_run_and_sweeps_leftovers() {
    let store = Arc::new(MemoryStore::new());

    // Another campaign already holds the code this run wants.
    common::seed_campaign(&store, "camp-other", Some("ADM-01")).await;
    // Leftovers under this run's campaign root from an earlier attempt.
    common::seed_campaign(&store, "camp-1", None).await;
    store
        .create(
            &DocRef::new("campaigns/camp-1/targets", "t-left"),
            Fields::new(),
        )
        .await
        .unwrap();
    let mut link_fields = Fields::new();
    link_fields.insert("campaign_ref".to_string(), json!("campaigns/camp-1"));
    store
        .create(&DocRef::new("links", "left-over"), link_fields)
        .await
        .unwrap();

    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,destination\nAcme Bau,53177,https://example.com/a\n",
    );
    let err = common::importer(Arc::clone(&store), common::test_config())
        .run(&input)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::DuplicateCampaignCode { ref existing_id, .. } if existing_id == "camp-other"
    ));

    // The run's campaign root was swept clean; the conflicting campaign
    // stays untouched.
    assert!(store.document(&DocRef::new("campaigns", "camp-1")).is_none());
    assert_eq!(common::target_count(&store, "camp-1").await, 0);
    assert!(store.document(&DocRef::new("links", "left-over")).is_none());
    assert!(store.document(&DocRef::new("campaigns", "camp-other")).is_some());

    // No new artifacts, no output file, an error report instead.
    assert!(store.document(&DocRef::new("links", "acme-bau")).is_none());
    assert!(!input.with_file_name("input_with_links.csv").exists());
    let error_report =
        std::fs::read_to_string(input.with_file_name("input_error.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&error_report).unwrap();
    assert_eq!(parsed["code"], json!("duplicate_campaign_code"));
    assert_eq!(parsed["campaign_id"], json!("camp-1"));
    assert!(!input.with_file_name("input_report.json").exists());
}

#[tokio::test]
async fn test_conflict_on_own_pre_existing_doc_does_not_sweep() {
    let store = Arc::new(MemoryStore::new());

    // The campaign id itself is taken by a campaign with a different code.
    common::seed_campaign(&store, "camp-1", Some("OLD-99")).await;

    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,destination\nAcme Bau,53177,https://example.com/a\n",
    );
    let err = common::importer(Arc::clone(&store), common::test_config())
        .run(&input)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::DuplicateCampaignCode { ref existing_id, .. } if existing_id == "camp-1"
    ));
    // The pre-existing campaign is not ours to delete.
    let stored = store.document(&DocRef::new("campaigns", "camp-1")).unwrap();
    assert_eq!(stored["code"], json!("OLD-99"));
}
