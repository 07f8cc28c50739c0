mod common;

use linkseed::domain::store::DocRef;
use linkseed::infrastructure::MemoryStore;
use linkseed::prelude::Importer;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_three_row_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    common::seed_blacklist(&store, "owner-1", "listed-10115").await;

    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,Ort,destination\n\
         Acme Bau,53177,Bonn,https://example.com/offer\n\
         Acme Bau,53177,Bonn,\n\
         Listed Corp,10115,Berlin,https://example.com/x\n",
    );

    let importer = common::importer(Arc::clone(&store), common::test_config());
    let outcome = importer.run(&input).await.unwrap();
    let report = &outcome.report;

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.links_created, 1);
    assert_eq!(report.targets_created, 2);
    assert_eq!(report.excluded_no_destination, 1);
    assert_eq!(report.blacklisted_count, 1);
    assert_eq!(report.blacklisted[0].row_number, 3);
    assert_eq!(report.error_count, 0);

    // Output file: blacklisted row removed, tracking_link appended last.
    let written = std::fs::read_to_string(&outcome.output_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Namenszeile,PLZ,Ort,destination,tracking_link");
    assert!(lines[1].ends_with("https://qr.test/?id=acme-bau"));
    assert!(lines[2].ends_with(","));
    assert!(!written.contains("Listed Corp"));

    // Store state: one link, two targets, one business with the owner set.
    let link = store.document(&DocRef::new("links", "acme-bau")).unwrap();
    assert_eq!(link["short_code"], json!("acme-bau"));
    assert_eq!(link["destination"], json!("https://example.com/offer"));
    assert_eq!(link["campaign_ref"], json!("campaigns/camp-1"));
    assert_eq!(link["active"], json!(true));

    assert_eq!(common::target_count(&store, "camp-1").await, 2);

    let business = store
        .document(&DocRef::new("businesses", "acme-bau-53177"))
        .unwrap();
    assert_eq!(business["owner_ids"], json!(["owner-1"]));
    assert!(store.document(&DocRef::new("businesses", "listed-10115")).is_none());

    let campaign = store.document(&DocRef::new("campaigns", "camp-1")).unwrap();
    assert_eq!(campaign["totals"]["targets"], json!(2));
    assert_eq!(campaign["totals"]["links"], json!(1));

    // Report JSON written next to the input.
    let report_json = std::fs::read_to_string(&outcome.report_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report_json).unwrap();
    assert_eq!(parsed["blacklisted_count"], json!(1));
}

#[tokio::test]
async fn test_duplicate_base_ids_in_one_run_get_suffixes() {
    let store = Arc::new(MemoryStore::new());
    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,destination\n\
         Acme Bau,53177,https://example.com/a\n\
         Acme Bau,53177,https://example.com/b\n\
         Acme Bau,53177,https://example.com/c\n",
    );

    let importer = common::importer(Arc::clone(&store), common::test_config());
    let outcome = importer.run(&input).await.unwrap();

    assert_eq!(outcome.report.links_created, 3);
    let mut ids = common::all_link_ids(&store).await;
    ids.sort();
    assert_eq!(ids, vec!["acme-bau", "acme-bau-1", "acme-bau-2"]);

    // Each link points at its own destination.
    let first = store.document(&DocRef::new("links", "acme-bau")).unwrap();
    let third = store.document(&DocRef::new("links", "acme-bau-2")).unwrap();
    assert_eq!(first["destination"], json!("https://example.com/a"));
    assert_eq!(third["destination"], json!("https://example.com/c"));
}

#[tokio::test]
async fn test_skip_existing_rerun_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let csv = "Namenszeile,PLZ,destination\n\
               Acme Bau,53177,https://example.com/a\n\
               Müller & Sohn GmbH,10115,https://example.com/b\n";
    let (_dir, input) = common::write_csv(csv);

    let first = common::importer(Arc::clone(&store), common::test_config())
        .run(&input)
        .await
        .unwrap();
    assert_eq!(first.report.links_created, 2);
    assert_eq!(first.report.targets_created, 2);

    let mut config = common::test_config();
    config.skip_existing = true;
    let second = common::importer(Arc::clone(&store), config)
        .run(&input)
        .await
        .unwrap();

    assert_eq!(second.report.links_created, 0);
    assert_eq!(second.report.links_skipped_existing, 2);
    assert_eq!(second.report.targets_created, first.report.targets_created);

    // No suffixed variants were minted by the re-import.
    let ids = common::all_link_ids(&store).await;
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"acme-bau".to_string()));
    assert!(ids.contains(&"muellerundsohn".to_string()));

    // The re-imported rows still point at the existing ids.
    let written = std::fs::read_to_string(&second.output_path).unwrap();
    assert!(written.contains("https://qr.test/?id=acme-bau"));
    assert!(written.contains("https://qr.test/?id=muellerundsohn"));
}

#[tokio::test]
async fn test_limit_leaves_tail_rows_in_output_unprocessed() {
    let store = Arc::new(MemoryStore::new());
    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,destination\n\
         Firma Eins,10001,https://example.com/1\n\
         Firma Zwei,10002,https://example.com/2\n\
         Firma Drei,10003,https://example.com/3\n",
    );

    let mut config = common::test_config();
    config.limit = 2;
    let outcome = common::importer(Arc::clone(&store), config)
        .run(&input)
        .await
        .unwrap();

    assert_eq!(outcome.report.links_created, 2);
    assert_eq!(outcome.report.targets_created, 2);
    assert_eq!(outcome.report.total_rows, 3);

    let written = std::fs::read_to_string(&outcome.output_path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 4);
    // The over-limit row stays in the file with an empty tracking link.
    assert!(lines[3].starts_with("Firma Drei"));
    assert!(lines[3].ends_with(","));
}

#[tokio::test]
async fn test_default_destination_applies_to_rows_without_one() {
    let store = Arc::new(MemoryStore::new());
    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,destination\n\
         Acme Bau,53177,\n\
         Beta Werk,10115,https://example.com/own\n",
    );

    let mut config = common::test_config();
    config.destination = Some("https://example.com/default".to_string());
    let outcome = common::importer(Arc::clone(&store), config)
        .run(&input)
        .await
        .unwrap();

    assert_eq!(outcome.report.links_created, 2);
    assert_eq!(outcome.report.excluded_no_destination, 0);

    let acme = store.document(&DocRef::new("links", "acme-bau")).unwrap();
    assert_eq!(acme["destination"], json!("https://example.com/default"));
    let beta = store.document(&DocRef::new("links", "beta-werk")).unwrap();
    assert_eq!(beta["destination"], json!("https://example.com/own"));
}

#[tokio::test]
async fn test_batch_commits_stay_under_ceiling() {
    let store = Arc::new(MemoryStore::new());

    let mut csv = String::from("Namenszeile,PLZ,destination\n");
    for i in 0..250 {
        csv.push_str(&format!("Firma {i},{},https://example.com/{i}\n", 10000 + i));
    }
    let (_dir, input) = common::write_csv(&csv);

    let outcome = common::importer(Arc::clone(&store), common::test_config())
        .run(&input)
        .await
        .unwrap();
    assert_eq!(outcome.report.links_created, 250);

    // 250 rows × 3 batched ops = 750 ops → ceil(750/400) = 2 batch commits,
    // plus the single campaign-totals commit.
    assert_eq!(store.commit_count(), 3);
}

#[tokio::test]
async fn test_geocode_attaches_coordinates_and_counts() {
    let store = Arc::new(MemoryStore::new());
    let (_dir, input) = common::write_csv(
        "Namenszeile,Straße,Hausnummer,PLZ,Ort,destination\n\
         Acme Bau,Hauptstraße,12a,53177,Bonn,https://example.com/a\n",
    );

    let mut config = common::test_config();
    config.geocode = true;
    let importer = Importer::new(
        Arc::clone(&store),
        Arc::new(common::StaticGeocoder),
        config,
    );
    let outcome = importer.run(&input).await.unwrap();

    assert_eq!(outcome.report.geocoded_ok, 1);
    assert_eq!(outcome.report.geocoded_failed, 0);

    let business = store
        .document(&DocRef::new("businesses", "acme-bau-53177"))
        .unwrap();
    assert_eq!(business["coordinate"]["source"], json!("static"));
    assert_eq!(business["coordinate"]["lat"], json!(50.73));
}

#[tokio::test]
async fn test_template_column_gets_qr_suffix() {
    let store = Arc::new(MemoryStore::new());
    let (_dir, input) = common::write_csv(
        "Namenszeile,PLZ,Template,destination\n\
         Acme Bau,53177,flyer_a5.pdf,https://example.com/a\n",
    );

    let outcome = common::importer(Arc::clone(&store), common::test_config())
        .run(&input)
        .await
        .unwrap();

    let written = std::fs::read_to_string(&outcome.output_path).unwrap();
    assert!(written.contains("flyer_a5_qr_track.pdf"));

    let link = store.document(&DocRef::new("links", "acme-bau")).unwrap();
    assert_eq!(link["template_id"], json!("flyer_a5_qr_track.pdf"));
}
