//! Tests for the record store module

use super::*;
use crate::core::types::{ClubRecord, Compliance, Snapshot};
use serde_json::json;
use tempfile::TempDir;

fn sample_snapshot() -> Snapshot {
    Snapshot::new(
        2024,
        vec![
            ClubRecord::new("arsenal", 2024)
                .with_revenue(500_000_000.0)
                .with_debt(100_000_000.0)
                .with_compliance(Compliance::Compliant),
            ClubRecord::new("brighton", 2024)
                .with_revenue(150_000_000.0)
                .with_debt(20_000_000.0),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_and_load_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonSnapshotStore::new(temp_dir.path());
    let snapshot = sample_snapshot();

    let path = store.save_snapshot(&snapshot).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "ffp_data_2024.json");
    assert!(!temp_dir.path().join("ffp_data_2024.json.tmp").exists());

    let loaded = store.load(2024).await.unwrap();
    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn test_load_missing_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonSnapshotStore::new(temp_dir.path());

    let err = store.load(1999).await.unwrap_err();
    match err {
        RecordError::SnapshotNotFound { path } => assert!(path.ends_with("ffp_data_1999.json")),
        other => panic!("expected SnapshotNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_source_file_format() {
    // Shape produced by the upstream collector: boolean compliance, timestamp
    let temp_dir = TempDir::new().unwrap();
    let body = json!([
        {
            "club": "Manchester City",
            "year": 2024,
            "revenue": 712_800_000,
            "wages": 423_000_000,
            "transfer_spending": 258_000_000,
            "net_spend": 120_000_000,
            "profit_loss": 80_000_000,
            "debt": 0,
            "squad_cost": 1_100_000_000,
            "ffp_compliance": true,
            "scraped_at": "2024-06-01T12:00:00Z"
        }
    ]);
    std::fs::write(
        temp_dir.path().join("ffp_data_2024.json"),
        serde_json::to_string_pretty(&body).unwrap(),
    )
    .unwrap();

    let store = JsonSnapshotStore::new(temp_dir.path());
    let snapshot = store.load(2024).await.unwrap();
    let city = snapshot.get("Manchester City").unwrap();
    assert_eq!(city.revenue, 712_800_000.0);
    assert_eq!(city.ffp_compliance, Compliance::Compliant);
    assert!(city.scraped_at.is_some());
}

#[tokio::test]
async fn test_load_collector_file_with_naive_timestamp() {
    let temp_dir = TempDir::new().unwrap();
    let body = r#"[{"club": "brighton", "year": 2023, "revenue": 150000000, "wages": 90000000,
        "transfer_spending": 60000000, "net_spend": -20000000, "profit_loss": 25000000,
        "debt": 20000000, "squad_cost": 300000000, "ffp_compliance": true,
        "scraped_at": "2023-06-30T12:00:00.123456"}]"#;
    std::fs::write(temp_dir.path().join("ffp_data_2023.json"), body).unwrap();

    let store = JsonSnapshotStore::new(temp_dir.path());
    let snapshot = store.load(2023).await.unwrap();
    let brighton = snapshot.get("brighton").unwrap();

    assert_eq!(
        brighton.scraped_at.map(|t| t.to_rfc3339()),
        Some("2023-06-30T12:00:00.123456+00:00".to_string())
    );
    assert_eq!(brighton.net_spend, -20_000_000.0);
    let metadata = brighton.to_metadata().unwrap();
    assert_eq!(metadata["revenue"], json!(150000000));
}

#[tokio::test]
async fn test_load_rejects_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("ffp_data_2024.json"), "{ not json").unwrap();

    let store = JsonSnapshotStore::new(temp_dir.path());
    assert!(matches!(
        store.load(2024).await,
        Err(RecordError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn test_load_rejects_duplicates_in_file() {
    let temp_dir = TempDir::new().unwrap();
    let body = json!([
        {"club": "arsenal", "year": 2024},
        {"club": "arsenal", "year": 2024}
    ]);
    std::fs::write(temp_dir.path().join("ffp_data_2024.json"), body.to_string()).unwrap();

    let store = JsonSnapshotStore::new(temp_dir.path());
    assert!(matches!(
        store.load(2024).await,
        Err(RecordError::DuplicateRecord { .. })
    ));
}

#[tokio::test]
async fn test_save_and_load_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonSnapshotStore::new(temp_dir.path().join("nested"));

    let run = json!({
        "timestamp": "2024-06-01T12:00:00Z",
        "analyses": [{"type": "risk_assessment", "analysis": "Low risk."}],
        "raw_data": []
    });
    let path = store.save_analysis(2024, &run).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "ffp_analysis_2024.json");

    let loaded: serde_json::Value = store.load_analysis(2024).await.unwrap();
    assert_eq!(loaded, run);
}

#[tokio::test]
async fn test_static_source_filters_by_period() {
    let source = StaticSource::new(vec![
        ClubRecord::new("arsenal", 2023),
        ClubRecord::new("arsenal", 2024),
    ])
    .with_record(ClubRecord::new("brighton", 2024));

    let snapshot = source.load(2024).await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.records().iter().all(|r| r.year == 2024));

    assert!(matches!(
        source.load(2030).await,
        Err(RecordError::SnapshotNotFound { .. })
    ));
}
