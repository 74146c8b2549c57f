// file: tests/reconciliation.rs
// description: end-to-end reconciliation runs against a temporary SQLite file
// reference: tokio integration tests over tempfile databases

use chrono::{DateTime, FixedOffset};
use novel_sync::{
    Config, DatabaseConfig, NovelDbClient, RawRecord, Reconciler, SnapshotStore,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn raw(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("test record must be an object"),
    }
}

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

async fn setup(dir: &TempDir, chunk_size: usize) -> Reconciler {
    let mut config = Config::default_config();
    config.database = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("novel.db").display()),
        table_name: "novel".to_string(),
        max_connections: 2,
    };
    config.pipeline.chunk_size = chunk_size;
    config.pipeline.change_log_dir = dir.path().join("change_logs");

    let client = NovelDbClient::new(config.database.clone()).await.unwrap();
    Reconciler::with_client(config, client)
}

fn listing_batch() -> Vec<RawRecord> {
    vec![
        raw(json!({
            "platform": "Munpia", "id": 1, "title": "A", "author": "writer",
            "info": "<p>intro<br/>more</p>", "view": 10, "the_number_of_serials": "12",
            "newstatus": true, "finishstatus": false, "agegrade": false,
            "registdate": "2023-05-01 09:15:00", "updatedate": "2024-06-30 08:00:00",
            "sort_option": "A1"
        })),
        raw(json!({
            "platform": "Munpia", "id": 2, "title": "B", "author": "other",
            "view": "1,500", "updatedate": "-"
        })),
        raw(json!({"platform": "Munpia", "id": 3, "title": "C", "view": 0})),
    ]
}

#[tokio::test]
async fn second_run_of_same_batch_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let reconciler = setup(&dir, 2).await;

    let first = reconciler
        .reconcile_at(&listing_batch(), at("2025-02-01T10:00:00+09:00"))
        .await
        .unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(first.updated, 0);

    let second = reconciler
        .reconcile_at(&listing_batch(), at("2025-02-02T10:00:00+09:00"))
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(second.change_log_path, None);

    let rows = reconciler.client().fetch_first(10).await.unwrap();
    assert_eq!(rows.len(), 3);
    // untouched rows keep the crawltime of the run that wrote them
    assert_eq!(rows[0].crawltime, Some(at("2025-02-01T10:00:00+09:00")));
    assert_eq!(rows[0].info.as_deref(), Some("intro more"));
    assert_eq!(rows[1].views, 1500);
    assert_eq!(rows[1].updatedate, None);
}

#[tokio::test]
async fn changed_listing_updates_full_row_and_logs_diff() {
    let dir = TempDir::new().unwrap();
    let reconciler = setup(&dir, 1000).await;

    reconciler
        .reconcile_at(
            &[raw(json!({"id": 1, "title": "A", "author": "writer", "view": 10}))],
            at("2025-02-01T10:00:00+09:00"),
        )
        .await
        .unwrap();

    let report = reconciler
        .reconcile_at(
            &[
                raw(json!({"id": 1, "title": "A", "author": "writer", "view": 15})),
                raw(json!({"id": 5, "title": "New", "author": null})),
            ],
            at("2025-02-01T11:30:00+09:00"),
        )
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.inserted, 1);

    let path = report.change_log_path.expect("change log written");
    assert_eq!(path.file_name().unwrap(), "2025-02-01_11-30-00-log.json");
    let log: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        log,
        json!([{"ID": 1, "Changes": {"views": {"before": "10", "after": "15"}}}])
    );

    let rows = reconciler.client().fetch_first(10).await.unwrap();
    assert_eq!(rows[0].title.as_deref(), Some("A"));
    assert_eq!(rows[0].views, 15);
    assert_eq!(rows[0].crawltime, Some(at("2025-02-01T11:30:00+09:00")));
    assert_eq!(rows[1].id, 5);
    assert_eq!(rows[1].author, None);
}

#[tokio::test]
async fn same_day_date_shift_is_not_an_update() {
    let dir = TempDir::new().unwrap();
    let reconciler = setup(&dir, 10).await;

    reconciler
        .reconcile_at(
            &[raw(json!({"id": 7, "updatedate": "2024-06-30 08:00:00"}))],
            at("2025-02-01T10:00:00+09:00"),
        )
        .await
        .unwrap();

    let report = reconciler
        .reconcile_at(
            &[raw(json!({"id": 7, "updatedate": "2024-06-30 23:59:59"}))],
            at("2025-02-01T12:00:00+09:00"),
        )
        .await
        .unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn duplicate_ids_in_snapshot_resolve_last_wins() {
    let dir = TempDir::new().unwrap();
    let reconciler = setup(&dir, 2).await;

    let snapshot = SnapshotStore::new(dir.path().join("snapshot.json"));
    snapshot
        .write(&[
            raw(json!({"id": 9, "title": "first"})),
            raw(json!({"id": 9, "title": "second"})),
            raw(json!({"title": "missing id"})),
        ])
        .unwrap();

    let report = reconciler.reconcile_snapshot(&snapshot).await.unwrap();
    assert_eq!(report.received, 3);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.superseded, 1);
    assert_eq!(report.inserted, 1);

    let rows = reconciler.client().fetch_last(1).await.unwrap();
    assert_eq!(rows[0].title.as_deref(), Some("second"));
}
