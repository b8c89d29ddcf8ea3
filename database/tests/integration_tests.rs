//! End-to-end behaviour of the batch writer and auditor against an in-memory
//! SQLite store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use database::{
    ensure_schema, BatchWriter, CompletenessAuditor, DatabaseError, FailedWrite, IdentityResolver,
    NewPlayer, SqliteStore, StatStore, StoreBatch,
};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use types::{BattingRecord, FieldingRecord, PitchingRecord, RawRow, StatKind, YearRange};

async fn test_store() -> Arc<SqliteStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect");
    ensure_schema(&pool).await.expect("Failed to create schema");
    Arc::new(SqliteStore::new(pool))
}

fn writer_for(store: Arc<dyn StatStore>) -> BatchWriter {
    BatchWriter::new(store, Arc::new(IdentityResolver::without_lookup()))
}

fn batting_row(name: &str, season: i32, war: Option<f64>) -> RawRow {
    RawRow::from_iter([
        ("Name", json!(name)),
        ("Season", json!(season)),
        ("Team", json!("NYY")),
        ("PA", json!(550)),
        ("WAR", json!(war)),
    ])
}

/// Delegates to a real store but makes the commit of one chosen batch fail.
struct FailingCommitStore {
    inner: Arc<SqliteStore>,
    batches: AtomicUsize,
    fail_batch: usize,
}

#[async_trait]
impl StatStore for FailingCommitStore {
    async fn find_player(&self, name: &str) -> Result<Option<i64>, DatabaseError> {
        self.inner.find_player(name).await
    }

    async fn begin_batch(&self) -> Result<Box<dyn StoreBatch>, DatabaseError> {
        let index = self.batches.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin_batch().await?;
        Ok(Box::new(FailingCommitBatch {
            inner,
            fail_commit: index == self.fail_batch,
        }))
    }

    async fn record_failed_write(&self, failure: &FailedWrite) -> Result<(), DatabaseError> {
        self.inner.record_failed_write(failure).await
    }
}

struct FailingCommitBatch {
    inner: Box<dyn StoreBatch>,
    fail_commit: bool,
}

#[async_trait]
impl StoreBatch for FailingCommitBatch {
    async fn insert_or_get_player(
        &mut self,
        player: &NewPlayer,
    ) -> Result<(i64, bool), DatabaseError> {
        self.inner.insert_or_get_player(player).await
    }

    async fn upsert_batting_records(
        &mut self,
        records: &[BattingRecord],
    ) -> Result<u64, DatabaseError> {
        self.inner.upsert_batting_records(records).await
    }

    async fn upsert_pitching_records(
        &mut self,
        records: &[PitchingRecord],
    ) -> Result<u64, DatabaseError> {
        self.inner.upsert_pitching_records(records).await
    }

    async fn upsert_fielding_records(
        &mut self,
        records: &[FieldingRecord],
    ) -> Result<u64, DatabaseError> {
        self.inner.upsert_fielding_records(records).await
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        if self.fail_commit {
            return Err(DatabaseError::Transaction("disk I/O error".to_string()));
        }
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn test_three_new_players_stored() {
    let store = test_store().await;
    let writer = writer_for(store.clone());
    let rows = vec![
        batting_row("Aaron Judge", 2024, Some(10.8)),
        batting_row("Juan Soto", 2024, Some(7.9)),
        batting_row("Giancarlo Stanton", 2024, Some(0.8)),
    ];

    let outcome = writer.store_batch(&rows, StatKind::Batting).await.unwrap();

    assert_eq!(outcome.stored, 3);
    assert_eq!(outcome.players_created, 3);
    assert_eq!(store.count_rows("players").await.unwrap(), 3);
    assert_eq!(store.count_rows("batting_stats").await.unwrap(), 3);
}

#[tokio::test]
async fn test_malformed_row_only_skips_itself() {
    let store = test_store().await;
    let writer = writer_for(store.clone());
    let mut rows: Vec<RawRow> = (0..50)
        .map(|i| batting_row(&format!("Player {i}"), 2023, Some(1.0)))
        .collect();
    rows[17].remove("Season");

    let outcome = writer.store_batch(&rows, StatKind::Batting).await.unwrap();

    assert_eq!(outcome.stored, 49);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.lost, 0);
    assert_eq!(store.count_rows("batting_stats").await.unwrap(), 49);
}

#[tokio::test]
async fn test_failed_commit_loses_only_its_batch() {
    let store = test_store().await;
    let failing = Arc::new(FailingCommitStore {
        inner: store.clone(),
        batches: AtomicUsize::new(0),
        fail_batch: 1,
    });
    let writer = writer_for(failing).with_batch_size(10);
    let rows: Vec<RawRow> = (0..30)
        .map(|i| batting_row(&format!("Player {i}"), 2022, Some(2.0)))
        .collect();

    let outcome = writer.store_batch(&rows, StatKind::Batting).await.unwrap();

    assert_eq!(outcome.stored, 20);
    assert_eq!(outcome.lost, 10);
    assert_eq!(outcome.failed_batches, 1);
    assert_eq!(outcome.players_created, 20);
    assert_eq!(store.count_rows("batting_stats").await.unwrap(), 20);
    assert_eq!(store.count_rows("players").await.unwrap(), 20);
    assert_eq!(store.find_player("Player 15").await.unwrap(), None);
    assert!(store.find_player("Player 25").await.unwrap().is_some());
    assert_eq!(store.count_rows("failed_writes").await.unwrap(), 1);
}

#[tokio::test]
async fn test_storing_twice_does_not_duplicate() {
    let store = test_store().await;
    let rows = vec![
        batting_row("Mookie Betts", 2024, Some(4.4)),
        batting_row("Freddie Freeman", 2024, Some(3.8)),
    ];

    let first = writer_for(store.clone())
        .store_batch(&rows, StatKind::Batting)
        .await
        .unwrap();
    // A fresh writer has a cold cache and must find the players in the store.
    let second = writer_for(store.clone())
        .store_batch(&rows, StatKind::Batting)
        .await
        .unwrap();

    assert_eq!(first.stored, 2);
    assert_eq!(second.stored, 2);
    assert_eq!(second.players_created, 0);
    assert_eq!(store.count_rows("players").await.unwrap(), 2);
    assert_eq!(store.count_rows("batting_stats").await.unwrap(), 2);
}

#[tokio::test]
async fn test_fielding_positions_are_separate_rows() {
    let store = test_store().await;
    let row = |pos: &str, inn: f64| {
        RawRow::from_iter([
            ("Name", json!("Mookie Betts")),
            ("Season", json!(2024)),
            ("Pos", json!(pos)),
            ("Inn", json!(inn)),
            ("DRS", json!(2)),
        ])
    };

    let outcome = writer_for(store.clone())
        .store_batch(&[row("SS", 550.1), row("RF", 320.0)], StatKind::Fielding)
        .await
        .unwrap();

    assert_eq!(outcome.stored, 2);
    assert_eq!(store.count_rows("players").await.unwrap(), 1);
    assert_eq!(store.count_rows("fielding_stats").await.unwrap(), 2);
}

#[tokio::test]
async fn test_audit_reports_metric_population_per_era() {
    let store = test_store().await;
    let rows = vec![
        batting_row("Derek Jeter", 2000, Some(4.0)),
        batting_row("Ichiro Suzuki", 2004, Some(7.1)),
        batting_row("Albert Pujols", 2009, None),
    ];
    writer_for(store.clone())
        .store_batch(&rows, StatKind::Batting)
        .await
        .unwrap();

    let auditor = CompletenessAuditor::new(store.pool().clone());
    let report = auditor.audit(2000, 2019, 20).await.unwrap();

    assert_eq!(report.len(), 3);
    let batting = report
        .iter()
        .find(|e| e.kind == StatKind::Batting)
        .unwrap();
    assert_eq!(batting.era, YearRange::new(2000, 2019).unwrap());
    assert_eq!(batting.total_rows, 3);
    assert_eq!(batting.seasons, 3);
    assert_eq!(batting.pct_with("war"), Some(66.7));
    assert_eq!(batting.pct_with("pa"), Some(100.0));
    assert_eq!(batting.pct_with("barrel_pct"), Some(0.0));
    assert_eq!(batting.avg_volume, Some(550.0));

    let pitching = report
        .iter()
        .find(|e| e.kind == StatKind::Pitching)
        .unwrap();
    assert_eq!(pitching.total_rows, 0);
    assert_eq!(pitching.pct_with("war"), None);
}

#[tokio::test]
async fn test_audit_volume_averages_each_season_equally() {
    let store = test_store().await;
    let row = |name: &str, season: i32, pa: i64| {
        RawRow::from_iter([
            ("Name", json!(name)),
            ("Season", json!(season)),
            ("PA", json!(pa)),
        ])
    };
    // 2000 averages 500 PA over two rows, 2001 has one row of 200.
    let rows = vec![
        row("Derek Jeter", 2000, 600),
        row("Bernie Williams", 2000, 400),
        row("Derek Jeter", 2001, 200),
    ];
    writer_for(store.clone())
        .store_batch(&rows, StatKind::Batting)
        .await
        .unwrap();

    let report = CompletenessAuditor::new(store.pool().clone())
        .audit(2000, 2001, 2)
        .await
        .unwrap();
    let batting = report
        .iter()
        .find(|e| e.kind == StatKind::Batting)
        .unwrap();

    assert_eq!(batting.total_rows, 3);
    assert_eq!(batting.seasons, 2);
    assert_eq!(batting.avg_volume, Some(350.0));
    assert_eq!(batting.avg_rows_per_season, Some(1.5));
}
