use std::collections::HashMap;
use std::sync::Arc;

use types::{
    normalize, BattingRecord, FieldingRecord, PitchingRecord, PlayerCandidate, RawRow, StatKind,
    StatRecord,
};

use super::{PersistRecords, StatStore, StoreOutcome};
use crate::identity::IdentityResolver;
use crate::models::FailedWrite;
use crate::DatabaseError;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Persists raw provider rows in bounded, independently committed batches.
///
/// Row-level failures skip the row. A failed upsert or commit rolls back
/// only its own batch; those rows are counted as lost and the next batch
/// proceeds. The only error returned is failing to open a batch at all.
pub struct BatchWriter {
    store: Arc<dyn StatStore>,
    resolver: Arc<IdentityResolver>,
    batch_size: usize,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn StatStore>, resolver: Arc<IdentityResolver>) -> Self {
        Self {
            store,
            resolver,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn store_batch(
        &self,
        rows: &[RawRow],
        kind: StatKind,
    ) -> Result<StoreOutcome, DatabaseError> {
        match kind {
            StatKind::Batting => self.store_rows::<BattingRecord>(rows).await,
            StatKind::Pitching => self.store_rows::<PitchingRecord>(rows).await,
            StatKind::Fielding => self.store_rows::<FieldingRecord>(rows).await,
        }
    }

    async fn store_rows<R: PersistRecords>(
        &self,
        rows: &[RawRow],
    ) -> Result<StoreOutcome, DatabaseError> {
        let mut outcome = StoreOutcome::new(R::KIND, 0);
        tracing::info!(kind = %R::KIND, rows = rows.len(), "Processing records");

        for (index, chunk) in rows.chunks(self.batch_size).enumerate() {
            let start = index * self.batch_size;
            let batch = self.write_batch::<R>(start, chunk).await?;
            outcome.merge(&batch);

            tracing::info!(
                kind = %R::KIND,
                batch = index,
                stored = outcome.stored,
                skipped = outcome.skipped,
                lost = outcome.lost,
                total = rows.len(),
                "Batch {}-{} processed",
                start,
                start + chunk.len()
            );
        }

        if !outcome.is_complete() {
            tracing::warn!(
                "Stored {}/{} {} records",
                outcome.stored,
                outcome.input_rows,
                R::KIND
            );
        }
        Ok(outcome)
    }

    async fn write_batch<R: PersistRecords>(
        &self,
        start: usize,
        rows: &[RawRow],
    ) -> Result<StoreOutcome, DatabaseError> {
        let mut tally = StoreOutcome::new(R::KIND, rows.len());

        let mut normalized = Vec::with_capacity(rows.len());
        for (offset, row) in rows.iter().enumerate() {
            match normalize::<R>(row) {
                Ok(n) => normalized.push(n),
                Err(e) => {
                    tracing::error!(kind = %R::KIND, row = start + offset, error = %e, "Error processing record");
                    tally.skipped += 1;
                }
            }
        }
        if normalized.is_empty() {
            return Ok(tally);
        }

        let candidates: Vec<&PlayerCandidate> = normalized.iter().map(|n| &n.identity).collect();
        self.resolver.prepare(self.store.as_ref(), &candidates).await;

        let mut batch = self.store.begin_batch().await?;
        let mut records = Vec::with_capacity(normalized.len());
        let mut resolved_names = Vec::with_capacity(normalized.len());
        let mut created = 0;
        for n in normalized {
            match self.resolver.resolve(batch.as_mut(), &n.identity).await {
                Ok(player) => {
                    let mut record = n.record;
                    record.set_player_id(player.id);
                    records.push(record);
                    resolved_names.push((n.identity.name, player.id));
                    if player.created {
                        created += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(kind = %R::KIND, player = %n.identity.name, error = %e, "Error resolving player");
                    tally.skipped += 1;
                }
            }
        }

        let (records, superseded) = keep_last_per_key(records);
        if superseded > 0 {
            tracing::warn!(kind = %R::KIND, start, superseded, "Duplicate keys in batch, keeping the last row");
        }

        let write_result = match R::upsert_into(batch.as_mut(), &records).await {
            Ok(_) => batch.commit().await,
            Err(e) => Err(e),
        };
        if write_result.is_err() {
            if let Err(rollback_error) = batch.rollback().await {
                tracing::warn!(error = %rollback_error, "Rollback failed");
            }
        }
        drop(batch);

        match write_result {
            Ok(()) => {
                tally.stored = records.len();
                tally.superseded = superseded;
                tally.players_created = created;
                for (name, id) in resolved_names {
                    self.resolver.remember(&name, id).await;
                }
                tracing::debug!(kind = %R::KIND, start, records = records.len(), "Committed batch");
            }
            Err(e) => {
                tracing::error!(kind = %R::KIND, start, error = %e, "Error committing batch");
                tally.lost = records.len() + superseded;
                tally.failed_batches = 1;
                self.record_failure(&e, rows).await;
            }
        }
        Ok(tally)
    }

    async fn record_failure(&self, error: &DatabaseError, rows: &[RawRow]) {
        let data = match serde_json::to_value(rows) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize failed batch");
                None
            }
        };
        let failure = FailedWrite {
            id: None,
            timestamp: chrono::Utc::now(),
            error_type: "batch_commit".to_string(),
            error_message: error.to_string(),
            data,
        };
        if let Err(e) = self.store.record_failed_write(&failure).await {
            tracing::warn!(error = %e, "Could not record failed batch");
        }
    }
}

/// Collapses records sharing a natural key to the last one, in first-seen
/// key order. Returns the survivors and how many rows were dropped.
fn keep_last_per_key<R: StatRecord>(records: Vec<R>) -> (Vec<R>, usize) {
    let total = records.len();
    let mut slots: HashMap<(i64, i32, Vec<Option<String>>), usize> = HashMap::new();
    let mut kept: Vec<R> = Vec::with_capacity(total);
    for record in records {
        let key = (record.player_id(), record.year(), record.key_parts());
        match slots.get(&key) {
            Some(&i) => kept[i] = record,
            None => {
                slots.insert(key, kept.len());
                kept.push(record);
            }
        }
    }
    let superseded = total - kept.len();
    (kept, superseded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteStore;
    use crate::tests::{batting_row, setup_test_db};

    #[tokio::test]
    async fn test_rows_split_into_batches() {
        let store = Arc::new(SqliteStore::new(setup_test_db().await));
        let writer = BatchWriter::new(store.clone(), Arc::new(IdentityResolver::without_lookup()))
            .with_batch_size(4);
        let rows: Vec<RawRow> = (0..10)
            .map(|i| batting_row(&format!("Player {i}"), 2024))
            .collect();

        let outcome = writer.store_batch(&rows, StatKind::Batting).await.unwrap();

        assert_eq!(outcome.stored, 10);
        assert_eq!(outcome.players_created, 10);
        assert!(outcome.is_complete());
        assert_eq!(store.count_rows("batting_stats").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_duplicate_keys_count_once() {
        let store = Arc::new(SqliteStore::new(setup_test_db().await));
        let writer = BatchWriter::new(store.clone(), Arc::new(IdentityResolver::without_lookup()));
        let mut later = batting_row("Aaron Judge", 2024);
        later.insert("HR", serde_json::json!(58));
        let rows = vec![
            batting_row("Aaron Judge", 2024),
            batting_row("Juan Soto", 2024),
            later,
        ];

        let outcome = writer.store_batch(&rows, StatKind::Batting).await.unwrap();

        assert_eq!(outcome.stored, 2);
        assert_eq!(outcome.superseded, 1);
        assert!(outcome.is_complete());
        assert_eq!(store.count_rows("batting_stats").await.unwrap(), 2);
        let hr: Option<i64> = sqlx::query_scalar(
            "SELECT b.hr FROM batting_stats b JOIN players p ON p.id = b.player_id WHERE p.name = ?",
        )
        .bind("Aaron Judge")
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(hr, Some(58));
    }

    #[test]
    fn test_fielding_positions_are_distinct_keys() {
        let record = |position: &str, innings: f64| FieldingRecord {
            player_id: 1,
            year: 2024,
            position: Some(position.to_string()),
            innings: Some(innings),
            ..Default::default()
        };

        let (kept, superseded) = keep_last_per_key(vec![
            record("SS", 100.0),
            record("RF", 50.0),
            record("SS", 550.1),
        ]);

        assert_eq!(superseded, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].innings, Some(550.1));
        assert_eq!(kept[1].position.as_deref(), Some("RF"));
    }

    #[tokio::test]
    async fn test_batch_size_has_floor_of_one() {
        let store = Arc::new(SqliteStore::new(setup_test_db().await));
        let writer =
            BatchWriter::new(store, Arc::new(IdentityResolver::without_lookup())).with_batch_size(0);
        assert_eq!(writer.batch_size(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_a_no_op() {
        let store = Arc::new(SqliteStore::new(setup_test_db().await));
        let writer = BatchWriter::new(store, Arc::new(IdentityResolver::without_lookup()));
        let outcome = writer.store_batch(&[], StatKind::Pitching).await.unwrap();
        assert_eq!(outcome, StoreOutcome::new(StatKind::Pitching, 0));
    }
}
