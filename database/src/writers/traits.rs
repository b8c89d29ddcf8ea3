use async_trait::async_trait;
use types::{BattingRecord, FieldingRecord, PitchingRecord, StatRecord};

use crate::models::{FailedWrite, NewPlayer};
use crate::DatabaseError;

/// Read side of the store plus the entry point for batch transactions.
#[async_trait]
pub trait StatStore: Send + Sync {
    async fn find_player(&self, name: &str) -> Result<Option<i64>, DatabaseError>;

    /// Opens a transaction scoped to exactly one batch.
    async fn begin_batch(&self) -> Result<Box<dyn StoreBatch>, DatabaseError>;

    async fn record_failed_write(&self, failure: &FailedWrite) -> Result<(), DatabaseError>;
}

/// Write operations available inside one batch transaction. Dropping a batch
/// without committing rolls it back.
#[async_trait]
pub trait StoreBatch: Send {
    /// Returns the player's id and whether this call created it.
    async fn insert_or_get_player(&mut self, player: &NewPlayer)
        -> Result<(i64, bool), DatabaseError>;
    async fn upsert_batting_records(
        &mut self,
        records: &[BattingRecord],
    ) -> Result<u64, DatabaseError>;
    async fn upsert_pitching_records(
        &mut self,
        records: &[PitchingRecord],
    ) -> Result<u64, DatabaseError>;
    async fn upsert_fielding_records(
        &mut self,
        records: &[FieldingRecord],
    ) -> Result<u64, DatabaseError>;
    async fn commit(&mut self) -> Result<(), DatabaseError>;
    async fn rollback(&mut self) -> Result<(), DatabaseError>;
}

/// Routes a record type to its upsert operation.
#[async_trait]
pub trait PersistRecords: StatRecord {
    async fn upsert_into(batch: &mut dyn StoreBatch, records: &[Self])
        -> Result<u64, DatabaseError>;
}

#[async_trait]
impl PersistRecords for BattingRecord {
    async fn upsert_into(
        batch: &mut dyn StoreBatch,
        records: &[Self],
    ) -> Result<u64, DatabaseError> {
        batch.upsert_batting_records(records).await
    }
}

#[async_trait]
impl PersistRecords for PitchingRecord {
    async fn upsert_into(
        batch: &mut dyn StoreBatch,
        records: &[Self],
    ) -> Result<u64, DatabaseError> {
        batch.upsert_pitching_records(records).await
    }
}

#[async_trait]
impl PersistRecords for FieldingRecord {
    async fn upsert_into(
        batch: &mut dyn StoreBatch,
        records: &[Self],
    ) -> Result<u64, DatabaseError> {
        batch.upsert_fielding_records(records).await
    }
}
