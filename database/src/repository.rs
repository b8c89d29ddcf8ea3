use async_trait::async_trait;
use itertools::Itertools;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use types::{BattingRecord, FieldingRecord, MetricValue, PitchingRecord, StatRecord};

use crate::models::{FailedWrite, NewPlayer};
use crate::writers::{StatStore, StoreBatch};
use crate::DatabaseError;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl StatStore for SqliteStore {
    async fn find_player(&self, name: &str) -> Result<Option<i64>, DatabaseError> {
        let row = sqlx::query("SELECT id FROM players WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        Ok(row.map(|r| r.get("id")))
    }

    async fn begin_batch(&self) -> Result<Box<dyn StoreBatch>, DatabaseError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(Box::new(SqliteBatch { tx: Some(tx) }))
    }

    async fn record_failed_write(&self, failure: &FailedWrite) -> Result<(), DatabaseError> {
        let data = failure
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(DatabaseError::Serialization)?;

        sqlx::query(
            "INSERT INTO failed_writes (timestamp, error_type, error_message, data) VALUES (?, ?, ?, ?)",
        )
        .bind(failure.timestamp)
        .bind(&failure.error_type)
        .bind(&failure.error_message)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }
}

pub struct SqliteBatch {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteBatch {
    fn conn(&mut self) -> Result<&mut SqliteConnection, DatabaseError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::Transaction("batch already finished".to_string()))
    }
}

#[async_trait]
impl StoreBatch for SqliteBatch {
    async fn insert_or_get_player(
        &mut self,
        player: &NewPlayer,
    ) -> Result<(i64, bool), DatabaseError> {
        let conn = self.conn()?;
        let result = sqlx::query(
            "INSERT INTO players (name, team, position, birth_date) VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(&player.name)
        .bind(&player.team)
        .bind(&player.position)
        .bind(player.birth_date)
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;

        if result.rows_affected() == 1 {
            return Ok((result.last_insert_rowid(), true));
        }

        let row = sqlx::query("SELECT id FROM players WHERE name = ?")
            .bind(&player.name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .ok_or_else(|| DatabaseError::PlayerNotFound(player.name.clone()))?;
        Ok((row.get("id"), false))
    }

    async fn upsert_batting_records(
        &mut self,
        records: &[BattingRecord],
    ) -> Result<u64, DatabaseError> {
        upsert_records(self.conn()?, records).await
    }

    async fn upsert_pitching_records(
        &mut self,
        records: &[PitchingRecord],
    ) -> Result<u64, DatabaseError> {
        upsert_records(self.conn()?, records).await
    }

    async fn upsert_fielding_records(
        &mut self,
        records: &[FieldingRecord],
    ) -> Result<u64, DatabaseError> {
        upsert_records(self.conn()?, records).await
    }

    async fn commit(&mut self) -> Result<(), DatabaseError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DatabaseError::Transaction("batch already finished".to_string()))?;
        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))
    }

    async fn rollback(&mut self) -> Result<(), DatabaseError> {
        match self.tx.take() {
            Some(tx) => tx
                .rollback()
                .await
                .map_err(|e| DatabaseError::Transaction(e.to_string())),
            None => Ok(()),
        }
    }
}

/// `INSERT ... ON CONFLICT(key) DO UPDATE`: a re-fetched row overwrites the
/// stored one.
pub fn upsert_sql<R: StatRecord>() -> String {
    let columns = R::FIELDS.iter().map(|spec| spec.field).collect::<Vec<_>>();
    let placeholders = std::iter::repeat("?").take(columns.len() + 2).join(", ");
    let updates = columns
        .iter()
        .filter(|column| !R::CONFLICT_KEY.contains(column))
        .map(|column| format!("{column} = excluded.{column}"))
        .join(", ");

    format!(
        "INSERT INTO {table} (player_id, year, {columns}) VALUES ({placeholders}) \
         ON CONFLICT({key}) DO UPDATE SET {updates}",
        table = R::TABLE,
        columns = columns.join(", "),
        key = R::CONFLICT_KEY.join(", "),
    )
}

async fn upsert_records<R: StatRecord>(
    conn: &mut SqliteConnection,
    records: &[R],
) -> Result<u64, DatabaseError> {
    if records.is_empty() {
        return Ok(0);
    }
    let sql = upsert_sql::<R>();
    let mut affected = 0;
    for record in records {
        let mut query = sqlx::query(&sql)
            .bind(record.player_id())
            .bind(record.year());
        for value in record.metrics() {
            query = match value {
                MetricValue::Int(v) => query.bind(v),
                MetricValue::Float(v) => query.bind(v),
                MetricValue::Text(v) => query.bind(v),
            };
        }
        affected += query
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .rows_affected();
    }
    Ok(affected)
}
