//! Bootstrap DDL for a fresh store.
//!
//! Stat tables are generated from each record's mapping table so the column
//! list cannot drift from the normalizer.

use itertools::Itertools;
use sqlx::SqlitePool;
use types::{BattingRecord, DefaultPolicy, FieldingRecord, PitchingRecord, StatRecord};

use crate::DatabaseError;

const PLAYERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    team TEXT,
    position TEXT,
    birth_date DATE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

const FAILED_WRITES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS failed_writes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    error_type TEXT NOT NULL,
    error_message TEXT NOT NULL,
    data TEXT
)"#;

pub fn stat_table_ddl<R: StatRecord>() -> Vec<String> {
    let columns = R::FIELDS
        .iter()
        .map(|spec| {
            let not_null = if spec.policy == DefaultPolicy::Required {
                " NOT NULL"
            } else {
                ""
            };
            format!("    {} {}{}", spec.field, spec.ty.sql_type(), not_null)
        })
        .join(",\n");

    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    player_id INTEGER NOT NULL REFERENCES players(id),\n    year INTEGER NOT NULL,\n{columns},\n    UNIQUE({key})\n)",
            table = R::TABLE,
            key = R::CONFLICT_KEY.join(", "),
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_year ON {table} (year)",
            table = R::TABLE
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_player ON {table} (player_id)",
            table = R::TABLE
        ),
    ]
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let statements = [PLAYERS_TABLE.to_string(), FAILED_WRITES_TABLE.to_string()]
        .into_iter()
        .chain(stat_table_ddl::<BattingRecord>())
        .chain(stat_table_ddl::<PitchingRecord>())
        .chain(stat_table_ddl::<FieldingRecord>());

    for statement in statements {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
    }
    tracing::debug!("Schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fielding_ddl_keys_on_position() {
        let ddl = stat_table_ddl::<FieldingRecord>();
        assert!(ddl[0].contains("UNIQUE(player_id, year, position)"));
        assert!(ddl[0].contains("position TEXT NOT NULL"));
    }

    #[test]
    fn test_batting_ddl_has_every_mapped_field() {
        let ddl = stat_table_ddl::<BattingRecord>();
        for spec in BattingRecord::FIELDS {
            assert!(ddl[0].contains(&format!(" {} ", spec.field)), "{}", spec.field);
        }
        assert!(ddl[0].contains("UNIQUE(player_id, year)"));
    }
}
