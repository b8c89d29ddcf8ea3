pub mod audit;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod repository;
pub mod schema;
pub mod writers;

pub use audit::{profile_for, AuditProfile, CompletenessAuditor, EraCompleteness, MetricCoverage};
pub use config::DatabaseConfig;
pub use error::{DatabaseError, LookupError};
pub use identity::{BirthDateLookup, IdentityResolver, NoBirthDateLookup, ResolvedPlayer};
pub use models::{FailedWrite, NewPlayer};
pub use repository::SqliteStore;
pub use schema::ensure_schema;
pub use writers::{BatchWriter, PersistRecords, StatStore, StoreBatch, StoreOutcome};

/// Opens the configured database and makes sure every table exists.
pub async fn connect(config: &DatabaseConfig) -> Result<SqliteStore, DatabaseError> {
    let pool = config
        .create_pool()
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    ensure_schema(&pool).await?;
    tracing::info!(url = %config.url, "Connected to stats database");
    Ok(SqliteStore::new(pool))
}
