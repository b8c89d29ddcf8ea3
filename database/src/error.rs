use thiserror::Error;
use types::RangeError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid year range: {0}")]
    InvalidRange(#[from] RangeError),
}

/// Failure of the best-effort birth date lookup. Never fatal.
#[derive(Error, Debug, Clone)]
pub enum LookupError {
    #[error("People register unavailable: {0}")]
    Unavailable(String),

    #[error("People register lookup failed: {0}")]
    Failed(String),
}
