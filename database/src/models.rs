use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Insert payload for the players table; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// A batch whose transaction was rolled back, kept for operator follow-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedWrite {
    pub id: Option<i64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub error_type: String,
    pub error_message: String,
    pub data: Option<serde_json::Value>,
}
