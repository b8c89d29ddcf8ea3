use std::fmt::Display;

use serde::{Deserialize, Serialize};
use types::StatKind;

/// What happened to the rows handed to one `store_batch` call.
///
/// `stored + superseded + skipped + lost == input_rows` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    pub kind: StatKind,
    pub input_rows: usize,
    /// Distinct natural keys written.
    pub stored: usize,
    /// Rows replaced by a later row with the same natural key in one batch.
    pub superseded: usize,
    /// Rows dropped individually: mapping or identity failures.
    pub skipped: usize,
    /// Rows belonging to batches whose transaction was rolled back.
    pub lost: usize,
    pub failed_batches: usize,
    pub players_created: usize,
}

impl StoreOutcome {
    pub fn new(kind: StatKind, input_rows: usize) -> Self {
        Self {
            kind,
            input_rows,
            stored: 0,
            superseded: 0,
            skipped: 0,
            lost: 0,
            failed_batches: 0,
            players_created: 0,
        }
    }

    /// No row was skipped or lost.
    pub fn is_complete(&self) -> bool {
        self.stored + self.superseded == self.input_rows
    }

    /// Adds another outcome's counters into this one.
    pub fn merge(&mut self, other: &StoreOutcome) {
        self.input_rows += other.input_rows;
        self.stored += other.stored;
        self.superseded += other.superseded;
        self.skipped += other.skipped;
        self.lost += other.lost;
        self.failed_batches += other.failed_batches;
        self.players_created += other.players_created;
    }
}

impl Display for StoreOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: stored {}/{} ({} superseded, skipped {}, lost {} in {} failed batches, {} new players)",
            self.kind,
            self.stored,
            self.input_rows,
            self.superseded,
            self.skipped,
            self.lost,
            self.failed_batches,
            self.players_created
        )
    }
}
