use std::fmt;
use std::time::Duration;

use database::StoreOutcome;
use serde::{Deserialize, Serialize};
use types::{StatKind, YearRange};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every fetched row of every chunk was stored.
    Complete,
    /// The run finished, but some rows were skipped or lost or a fetch failed.
    Partial,
    /// Stopped early on request.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindReport {
    pub kind: StatKind,
    pub fetched: usize,
    pub fetch_error: Option<String>,
    pub outcome: Option<StoreOutcome>,
}

impl KindReport {
    pub fn fetch_failed(kind: StatKind, error: String) -> Self {
        Self {
            kind,
            fetched: 0,
            fetch_error: Some(error),
            outcome: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fetch_error.is_none() && self.outcome.as_ref().map_or(true, StoreOutcome::is_complete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkReport {
    pub years: YearRange,
    pub kinds: Vec<KindReport>,
}

impl ChunkReport {
    pub fn is_complete(&self) -> bool {
        self.kinds.iter().all(KindReport::is_complete)
    }

    pub fn kind(&self, kind: StatKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotals {
    pub fetched: usize,
    pub stored: usize,
    pub superseded: usize,
    pub skipped: usize,
    pub lost: usize,
    pub failed_batches: usize,
    pub fetch_errors: usize,
    pub players_created: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub requested: YearRange,
    pub chunks: Vec<ChunkReport>,
    pub status: RunStatus,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(requested: YearRange) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            requested,
            chunks: Vec::new(),
            status: RunStatus::Complete,
            elapsed: Duration::ZERO,
        }
    }

    /// Derives the final status from the chunk reports.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        if self.status != RunStatus::Cancelled {
            self.status = if self.chunks.iter().all(ChunkReport::is_complete) {
                RunStatus::Complete
            } else {
                RunStatus::Partial
            };
        }
    }

    pub fn totals(&self, kind: StatKind) -> KindTotals {
        let mut totals = KindTotals::default();
        for report in self.chunks.iter().filter_map(|c| c.kind(kind)) {
            totals.fetched += report.fetched;
            if report.fetch_error.is_some() {
                totals.fetch_errors += 1;
            }
            if let Some(outcome) = &report.outcome {
                totals.stored += outcome.stored;
                totals.superseded += outcome.superseded;
                totals.skipped += outcome.skipped;
                totals.lost += outcome.lost;
                totals.failed_batches += outcome.failed_batches;
                totals.players_created += outcome.players_created;
            }
        }
        totals
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} for {}: {:?} after {} chunks in {:.1}s",
            self.run_id,
            self.requested,
            self.status,
            self.chunks.len(),
            self.elapsed.as_secs_f64()
        )?;
        for kind in StatKind::ALL {
            let t = self.totals(kind);
            if t == KindTotals::default() {
                continue;
            }
            writeln!(
                f,
                "  {kind}: fetched {}, stored {}, superseded {}, skipped {}, lost {} ({} failed batches), {} fetch errors, {} new players",
                t.fetched, t.stored, t.superseded, t.skipped, t.lost, t.failed_batches, t.fetch_errors, t.players_created
            )?;
        }
        Ok(())
    }
}
