use std::sync::Arc;
use std::time::{Duration, Instant};

use database::{BatchWriter, DatabaseError};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use types::{plan_ranges, RawRow, StatKind, YearRange};

use crate::config::IngestConfig;
use crate::error::{BackfillError, SourceError};
use crate::source::{column_coverage, SourceClient};
use crate::summary::{ChunkReport, KindReport, RunStatus, RunSummary};

#[derive(Debug, Clone, PartialEq)]
pub struct BackfillConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub chunk_size: u32,
    pub chunk_pause: Duration,
    pub fetch_concurrency: usize,
    pub kinds: Vec<StatKind>,
    /// Log per-column missing counts for every fetched table.
    pub log_column_coverage: bool,
}

impl BackfillConfig {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            chunk_size: 5,
            chunk_pause: Duration::from_secs(5),
            fetch_concurrency: 2,
            kinds: StatKind::ALL.to_vec(),
            log_column_coverage: false,
        }
    }

    /// One season, with column coverage logged.
    pub fn single_year(year: i32) -> Self {
        Self {
            chunk_size: 1,
            log_column_coverage: true,
            ..Self::new(year, year)
        }
    }

    pub fn from_settings(config: &IngestConfig) -> Self {
        Self {
            start_year: config.backfill.start_year,
            end_year: config.backfill.end_year,
            chunk_size: config.backfill.chunk_size,
            chunk_pause: Duration::from_secs(config.backfill.chunk_pause_secs),
            fetch_concurrency: config.source.fetch_concurrency,
            kinds: StatKind::ALL.to_vec(),
            log_column_coverage: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillState {
    Idle,
    FetchingChunk(YearRange),
    StoringChunk(YearRange),
    Delaying { next: YearRange },
    Done,
    Cancelled,
    Failed,
}

type ChunkFetch = Vec<(StatKind, Result<Vec<RawRow>, SourceError>)>;

/// Drives a descending, chunked backfill.
///
/// Chunk N+1 is fetched while chunk N is being stored; stores themselves
/// happen strictly chunk by chunk. Fetch failures and lost batches are
/// recorded in the summary and the run moves on. Only an unreachable store
/// or a crashed task ends the run with an error.
pub struct Backfill {
    source: Arc<SourceClient>,
    writer: Arc<BatchWriter>,
    config: BackfillConfig,
    cancel: CancellationToken,
    state: watch::Sender<BackfillState>,
}

impl Backfill {
    pub fn new(source: Arc<SourceClient>, writer: Arc<BatchWriter>, config: BackfillConfig) -> Self {
        let (state, _) = watch::channel(BackfillState::Idle);
        Self {
            source,
            writer,
            config,
            cancel: CancellationToken::new(),
            state,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BackfillState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BackfillState {
        self.state.borrow().clone()
    }

    fn set_state(&self, state: BackfillState) {
        log::debug!("Backfill state: {state:?}");
        self.state.send_replace(state);
    }

    pub async fn run(&self) -> Result<RunSummary, BackfillError> {
        let started = Instant::now();
        let requested = YearRange::new(self.config.start_year, self.config.end_year)?;
        let chunks = plan_ranges(
            self.config.start_year,
            self.config.end_year,
            self.config.chunk_size,
        )?;
        let mut summary = RunSummary::new(requested);
        log::info!(
            "Starting backfill {} for {requested} in {} chunks",
            summary.run_id,
            chunks.len()
        );

        let mut prefetch = chunks.first().map(|&years| self.spawn_fetch(years));

        for (i, &years) in chunks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(summary, prefetch, started));
            }

            self.set_state(BackfillState::FetchingChunk(years));
            log::info!("Collecting years {years}...");
            let fetched = match prefetch.take() {
                Some(handle) => match handle.await {
                    Ok(fetched) => fetched,
                    Err(e) => return Err(self.fail(format!("fetch task failed: {e}"), summary, None, started)),
                },
                None => self.fetch_chunk_now(years).await,
            };

            let next = chunks.get(i + 1).copied();
            prefetch = next.map(|years| self.spawn_fetch(years));

            self.set_state(BackfillState::StoringChunk(years));
            let report = match self.store_chunk(years, fetched).await {
                Ok(report) => report,
                Err(e) => {
                    return Err(self.fail(format!("storage unavailable: {e}"), summary, prefetch, started))
                }
            };
            log::info!("Completed {years}");
            summary.chunks.push(report);

            if let Some(next) = next {
                self.set_state(BackfillState::Delaying { next });
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Ok(self.cancelled(summary, prefetch, started));
                    }
                    _ = tokio::time::sleep(self.config.chunk_pause) => {}
                }
            }
        }

        summary.finish(started.elapsed());
        self.set_state(BackfillState::Done);
        log::info!("{summary}");
        Ok(summary)
    }

    fn spawn_fetch(&self, years: YearRange) -> JoinHandle<ChunkFetch> {
        let source = self.source.clone();
        let kinds = self.config.kinds.clone();
        let concurrency = self.config.fetch_concurrency.max(1);
        tokio::spawn(async move { fetch_kinds(source, kinds, years, concurrency).await })
    }

    async fn fetch_chunk_now(&self, years: YearRange) -> ChunkFetch {
        fetch_kinds(
            self.source.clone(),
            self.config.kinds.clone(),
            years,
            self.config.fetch_concurrency.max(1),
        )
        .await
    }

    async fn store_chunk(
        &self,
        years: YearRange,
        fetched: ChunkFetch,
    ) -> Result<ChunkReport, DatabaseError> {
        let stores = fetched.into_iter().map(|(kind, result)| async move {
            match result {
                Ok(rows) => {
                    if self.config.log_column_coverage {
                        log_coverage(kind, &rows);
                    }
                    let outcome = self.writer.store_batch(&rows, kind).await?;
                    log::info!("{outcome}");
                    Ok(KindReport {
                        kind,
                        fetched: rows.len(),
                        fetch_error: None,
                        outcome: Some(outcome),
                    })
                }
                Err(e) => {
                    log::error!("Error fetching {kind} stats for {years}: {e}");
                    Ok(KindReport::fetch_failed(kind, e.to_string()))
                }
            }
        });

        let kinds = join_all(stores)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(ChunkReport { years, kinds })
    }

    fn cancelled(
        &self,
        mut summary: RunSummary,
        prefetch: Option<JoinHandle<ChunkFetch>>,
        started: Instant,
    ) -> RunSummary {
        if let Some(handle) = prefetch {
            handle.abort();
        }
        summary.status = RunStatus::Cancelled;
        summary.finish(started.elapsed());
        self.set_state(BackfillState::Cancelled);
        log::warn!("Backfill cancelled after {} chunks", summary.chunks.len());
        summary
    }

    fn fail(
        &self,
        reason: String,
        mut summary: RunSummary,
        prefetch: Option<JoinHandle<ChunkFetch>>,
        started: Instant,
    ) -> BackfillError {
        if let Some(handle) = prefetch {
            handle.abort();
        }
        summary.finish(started.elapsed());
        summary.status = RunStatus::Partial;
        self.set_state(BackfillState::Failed);
        log::error!("Backfill failed: {reason}");
        BackfillError::Fatal {
            reason,
            summary: Box::new(summary),
        }
    }
}

async fn fetch_kinds(
    source: Arc<SourceClient>,
    kinds: Vec<StatKind>,
    years: YearRange,
    concurrency: usize,
) -> ChunkFetch {
    stream::iter(kinds)
        .map(|kind| {
            let source = source.clone();
            async move { (kind, source.fetch(kind, years).await) }
        })
        .buffered(concurrency)
        .collect()
        .await
}

fn log_coverage(kind: StatKind, rows: &[RawRow]) {
    let gaps: Vec<_> = column_coverage(rows)
        .into_iter()
        .filter(|c| c.missing > 0)
        .collect();
    log::info!("{kind}: {} rows, {} columns with gaps", rows.len(), gaps.len());
    for gap in gaps {
        log::info!(
            "  {}: {} missing ({}%)",
            gap.column,
            gap.missing,
            gap.pct_missing
        );
    }
}
