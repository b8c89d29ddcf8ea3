pub mod chadwick;
pub mod config;
pub mod error;
pub mod fangraphs;
pub mod orchestrator;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod source;
pub mod summary;

pub use chadwick::ChadwickRegister;
pub use config::IngestConfig;
pub use error::{BackfillError, ConfigError, SourceError};
pub use fangraphs::FanGraphsProvider;
pub use orchestrator::{Backfill, BackfillConfig, BackfillState};
pub use provider::{GroupSet, StatGroup, StatGroups, StatsProvider};
pub use rate_limit::{RateLimit, TokenBucket, Unthrottled};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use source::{column_coverage, outer_join, ColumnCoverage, SourceClient};
pub use summary::{ChunkReport, KindReport, RunStatus, RunSummary};
