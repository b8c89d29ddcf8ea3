use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use database::{
    BatchWriter, BirthDateLookup, CompletenessAuditor, DatabaseConfig, IdentityResolver,
    NoBirthDateLookup, SqliteStore, StatStore,
};
use ingestion::{
    Backfill, BackfillConfig, ChadwickRegister, FanGraphsProvider, IngestConfig, RunStatus,
    SourceClient, TokenBucket,
};

#[derive(Parser, Debug)]
#[command(about = "Historical baseball statistics backfill")]
struct Params {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and store a single season, logging column coverage
    Test {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Backfill a range of seasons, newest first
    Backfill {
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
        #[arg(long)]
        chunk_size: Option<u32>,
    },
    /// Report data completeness per era
    Audit {
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
        #[arg(long)]
        era_size: Option<u32>,
    },
}

fn build_backfill(
    config: &IngestConfig,
    store: Arc<SqliteStore>,
    backfill: BackfillConfig,
) -> Result<Backfill, Box<dyn std::error::Error>> {
    let lookup: Arc<dyn BirthDateLookup> = if config.people.enabled {
        Arc::new(ChadwickRegister::new(config.people.register_url.as_str()))
    } else {
        Arc::new(NoBirthDateLookup)
    };
    let store: Arc<dyn StatStore> = store;
    let writer = BatchWriter::new(store, Arc::new(IdentityResolver::new(lookup)))
        .with_batch_size(config.writer.batch_size);

    let provider = FanGraphsProvider::new(&config.source)?;
    let source = SourceClient::new(Arc::new(provider), config.source.groups.clone())
        .with_rate_limit(Arc::new(TokenBucket::per_minute(
            config.source.requests_per_minute,
            config.source.burst,
        )))
        .with_retry(config.source.retry_policy());

    Ok(Backfill::new(Arc::new(source), Arc::new(writer), backfill))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let config = IngestConfig::load(args.config.as_deref())?;
    let db_config =
        DatabaseConfig::from_cli_or_env_or_yaml(args.database_url, config.database.url.clone());
    let store = Arc::new(database::connect(&db_config).await?);

    let backfill_config = match args.command {
        Command::Audit {
            start_year,
            end_year,
            era_size,
        } => {
            let auditor = CompletenessAuditor::new(store.pool().clone());
            let report = auditor
                .audit(
                    start_year.unwrap_or(config.backfill.start_year),
                    end_year.unwrap_or(config.backfill.end_year),
                    era_size.unwrap_or(config.backfill.era_size),
                )
                .await?;
            for era in report {
                println!("{era}");
            }
            return Ok(());
        }
        Command::Test { year } => {
            let mut backfill = BackfillConfig::single_year(year.unwrap_or(config.backfill.test_year));
            backfill.fetch_concurrency = config.source.fetch_concurrency;
            backfill
        }
        Command::Backfill {
            start_year,
            end_year,
            chunk_size,
        } => {
            let mut backfill = BackfillConfig::from_settings(&config);
            backfill.start_year = start_year.unwrap_or(backfill.start_year);
            backfill.end_year = end_year.unwrap_or(backfill.end_year);
            backfill.chunk_size = chunk_size.unwrap_or(backfill.chunk_size);
            backfill
        }
    };

    let backfill = build_backfill(&config, store.clone(), backfill_config)?;
    let cancel = backfill.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after the current chunk");
            cancel.cancel();
        }
    });

    let summary = backfill.run().await?;
    println!("{summary}");
    for table in ["players", "batting_stats", "pitching_stats", "fielding_stats"] {
        println!("{table}: {} rows", store.count_rows(table).await?);
    }
    if summary.status == RunStatus::Partial {
        log::warn!("Backfill finished with gaps; see failed_writes and the log above");
    }
    Ok(())
}
