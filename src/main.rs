mod config;
mod dates;
mod error;
mod models;
mod pipeline;
mod storage;
mod utils;
mod weather;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ConfigSource, RunMode};
use crate::models::DateRange;
use crate::pipeline::Ingestor;
use crate::storage::BigQueryWarehouse;
use crate::weather::WeatherbitClient;

#[derive(Parser)]
#[command(name = "weather-ingest", about = "Weather observations → BigQuery", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Exit non-zero when the run did not insert every row
    #[arg(long, global = true, env = "INGEST_STRICT")]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch yesterday → today and insert the single daily record (scheduled mode)
    Daily,

    /// Backfill a fixed historical range in one call
    Bulk {
        /// First day, YYYY-MM-DD (default: BULK_START_DATE or 2023-06-01)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD (default: BULK_END_DATE or 2023-12-31)
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "weather_ingest=info,warn",
        1 => "weather_ingest=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mode = match cli.command {
        Command::Daily => RunMode::Daily,
        Command::Bulk { start, end } => {
            let range = match (start, end) {
                (Some(start), Some(end)) => {
                    if start > end {
                        bail!("--start {} is after --end {}", start, end);
                    }
                    Some(DateRange { start, end })
                }
                _ => None,
            };
            RunMode::Bulk { range }
        }
    };

    let _t = utils::Timer::start(match mode {
        RunMode::Daily => "Daily ingestion",
        RunMode::Bulk { .. } => "Bulk ingestion",
    });

    // Both clients are built lazily, after configuration has been checked.
    let ingestor = Ingestor::new(WeatherbitClient::new(), BigQueryWarehouse::new());

    // Configuration errors are the only ones raised to the trigger by default.
    let outcome = ingestor
        .invoke(mode, ConfigSource::Process)
        .await
        .context("Configuration check failed")?;

    info!("Run finished: {:?}", outcome);

    if cli.strict && !outcome.is_success() {
        bail!("ingestion did not complete cleanly: {:?}", outcome);
    }

    Ok(())
}
