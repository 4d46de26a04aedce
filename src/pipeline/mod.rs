//! Pipeline orchestrator: configuration → date range → weather source → mapper → warehouse.
//!
//! ## Run modes
//!
//! `RunMode::Daily` — scheduled use:
//!   fetches yesterday → today and expects exactly one record back.
//!
//! `RunMode::Bulk` — backfill:
//!   fetches a fixed range (deployment default or CLI override) and inserts every record.
//!
//! Configuration errors are returned to the caller. Everything after that is
//! folded into a [`RunOutcome`] and logged; the run itself still "succeeds".
//! Nothing is retried and re-running a range inserts the same rows again.

use crate::config::{ConfigSource, RunMode, Settings};
use crate::dates::RangeStrategy;
use crate::error::{IngestError, Result};
use crate::models::{DateRange, ObservationRecord, RowInsertError, TableId};
use crate::storage::Warehouse;
use crate::weather::mapper::observations_to_rows;
use crate::weather::{FetchRequest, WeatherSource};
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

/// How a run ended once configuration was accepted.
#[derive(Debug)]
pub enum RunOutcome {
    Inserted { rows: usize },
    PartialFailure { rows: usize, errors: Vec<RowInsertError> },
    FetchFailed(IngestError),
    InsertFailed(IngestError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Inserted { .. })
    }
}

pub struct Ingestor<S, W> {
    source: S,
    warehouse: W,
}

impl<S: WeatherSource, W: Warehouse> Ingestor<S, W> {
    pub fn new(source: S, warehouse: W) -> Self {
        Self { source, warehouse }
    }

    /// Entry point for one trigger firing.
    ///
    /// `Err` only for configuration problems, raised before any I/O.
    pub async fn invoke(&self, mode: RunMode, config: ConfigSource) -> Result<RunOutcome> {
        let settings = Settings::load(&mode, config)?;
        Ok(self.run(&settings, mode, Utc::now().date_naive()).await)
    }

    /// Run with already-validated settings, `today` anchoring the daily window.
    pub async fn run(&self, settings: &Settings, mode: RunMode, today: NaiveDate) -> RunOutcome {
        let strategy = match mode {
            RunMode::Daily => RangeStrategy::RelativeToNow,
            RunMode::Bulk { range } => RangeStrategy::Fixed(range.unwrap_or(settings.bulk_range)),
        };
        let range = strategy.resolve(today);
        let table = settings.warehouse.table_id();

        let request = FetchRequest::new(&settings.weather, range);
        let outcome = match self.fetch(&request, mode).await {
            Ok(records) => {
                let rows = observations_to_rows(&records);
                match self.warehouse.insert(&table, &rows).await {
                    Ok(errors) if errors.is_empty() => RunOutcome::Inserted { rows: rows.len() },
                    Ok(errors) => RunOutcome::PartialFailure { rows: rows.len(), errors },
                    Err(e) => RunOutcome::InsertFailed(e),
                }
            }
            Err(e) => RunOutcome::FetchFailed(e),
        };

        log_outcome(&outcome, &range, &table);
        outcome
    }

    async fn fetch(&self, request: &FetchRequest, mode: RunMode) -> Result<Vec<ObservationRecord>> {
        let records = self.source.fetch(request).await?;
        select_records(mode, &request.range, records)
    }
}

/// Daily runs expect exactly one record; bulk runs keep everything but need at least one.
pub fn select_records(
    mode: RunMode,
    range: &DateRange,
    records: Vec<ObservationRecord>,
) -> Result<Vec<ObservationRecord>> {
    if records.is_empty() {
        return Err(IngestError::NoDataForRange {
            start: range.start_param(),
            end: range.end_param(),
        });
    }
    match mode {
        RunMode::Daily if records.len() != 1 => {
            Err(IngestError::UnexpectedRecordCount(records.len()))
        }
        _ => Ok(records),
    }
}

fn log_outcome(outcome: &RunOutcome, range: &DateRange, table: &TableId) {
    match outcome {
        RunOutcome::Inserted { rows } => {
            info!("Weather data for {} successfully inserted: {} rows into {}", range, rows, table);
        }
        RunOutcome::PartialFailure { rows, errors } => {
            warn!(
                "Errors occurred while inserting data into {}: {} of {} rows rejected",
                table,
                errors.len(),
                rows
            );
            for e in errors {
                warn!("  {}", e);
            }
        }
        RunOutcome::InsertFailed(e) => {
            error!("Insert into {} failed for {}: {}", table, range, e);
        }
        RunOutcome::FetchFailed(e) => {
            error!("Error occurred while fetching weather data for {}: {}", range, e);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
