use std::time::{Duration, Instant};

use serde::Serialize;

use crate::bigquery::WarehouseClient;
use crate::domain::{DatasetKind, MaxRecords, TargetDate};
use crate::error::GdeltError;
use crate::fetch::Fetcher;
use crate::query::QueryBuilder;
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub max_records: MaxRecords,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub dataset: DatasetKind,
    pub date: String,
    pub database: String,
    pub max_records: u64,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub total_rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub runs: Vec<RunResult>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Drives one dataset pipeline: fetch, schema, store.
pub struct App<W: WarehouseClient> {
    store: Store,
    client: W,
}

impl<W: WarehouseClient> App<W> {
    pub fn new(store: Store, client: W) -> Self {
        Self { store, client }
    }

    /// Validates `date` before touching the filesystem or the warehouse.
    pub fn run(
        &self,
        kind: DatasetKind,
        date: &str,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, GdeltError> {
        let date: TargetDate = date.parse()?;
        self.run_for(kind, date, options, sink)
    }

    pub fn run_all(
        &self,
        date: &str,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, GdeltError> {
        let date: TargetDate = date.parse()?;
        let runs = DatasetKind::ALL
            .iter()
            .map(|kind| self.run_for(*kind, date, options, sink))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BatchResult { runs })
    }

    fn run_for(
        &self,
        kind: DatasetKind,
        date: TargetDate,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, GdeltError> {
        let started = Instant::now();
        let database = self.store.db_path(kind, date);

        if options.dry_run {
            let query = QueryBuilder::new(kind.schema()).build(date, options.max_records)?;
            sink.event(ProgressEvent {
                message: format!("phase=Query; {kind} {date} (dry run)"),
                elapsed: None,
            });
            return Ok(RunResult {
                dataset: kind,
                date: date.to_string(),
                database: database.to_string(),
                max_records: options.max_records.get(),
                fetched: 0,
                inserted: 0,
                skipped: 0,
                total_rows: 0,
                query: Some(query.sql),
            });
        }

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {kind} {date} (max {})", options.max_records),
            elapsed: None,
        });
        let records = Fetcher::new(&self.client, kind.schema()).fetch(date, options.max_records)?;

        // The day file is only created once the query has succeeded.
        sink.event(ProgressEvent {
            message: format!("phase=Schema; opening {database}"),
            elapsed: Some(started.elapsed()),
        });
        let mut day = self.store.open_day(kind, date)?;

        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {} records", records.len()),
            elapsed: Some(started.elapsed()),
        });
        let summary = day.store(&records)?;
        let total_rows = day.row_count()?;
        day.close()?;

        sink.event(ProgressEvent {
            message: format!(
                "phase=Done; {} inserted, {} skipped",
                summary.inserted, summary.skipped
            ),
            elapsed: Some(started.elapsed()),
        });

        Ok(RunResult {
            dataset: kind,
            date: date.to_string(),
            database: database.to_string(),
            max_records: options.max_records.get(),
            fetched: records.len(),
            inserted: summary.inserted,
            skipped: summary.skipped,
            total_rows,
            query: None,
        })
    }
}
