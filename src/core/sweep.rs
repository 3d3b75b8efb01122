//! Sweep driver
//!
//! One sweep of one feed: list the remote directory, select the files worth
//! ingesting, then process each file's rows strictly in order. Failure
//! isolation follows the file/row boundary throughout: a bad file never
//! blocks the feed, a bad row never blocks its file, and a file is recorded
//! as processed only after every row in it has been attempted.

use crate::core::processor::ReconciliationProcessor;
use crate::core::selector::select_files;
use crate::io::decode_rows;
use crate::parser::{FileMeta, SettlementParser};
use crate::ports::{FileSource, ProcessedFileRegistry, ReconMetrics};
use crate::types::ReconError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Outcome counts for one sweep of one feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub files_listed: u64,
    pub files_selected: u64,
    pub files_processed: u64,
    pub files_failed: u64,
    pub rows_processed: u64,
    pub rows_failed: u64,
}

/// Drives one settlement feed through a sweep cycle
pub struct FileSweep {
    source: Arc<dyn FileSource>,
    registry: Arc<dyn ProcessedFileRegistry>,
    processor: ReconciliationProcessor,
    metrics: Arc<dyn ReconMetrics>,
    fan_out: usize,
}

impl FileSweep {
    pub fn new(
        source: Arc<dyn FileSource>,
        registry: Arc<dyn ProcessedFileRegistry>,
        processor: ReconciliationProcessor,
        metrics: Arc<dyn ReconMetrics>,
        fan_out: usize,
    ) -> Self {
        FileSweep {
            source,
            registry,
            processor,
            metrics,
            fan_out,
        }
    }

    /// Run one sweep of the given feed
    ///
    /// Only a failure to list the remote directory aborts the sweep; every
    /// later failure is contained to one file or one row.
    pub async fn run(&self, parser: SettlementParser) -> Result<SweepSummary, ReconError> {
        let directory = parser.remote_config().directory;
        let listing = self.source.list(&directory).await.map_err(|error| {
            error!(feed = parser.metric_tag(), %error, "remote listing failed; sweep aborted");
            error
        })?;

        let mut summary = SweepSummary {
            files_listed: listing.len() as u64,
            ..SweepSummary::default()
        };

        let selected =
            select_files(listing, parser, Arc::clone(&self.registry), self.fan_out).await;
        summary.files_selected = selected.len() as u64;
        info!(
            feed = parser.metric_tag(),
            listed = summary.files_listed,
            selected = summary.files_selected,
            "sweep starting"
        );

        for file in selected {
            match self.process_file(parser, &directory, &file).await {
                Ok((rows_processed, rows_failed)) => {
                    summary.files_processed += 1;
                    summary.rows_processed += rows_processed;
                    summary.rows_failed += rows_failed;
                }
                Err(error) => {
                    summary.files_failed += 1;
                    error!(file = %file.name, %error, "file skipped");
                    self.metrics.increment(
                        "settlement.files.failed",
                        &[("feed", parser.metric_tag()), ("error", error.kind())],
                    );
                }
            }
        }

        info!(
            feed = parser.metric_tag(),
            files_processed = summary.files_processed,
            files_failed = summary.files_failed,
            rows_processed = summary.rows_processed,
            rows_failed = summary.rows_failed,
            "sweep finished"
        );
        Ok(summary)
    }

    /// Ingest one file end to end
    ///
    /// An `Err` here means the file never reached row processing (download
    /// or decode failed); it stays unmarked and is retried next sweep. Once
    /// rows start, every row is attempted and the file is always marked.
    async fn process_file(
        &self,
        parser: SettlementParser,
        directory: &str,
        file: &FileMeta,
    ) -> Result<(u64, u64), ReconError> {
        let started = Instant::now();
        let bytes = self.source.get(directory, &file.name).await?;
        let rows = decode_rows(&bytes, &file.name)?;

        let today = Utc::now().date_naive();
        let mut rows_attempted: u64 = 0;
        let mut rows_failed: u64 = 0;

        for (index, row) in rows.into_iter().enumerate() {
            if !parser.row_filter(&row, today) {
                continue;
            }
            rows_attempted += 1;

            let outcome = match parser.convert(&row, file) {
                Ok(event) => self.processor.process_data(event, file).await,
                Err(error) => Err(error),
            };
            if let Err(error) = outcome {
                rows_failed += 1;
                warn!(
                    file = %file.name,
                    row = index + 2,
                    %error,
                    "row failed"
                );
                self.metrics.increment(
                    "settlement.rows.failed",
                    &[
                        ("feed", parser.metric_tag()),
                        ("gateway", file.gateway.as_str()),
                        ("error", error.kind()),
                    ],
                );
            }
        }

        self.registry
            .mark_processed(&file.name, rows_attempted, started.elapsed().as_secs())
            .await?;
        self.metrics.increment(
            "settlement.files.processed",
            &[("feed", parser.metric_tag())],
        );

        Ok((rows_attempted - rows_failed, rows_failed))
    }
}
