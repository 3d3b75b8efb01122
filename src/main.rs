//! Settlement Reconciliation CLI
//!
//! Sweeps the configured settlement feeds once and exits.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- /srv/settlement
//! cargo run -- --feed chargebacks /srv/settlement
//! cargo run -- --feed all --fan-out 8 /srv/settlement
//! ```
//!
//! The root directory is expected to contain one subdirectory per feed (the
//! feed's configured remote directory path). Each sweep lists the feed's
//! directory, skips files already recorded in the processed-file registry,
//! and reconciles the remaining files row by row. Settlement updates are
//! written to the structured log.
//!
//! # Exit Codes
//!
//! - 0: Every selected feed swept, all files and rows processed
//! - 1: A sweep aborted, or some files/rows failed

use settlement_recon::cli;
use settlement_recon::core::{FileSweep, ReconciliationProcessor, SweepSummary};
use settlement_recon::ports::local::{LocalDirSource, LogMetrics, LogPublisher};
use settlement_recon::ports::memory::{MemoryDomain, MemoryLedger, MemoryRegistry};
use settlement_recon::ports::{
    DomainStore, EventPublisher, FileSource, LedgerStore, ProcessedFileRegistry, ReconMetrics,
};
use std::process;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = cli::parse_args();

    let source: Arc<dyn FileSource> = Arc::new(LocalDirSource::new(&args.root));
    let ledger: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
    let domain: Arc<dyn DomainStore> = Arc::new(MemoryDomain::new());
    let registry: Arc<dyn ProcessedFileRegistry> = Arc::new(MemoryRegistry::new());
    let publisher: Arc<dyn EventPublisher> = Arc::new(LogPublisher);
    let metrics: Arc<dyn ReconMetrics> = Arc::new(LogMetrics);

    let processor = ReconciliationProcessor::new(
        ledger,
        domain,
        Arc::clone(&publisher),
        Arc::clone(&metrics),
    );
    let sweep = FileSweep::new(source, registry, processor, metrics, args.fan_out);

    let mut total = SweepSummary::default();
    let mut aborted = false;
    for feed in args.feeds() {
        match sweep.run(feed).await {
            Ok(summary) => {
                total.files_listed += summary.files_listed;
                total.files_selected += summary.files_selected;
                total.files_processed += summary.files_processed;
                total.files_failed += summary.files_failed;
                total.rows_processed += summary.rows_processed;
                total.rows_failed += summary.rows_failed;
            }
            Err(e) => {
                error!(feed = feed.metric_tag(), error = %e, "sweep aborted");
                aborted = true;
            }
        }
    }

    println!(
        "files: {} listed, {} selected, {} processed, {} failed; rows: {} processed, {} failed",
        total.files_listed,
        total.files_selected,
        total.files_processed,
        total.files_failed,
        total.rows_processed,
        total.rows_failed
    );

    if aborted || total.files_failed > 0 || total.rows_failed > 0 {
        process::exit(1);
    }
}
