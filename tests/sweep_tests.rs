//! End-to-end sweep tests
//!
//! Each test lays out CSV settlement files in a temporary feed directory
//! tree, runs a sweep over it with in-memory backends, and asserts on the
//! resulting ledger entries, domain records, published updates, and
//! processed-file registry.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use settlement_recon::core::{FileSweep, ReconciliationProcessor, SweepSummary};
use settlement_recon::parser::SettlementParser;
use settlement_recon::ports::local::LocalDirSource;
use settlement_recon::ports::memory::{
    MemoryDomain, MemoryLedger, MemoryMetrics, MemoryPublisher, MemoryRegistry,
};
use settlement_recon::ports::{
    DomainStore, EventPublisher, FileSource, LedgerStore, ProcessedFileRegistry, ReconMetrics,
};
use settlement_recon::types::{
    Advance, Payment, SettlementStatus, SettlementType, SourceType, UpdateOperation,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CHARGEBACK_HEADERS: &str = "Original Transaction ID,Action Status,Status,Exception Type,Amount,Original Creation Date,Status Date,First Name,Last Name,Last 4";
const TRANSACTION_HEADERS: &str = "Transaction ID,Status,Type,Amount,Created At,Approval Code,Network,Network ID,First Name,Last Name,Last 4";

/// Feed directory tree plus the full in-memory backend wiring
struct Harness {
    root: TempDir,
    ledger: Arc<MemoryLedger>,
    domain: Arc<MemoryDomain>,
    registry: Arc<MemoryRegistry>,
    publisher: Arc<MemoryPublisher>,
    metrics: Arc<MemoryMetrics>,
    sweep: FileSweep,
}

impl Harness {
    fn new() -> Self {
        let root = TempDir::new().expect("temp root");
        let ledger = Arc::new(MemoryLedger::new());
        let domain = Arc::new(MemoryDomain::new());
        let registry = Arc::new(MemoryRegistry::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let metrics = Arc::new(MemoryMetrics::new());

        let processor = ReconciliationProcessor::new(
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            Arc::clone(&domain) as Arc<dyn DomainStore>,
            Arc::clone(&publisher) as Arc<dyn EventPublisher>,
            Arc::clone(&metrics) as Arc<dyn ReconMetrics>,
        );
        let sweep = FileSweep::new(
            Arc::new(LocalDirSource::new(root.path())) as Arc<dyn FileSource>,
            Arc::clone(&registry) as Arc<dyn ProcessedFileRegistry>,
            processor,
            Arc::clone(&metrics) as Arc<dyn ReconMetrics>,
            4,
        );

        Harness {
            root,
            ledger,
            domain,
            registry,
            publisher,
            metrics,
            sweep,
        }
    }

    /// Write one settlement file into a feed's configured directory
    fn write_file(&self, parser: SettlementParser, name: &str, rows: &[&str]) {
        let dir = self.root.path().join(parser.remote_config().directory);
        fs::create_dir_all(&dir).expect("feed directory");

        let headers = match parser {
            SettlementParser::LegacyChargebacks | SettlementParser::Chargebacks => {
                CHARGEBACK_HEADERS
            }
            SettlementParser::Transactions => TRANSACTION_HEADERS,
            SettlementParser::Risepay => "Id,Amount",
        };
        let mut content = String::from(headers);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        fs::write(dir.join(name), content).expect("write settlement file");
    }

    async fn run(&self, parser: SettlementParser) -> SweepSummary {
        self.sweep.run(parser).await.expect("sweep")
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn payment(id: i64, external_id: &str, advance_id: Option<i64>) -> Payment {
    Payment {
        id,
        external_id: external_id.to_string(),
        advance_id,
        amount: Decimal::new(5574, 2),
        status: SettlementStatus::Completed,
        updated_at: Utc::now(),
    }
}

fn advance(id: i64, external_id: &str) -> Advance {
    Advance {
        id,
        external_id: external_id.to_string(),
        disbursement_status: SettlementStatus::Pending,
        approval_code: None,
        network: None,
        network_id: None,
        outstanding: Decimal::ZERO,
        updated_at: Utc::now(),
    }
}

// File names dated far in the future so the staleness guard never trips
// except where a test exercises it on purpose.
const RECENT_CHARGEBACKS: &str = "4002_20990101_chargebacks.csv";
const RECENT_TRANSACTIONS: &str = "4002_20990101_transactions_v1-0.csv";

#[tokio::test]
async fn test_open_chargeback_becomes_representment_entry() {
    let h = Harness::new();
    h.domain.insert_payment(payment(41, "foo-bop", None));
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &["foo-bop,Documentation received,Open,Chargeback,55.74,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.rows_processed, 1);
    assert_eq!(summary.rows_failed, 0);

    let entry = h.ledger.entry("foo-bop").expect("ledger entry created");
    assert_eq!(entry.status, SettlementStatus::Representment);
    assert_eq!(entry.settlement_type, SettlementType::Payment);
    assert_eq!(entry.amount, Decimal::new(5574, 2));
    assert_eq!(entry.representment_start, Some(date(2018, 7, 23)));
    assert_eq!(entry.representment_end, None);
    assert_eq!(entry.source_type, Some(SourceType::Payment));
    assert_eq!(entry.source_id, Some(41));
    assert!(entry.modifications.is_empty());

    let published = h.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].operation, UpdateOperation::Create);
    assert_eq!(published[0].external_id, "foo-bop");

    assert_eq!(
        h.domain.payment(41).unwrap().status,
        SettlementStatus::Representment
    );
}

#[tokio::test]
async fn test_completed_disbursement_updates_advance() {
    let h = Harness::new();
    h.domain.insert_advance(advance(9, "adv-7"));
    h.write_file(
        SettlementParser::Transactions,
        RECENT_TRANSACTIONS,
        &["adv-7,Complete,disbursement,75.00,10/15/2019,A1B2C3,VisaFF,net-991,Sam,Okafor,1881"],
    );

    let summary = h.run(SettlementParser::Transactions).await;
    assert_eq!(summary.rows_processed, 1);

    let entry = h.ledger.entry("adv-7").expect("ledger entry created");
    assert_eq!(entry.status, SettlementStatus::Completed);
    assert_eq!(entry.settlement_type, SettlementType::Disbursement);
    assert_eq!(entry.source_type, Some(SourceType::Advance));

    let advance = h.domain.advance(9).unwrap();
    assert_eq!(advance.disbursement_status, SettlementStatus::Completed);
    assert_eq!(advance.approval_code.as_deref(), Some("A1B2C3"));
    assert_eq!(advance.network.as_deref(), Some("VisaFF"));
    assert_eq!(advance.network_id.as_deref(), Some("net-991"));
}

#[tokio::test]
async fn test_status_change_records_one_modification() {
    let h = Harness::new();
    h.domain.insert_payment(payment(5, "tester-1", None));
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20990101_chargebacks.csv",
        &["tester-1,Representment - merchant paid,Open,Chargeback,20.00,5/31/2018,7/23/2018,Ana,Reyes,9001"],
    );
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20990102_chargebacks.csv",
        &["tester-1,Open,Open,Chargeback,20.00,5/31/2018,8/01/2018,Ana,Reyes,9001"],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.files_processed, 2);

    let entry = h.ledger.entry("tester-1").unwrap();
    assert_eq!(entry.status, SettlementStatus::Chargeback);
    assert_eq!(entry.modifications.len(), 1);
    assert_eq!(
        entry.modifications[0].previous.status,
        Some(SettlementStatus::Completed)
    );
    assert_eq!(
        entry.modifications[0].new.status,
        Some(SettlementStatus::Chargeback)
    );
    assert_eq!(
        entry.modifications[0].file_name,
        "4002_20990102_chargebacks.csv"
    );

    let operations: Vec<_> = h
        .publisher
        .published()
        .iter()
        .map(|u| u.operation)
        .collect();
    assert_eq!(
        operations,
        vec![UpdateOperation::Create, UpdateOperation::Update]
    );
}

#[tokio::test]
async fn test_resent_row_with_same_dates_changes_nothing() {
    let h = Harness::new();
    let row =
        "tester-1,Representment - merchant paid,Open,Chargeback,20.00,5/31/2018,7/23/2018,Ana,Reyes,9001";
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20990101_chargebacks.csv",
        &[row],
    );
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20990102_chargebacks.csv",
        &[row],
    );

    h.run(SettlementParser::Chargebacks).await;

    let entry = h.ledger.entry("tester-1").unwrap();
    assert_eq!(entry.status, SettlementStatus::Completed);
    assert_eq!(entry.representment_end, Some(date(2018, 7, 23)));
    assert!(entry.modifications.is_empty());

    // Both sightings still published
    assert_eq!(h.publisher.published().len(), 2);
}

#[tokio::test]
async fn test_processed_files_are_not_selected_again() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &["foo-bop,Open,Open,Chargeback,55.74,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );

    let first = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(first.files_selected, 1);
    assert_eq!(first.files_processed, 1);

    let second = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(second.files_listed, 1);
    assert_eq!(second.files_selected, 0);
    assert_eq!(second.files_processed, 0);

    assert_eq!(h.publisher.published().len(), 1);
    let record = h.registry.record(RECENT_CHARGEBACKS).unwrap();
    assert_eq!(record.rows_processed, 1);
}

#[tokio::test]
async fn test_stale_file_creates_ledger_entry_without_touching_payment() {
    let h = Harness::new();
    h.domain.insert_payment(payment(41, "foo-bop", None));

    // Valid per the filename rules, but dated before the payment's last
    // update, so status propagation is suppressed.
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20191101_chargebacks.csv",
        &["foo-bop,Open,Open,Chargeback,55.74,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.rows_processed, 1);

    let entry = h.ledger.entry("foo-bop").unwrap();
    assert_eq!(entry.status, SettlementStatus::Chargeback);
    assert_eq!(entry.source_id, Some(41));

    assert_eq!(
        h.domain.payment(41).unwrap().status,
        SettlementStatus::Completed
    );
}

#[tokio::test]
async fn test_reversed_payment_restores_advance_outstanding() {
    let h = Harness::new();
    h.domain.insert_payment(payment(41, "foo-bop", Some(300)));
    h.domain.insert_advance(advance(300, "unrelated-ext"));
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &["foo-bop,Open,Open,Chargeback,55.74,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );

    h.run(SettlementParser::Chargebacks).await;

    assert_eq!(
        h.domain.advance(300).unwrap().outstanding,
        Decimal::new(5574, 2)
    );
}

#[tokio::test]
async fn test_subscription_charges_are_filtered_out() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Transactions,
        RECENT_TRANSACTIONS,
        &[
            "sub-1,Complete,payment,1.00,10/15/2019,,,,Ana,Reyes,9001",
            "pay-1,Complete,payment,75.00,10/15/2019,,,,Ana,Reyes,9001",
        ],
    );

    let summary = h.run(SettlementParser::Transactions).await;
    assert_eq!(summary.rows_processed, 1);
    assert_eq!(summary.rows_failed, 0);

    assert!(h.ledger.entry("sub-1").is_none());
    assert!(h.ledger.entry("pay-1").is_some());

    // The file is still fully ingested and recorded.
    let record = h.registry.record(RECENT_TRANSACTIONS).unwrap();
    assert_eq!(record.rows_processed, 1);
}

#[tokio::test]
async fn test_closed_or_aged_chargeback_rows_are_skipped() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &[
            "a-1,Open,Closed,Chargeback,10.00,5/31/2018,7/23/2018,Jess,Fraser,4242",
            "a-2,Open,Open,Retrieval,10.00,5/31/2018,7/23/2018,Jess,Fraser,4242",
        ],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.rows_processed, 0);
    assert!(h.ledger.is_empty());
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn test_risepay_files_are_archived_not_reconciled() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Risepay,
        "DaveDailyTransactions20200101.csv",
        &["r-1,10.00", "r-2,20.00"],
    );

    let summary = h.run(SettlementParser::Risepay).await;
    assert_eq!(summary.files_processed, 1);

    assert!(h.ledger.is_empty());
    assert!(h.publisher.published().is_empty());
    assert!(h
        .registry
        .record("DaveDailyTransactions20200101.csv")
        .is_some());
}

#[tokio::test]
async fn test_bad_row_does_not_block_the_rest_of_the_file() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &[
            "bad-1,Totally new wording,Open,Chargeback,10.00,5/31/2018,7/23/2018,Jess,Fraser,4242",
            "good-1,Open,Open,Chargeback,10.00,5/31/2018,7/23/2018,Jess,Fraser,4242",
        ],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.rows_processed, 1);
    assert_eq!(summary.rows_failed, 1);

    assert!(h.ledger.entry("bad-1").is_none());
    assert!(h.ledger.entry("good-1").is_some());
    assert_eq!(
        h.metrics.count(
            "settlement.rows.failed",
            &[
                ("feed", "chargebacks"),
                ("gateway", "gateway-b"),
                ("error", "row_parse")
            ]
        ),
        1
    );

    // Every row was attempted, so the file is marked processed.
    let record = h.registry.record(RECENT_CHARGEBACKS).unwrap();
    assert_eq!(record.rows_processed, 2);
}

#[tokio::test]
async fn test_files_outside_the_feed_rules_are_ignored() {
    let h = Harness::new();
    // On the delivery cutoff date, and therefore excluded.
    h.write_file(
        SettlementParser::Chargebacks,
        "4002_20191022_chargebacks.csv",
        &["foo-bop,Open,Open,Chargeback,55.74,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );
    h.write_file(SettlementParser::Chargebacks, "notes.txt", &["hello"]);

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.files_listed, 2);
    assert_eq!(summary.files_selected, 0);
    assert!(h.ledger.is_empty());
}

#[tokio::test]
async fn test_missing_feed_directory_aborts_the_sweep() {
    let h = Harness::new();
    let result = h.sweep.run(SettlementParser::Chargebacks).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unmatched_external_id_creates_unlinked_entry() {
    let h = Harness::new();
    h.write_file(
        SettlementParser::Chargebacks,
        RECENT_CHARGEBACKS,
        &["ghost-1,Open,Open,Chargeback,12.00,5/31/2018,7/23/2018,Jess,Fraser,4242"],
    );

    let summary = h.run(SettlementParser::Chargebacks).await;
    assert_eq!(summary.rows_processed, 1);
    assert_eq!(summary.rows_failed, 0);

    let entry = h.ledger.entry("ghost-1").unwrap();
    assert_eq!(entry.source_type, None);
    assert_eq!(entry.source_id, None);
    assert_eq!(h.publisher.published().len(), 1);
}
