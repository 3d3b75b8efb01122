//! Per-processor row parser strategies
//!
//! Each processor/file-type pairing is one [`SettlementParser`] variant. A
//! variant bundles everything the sweep needs to handle its files: which
//! remote directory to look in, which file names are valid, which rows are
//! applicable, and how a raw row becomes a normalized [`SettlementEvent`].
//!
//! The variants are plain tagged values selected by configuration; there is
//! no inheritance and no per-variant state.

use crate::types::{RawRow, ReconError, SettlementEvent};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod convert;
pub mod filename;
pub mod status;

use convert::{
    convert_chargeback_row, convert_transaction_row, parse_amount, parse_row_date,
    COL_AMOUNT, COL_CASE_STATUS, COL_EXCEPTION_DATE, COL_EXCEPTION_TYPE,
};

/// Chargeback exceptions older than this are left for manual review.
const EXCEPTION_MAX_AGE_DAYS: u64 = 45;

/// Flat subscription charge amount; excluded from transaction reconciliation
/// because subscription billing settles through its own pipeline.
const SUBSCRIPTION_CHARGE: Decimal = Decimal::from_parts(100, 0, 0, false, 2);

/// Processor/gateway identity tag, used for ledger entries and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gateway {
    /// Legacy gateway (the `1000_400001_` file prefix)
    GatewayA,
    /// Direct gateway (the `4002_` file prefix)
    GatewayB,
    /// Risepay legacy archive feed
    Risepay,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::GatewayA => "gateway-a",
            Gateway::GatewayB => "gateway-b",
            Gateway::Risepay => "risepay",
        }
    }
}

/// Opaque remote-connection descriptor for one settlement feed
///
/// The core only ever hands this to the file source; nothing in the engine
/// interprets it. Values come from the environment with per-feed defaults so
/// a deployment can point feeds at different hosts without code changes.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub directory: String,
}

impl RemoteConfig {
    fn from_env(prefix: &str, directory: &str) -> Self {
        let var = |suffix: &str, default: &str| {
            std::env::var(format!("RECON_{}_{}", prefix, suffix))
                .unwrap_or_else(|_| default.to_string())
        };
        RemoteConfig {
            host: var("HOST", "sftp.settlement.internal"),
            port: var("PORT", "22").parse().unwrap_or(22),
            username: var("USER", "settlement"),
            directory: var("DIR", directory),
        }
    }
}

/// Metadata for one settlement file moving through the sweep
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    /// Remote file name, including the embedded `_YYYYMMDD_` batch date
    pub name: String,

    /// Gateway the file came through
    pub gateway: Gateway,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, gateway: Gateway) -> Self {
        FileMeta {
            name: name.into(),
            gateway,
        }
    }

    /// Batch date embedded in the file name, when present
    pub fn batch_date(&self) -> Option<NaiveDate> {
        filename::embedded_date(&self.name)
    }
}

/// One settlement feed's parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementParser {
    /// Chargeback exceptions delivered through the legacy gateway-A prefix
    LegacyChargebacks,
    /// Chargeback exceptions delivered directly by gateway B
    Chargebacks,
    /// Direct transaction settlements, both gateway prefixes
    Transactions,
    /// Risepay daily archive; stored for audit, never reconciled
    Risepay,
}

impl SettlementParser {
    /// Every configured feed, in sweep order
    pub fn all() -> [SettlementParser; 4] {
        [
            SettlementParser::LegacyChargebacks,
            SettlementParser::Chargebacks,
            SettlementParser::Transactions,
            SettlementParser::Risepay,
        ]
    }

    /// Gateway tag recorded on ledger entries created from this feed
    ///
    /// Transaction files carry both prefixes, so their gateway is derived
    /// from the concrete file name at conversion time; this is the feed-level
    /// default used for metrics and listing.
    pub fn gateway(&self) -> Gateway {
        match self {
            SettlementParser::LegacyChargebacks => Gateway::GatewayA,
            SettlementParser::Chargebacks | SettlementParser::Transactions => Gateway::GatewayB,
            SettlementParser::Risepay => Gateway::Risepay,
        }
    }

    /// Gateway tag for a concrete file accepted by this feed
    pub fn gateway_for(&self, file_name: &str) -> Gateway {
        match self {
            SettlementParser::Transactions if filename::is_gateway_a(file_name) => {
                Gateway::GatewayA
            }
            _ => self.gateway(),
        }
    }

    /// Tag used on processed-file metrics for this feed
    pub fn metric_tag(&self) -> &'static str {
        match self {
            SettlementParser::LegacyChargebacks => "legacy-chargebacks",
            SettlementParser::Chargebacks => "chargebacks",
            SettlementParser::Transactions => "transactions",
            SettlementParser::Risepay => "risepay",
        }
    }

    /// Whether rows from this feed are reconciled into the ledger
    pub fn save_to_database(&self) -> bool {
        !matches!(self, SettlementParser::Risepay)
    }

    /// Whether raw files from this feed are archived after ingestion
    pub fn save_to_archive(&self) -> bool {
        true
    }

    /// Remote-connection descriptor for this feed
    pub fn remote_config(&self) -> RemoteConfig {
        match self {
            SettlementParser::LegacyChargebacks => {
                RemoteConfig::from_env("LEGACY_CHARGEBACKS", "outbox/chargebacks-legacy")
            }
            SettlementParser::Chargebacks => {
                RemoteConfig::from_env("CHARGEBACKS", "outbox/chargebacks")
            }
            SettlementParser::Transactions => {
                RemoteConfig::from_env("TRANSACTIONS", "outbox/transactions")
            }
            SettlementParser::Risepay => RemoteConfig::from_env("RISEPAY", "outbox/risepay"),
        }
    }

    /// Filename validity predicate for this feed; bit-exact, see [`filename`]
    pub fn file_filter(&self, name: &str) -> bool {
        match self {
            SettlementParser::LegacyChargebacks => filename::is_legacy_chargebacks(name),
            SettlementParser::Chargebacks => filename::is_chargebacks(name),
            SettlementParser::Transactions => filename::is_transactions(name),
            SettlementParser::Risepay => filename::is_risepay(name),
        }
    }

    /// Row applicability predicate, evaluated before conversion
    ///
    /// Chargeback sweeps only reconcile open chargeback exceptions from the
    /// last 45 days; transaction sweeps skip flat subscription charges.
    pub fn row_filter(&self, row: &RawRow, today: NaiveDate) -> bool {
        match self {
            SettlementParser::LegacyChargebacks | SettlementParser::Chargebacks => {
                chargeback_row_applies(row, today)
            }
            SettlementParser::Transactions => !is_subscription_charge(row),
            SettlementParser::Risepay => true,
        }
    }

    /// Convert a raw row into a normalized event
    ///
    /// `Ok(None)` means archive-only: the row is kept in the raw file copy
    /// but never reaches the reconciliation processor.
    pub fn convert(
        &self,
        row: &RawRow,
        file: &FileMeta,
    ) -> Result<Option<SettlementEvent>, ReconError> {
        match self {
            SettlementParser::LegacyChargebacks | SettlementParser::Chargebacks => {
                convert_chargeback_row(row, &file.name).map(Some)
            }
            SettlementParser::Transactions => {
                convert_transaction_row(row, &file.name).map(Some)
            }
            SettlementParser::Risepay => Ok(None),
        }
    }
}

fn column_matches(row: &RawRow, column: &str, expected: &str) -> bool {
    row.get(column)
        .map(|v| v.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Open chargeback exceptions from the last 45 days are reconciled; older or
/// closed cases are left for manual review. Rows without an exception date
/// pass through so the converter can report what is actually wrong with them.
fn chargeback_row_applies(row: &RawRow, today: NaiveDate) -> bool {
    if !column_matches(row, COL_EXCEPTION_TYPE, "chargeback") {
        return false;
    }
    if !column_matches(row, COL_CASE_STATUS, "open") {
        return false;
    }
    match row.get(COL_EXCEPTION_DATE).and_then(|v| parse_row_date(v)) {
        Some(exception_date) => {
            let cutoff = today - Days::new(EXCEPTION_MAX_AGE_DAYS);
            exception_date >= cutoff
        }
        None => true,
    }
}

/// Flat subscription charges settle through their own pipeline.
fn is_subscription_charge(row: &RawRow) -> bool {
    row.get(COL_AMOUNT)
        .and_then(|v| parse_amount(v, "").ok())
        .map(|amount| amount == SUBSCRIPTION_CHARGE)
        .unwrap_or(false)
}
