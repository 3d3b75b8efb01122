//! Durable settlement ledger types
//!
//! One [`SettlementLedgerEntry`] exists per external transaction id. Entries
//! are created on first sighting and mutated on every later row referencing
//! the same id; they are never deleted, and their modification audit trail
//! only ever grows.

use crate::parser::Gateway;
use crate::types::event::{RawRow, SettlementStatus, SettlementType};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of internal record a ledger entry correlates to
///
/// Resolution order on first sighting is Payment, then SubscriptionPayment,
/// then Advance. An entry with no match stays unlinked; that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Payment,
    SubscriptionPayment,
    Advance,
}

/// The subset of ledger fields a single file can change
///
/// Both sides of a [`Modification`] use this shape: `previous` holds the
/// values the changed fields had before, `new` holds what the file set them
/// to. Fields the file did not touch stay `None` on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModificationDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SettlementStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representment_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representment_end: Option<NaiveDate>,
}

impl ModificationDelta {
    /// True when the delta touches no field at all
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.representment_start.is_none()
            && self.representment_end.is_none()
    }
}

/// One append-only audit record on a ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    /// Values of the changed fields before this file was applied
    pub previous: ModificationDelta,

    /// Values the file set them to
    pub new: ModificationDelta,

    /// Name of the settlement file that caused the change
    pub file_name: String,
}

/// Durable reconciliation record for one external transaction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementLedgerEntry {
    /// Processor-assigned identifier; unique across the ledger
    pub external_id: String,

    /// Payment or Disbursement
    pub settlement_type: SettlementType,

    /// Current reconciled status
    pub status: SettlementStatus,

    /// Settled amount
    pub amount: Decimal,

    /// Date the settlement was processed by the provider
    pub processed_date: NaiveDate,

    /// Internal id of the correlated record, when one was resolved
    pub source_id: Option<i64>,

    /// Kind of the correlated record, when one was resolved
    pub source_type: Option<SourceType>,

    /// Gateway that delivered the file this entry was created from
    pub gateway: Gateway,

    /// Verbatim source row, kept for audit
    pub raw: RawRow,

    /// Date the chargeback was formally disputed, when known
    pub representment_start: Option<NaiveDate>,

    /// Date the representment concluded in the merchant's favor, when known
    pub representment_end: Option<NaiveDate>,

    /// Append-only modification audit trail; never compacted
    pub modifications: Vec<Modification>,

    /// Last time any settlement file touched this entry
    pub updated_at: DateTime<Utc>,
}

/// Dedup registry record for a fully ingested settlement file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    /// Remote file name; unique across the registry
    pub file_name: String,

    /// Rows attempted in the file, including rows that failed
    pub rows_processed: u64,

    /// Wall-clock duration of the file's ingestion
    pub processing_duration_seconds: u64,

    pub created_at: DateTime<Utc>,
}
