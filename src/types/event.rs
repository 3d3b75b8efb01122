//! Normalized settlement event types
//!
//! A [`SettlementEvent`] is the transient, processor-independent shape that
//! every row parser converts its raw CSV rows into. The reconciliation
//! processor only ever sees this normalized form, never provider-specific
//! column layouts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw CSV row as decoded by the tolerant reader: column name → value.
///
/// BTreeMap keeps the audit serialization of a row stable across runs.
pub type RawRow = BTreeMap<String, String>;

/// Ledger status of a settlement, shared with correlated domain records
///
/// `Payment.status` and `Advance.disbursement_status` use the same enum, so
/// status propagation is a straight copy rather than a second mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementStatus {
    /// Reported but not yet cleared or failed
    Pending,

    /// Reversed by the cardholder's bank; the merchant is owed a response
    Chargeback,

    /// The merchant has formally disputed the chargeback
    Representment,

    /// Cleared, or a representment the merchant won
    Completed,

    /// Failed or voided before clearing
    Canceled,

    /// The processor reported an error state for the transaction
    Error,
}

/// Which side of the money flow a settlement row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementType {
    /// A collection from the customer (correlates to Payment/SubscriptionPayment)
    Payment,

    /// A payout to the customer (correlates to Advance)
    Disbursement,
}

/// Normalized settlement event produced by a row parser
///
/// The `raw` field carries the verbatim source row so the ledger entry can
/// keep a full audit copy regardless of which columns the parser used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEvent {
    /// Processor-assigned identifier correlating the row to internal records
    pub external_id: String,

    /// Ledger status already mapped from the provider's status text
    pub status: SettlementStatus,

    /// Date the provider reported the current status (chargeback files only)
    pub status_date: Option<NaiveDate>,

    /// Date the chargeback exception was opened (chargeback files only)
    pub chargeback_date: Option<NaiveDate>,

    /// Date the original transaction was created
    pub original_date: NaiveDate,

    /// Settled amount with exact decimal precision
    pub amount: Decimal,

    /// Payment or Disbursement
    pub settlement_type: SettlementType,

    /// Customer name as reported by the processor
    pub full_name: String,

    /// Last four digits of the card used
    pub last_four: String,

    /// Network approval code (direct-transaction files only)
    pub approval_code: Option<String>,

    /// Card network name (direct-transaction files only)
    pub network: Option<String>,

    /// Network-assigned transaction identifier (direct-transaction files only)
    pub network_id: Option<String>,

    /// Verbatim source row, preserved for the ledger audit copy
    pub raw: RawRow,
}

/// Whether a downstream update describes a new or an existing ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOperation {
    Create,
    Update,
}

/// Settlement update published downstream after each reconciled row
///
/// Publication is fire-and-forget: a failed publish is logged and never fails
/// the row that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementUpdate {
    pub external_id: String,
    pub status: SettlementStatus,
    pub settlement_type: SettlementType,
    pub original_date: NaiveDate,
    pub amount: Decimal,
    pub full_name: String,
    pub last_four: String,
    pub approval_code: Option<String>,
    pub network: Option<String>,
    pub network_id: Option<String>,
    pub operation: UpdateOperation,
}

impl SettlementUpdate {
    /// Build the downstream update for an event that was just reconciled
    pub fn from_event(event: &SettlementEvent, operation: UpdateOperation) -> Self {
        SettlementUpdate {
            external_id: event.external_id.clone(),
            status: event.status,
            settlement_type: event.settlement_type,
            original_date: event.original_date,
            amount: event.amount,
            full_name: event.full_name.clone(),
            last_four: event.last_four.clone(),
            approval_code: event.approval_code.clone(),
            network: event.network.clone(),
            network_id: event.network_id.clone(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> SettlementEvent {
        SettlementEvent {
            external_id: "ext-1".to_string(),
            status: SettlementStatus::Completed,
            status_date: None,
            chargeback_date: None,
            original_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            amount: Decimal::new(5574, 2),
            settlement_type: SettlementType::Payment,
            full_name: "Jess Fraser".to_string(),
            last_four: "4242".to_string(),
            approval_code: None,
            network: None,
            network_id: None,
            raw: RawRow::new(),
        }
    }

    #[test]
    fn test_update_copies_event_fields() {
        let event = sample_event();
        let update = SettlementUpdate::from_event(&event, UpdateOperation::Create);

        assert_eq!(update.external_id, "ext-1");
        assert_eq!(update.status, SettlementStatus::Completed);
        assert_eq!(update.amount, Decimal::new(5574, 2));
        assert_eq!(update.operation, UpdateOperation::Create);
    }

    #[test]
    fn test_update_operation_serializes_lowercase() {
        let update = SettlementUpdate::from_event(&sample_event(), UpdateOperation::Update);
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"operation\":\"update\""));
    }
}
