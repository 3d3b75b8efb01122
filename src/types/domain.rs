//! Correlated domain records
//!
//! These records are owned elsewhere in the system; reconciliation only reads
//! them for correlation and mutates the specific fields listed in each doc
//! comment. Everything else on the real records is out of scope here.

use crate::types::event::SettlementStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer payment collected against an advance
///
/// Reconciliation mutates only `status`. `advance_id` links the payment to
/// the advance it pays down, so a reversed payment can put the amount back
/// on the advance's outstanding balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub external_id: String,
    pub advance_id: Option<i64>,
    pub amount: Decimal,
    pub status: SettlementStatus,
    pub updated_at: DateTime<Utc>,
}

/// A recurring subscription charge
///
/// Correlation target only; reconciliation never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPayment {
    pub id: i64,
    pub external_id: String,
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// A cash advance disbursed to a customer
///
/// Reconciliation mutates `disbursement_status`, the network backfill fields
/// (`approval_code`, `network`, `network_id`), and `outstanding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    pub id: i64,
    pub external_id: String,
    pub disbursement_status: SettlementStatus,
    pub approval_code: Option<String>,
    pub network: Option<String>,
    pub network_id: Option<String>,
    /// Amount the customer still owes on this advance
    pub outstanding: Decimal,
    pub updated_at: DateTime<Utc>,
}
