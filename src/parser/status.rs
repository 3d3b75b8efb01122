//! Provider status-text lookup tables
//!
//! These are hand-maintained maps of the exact status strings each provider
//! emits. The text varies in casing and punctuation across files, so the
//! tables are kept as explicit constants rather than scattered conditionals,
//! and every entry is covered by a test case.

use crate::types::SettlementStatus;

/// Chargeback file action-status text → ledger status
///
/// Case-sensitive by design: both casings a provider actually emits are
/// listed as separate entries.
pub const CHARGEBACK_ACTION_STATUSES: &[(&str, SettlementStatus)] = &[
    ("Documentation received", SettlementStatus::Representment),
    ("Documentation Received", SettlementStatus::Representment),
    ("Representment - merchant paid", SettlementStatus::Completed),
    ("Representment - Merchant Paid", SettlementStatus::Completed),
    (
        "Representment - 2nd - Merchant Paid",
        SettlementStatus::Completed,
    ),
    ("Open", SettlementStatus::Chargeback),
    ("Open - Merchant debited", SettlementStatus::Chargeback),
    (
        "Open - 2nd Chargeback - Merchant Debited",
        SettlementStatus::Chargeback,
    ),
    (
        "Closed - 2nd/3rd Chargeback - Merchant Debited",
        SettlementStatus::Chargeback,
    ),
    ("Closed", SettlementStatus::Chargeback),
];

/// Map a chargeback action-status string to a ledger status
///
/// Returns `None` for text not in the table; the caller treats that as a
/// row parse failure so new provider wordings surface in logs instead of
/// being silently misfiled.
pub fn chargeback_status(action_status: &str) -> Option<SettlementStatus> {
    CHARGEBACK_ACTION_STATUSES
        .iter()
        .find(|(text, _)| *text == action_status)
        .map(|(_, status)| *status)
}

/// Map a direct-transaction status string to a ledger status
///
/// `Error` and `Unknown-Failed` cancel the settlement, `Complete` and
/// `Unknown-Posted` complete it, and anything else is still pending.
pub fn transaction_status(raw_status: &str) -> SettlementStatus {
    match raw_status {
        "Error" | "Unknown-Failed" => SettlementStatus::Canceled,
        "Complete" | "Unknown-Posted" => SettlementStatus::Completed,
        _ => SettlementStatus::Pending,
    }
}
