//! Settlement filename predicates
//!
//! Remote settlement files carry their batch date as an 8-digit `_YYYYMMDD_`
//! token. Downstream correctness depends on these rules being bit-exact:
//!
//! | File | Pattern | Cutoff |
//! |---|---|---|
//! | Legacy chargebacks (gateway A) | `1000_400001_{date}_chargebacks*` | always valid |
//! | Chargebacks (gateway B) | `4002_{date}_chargebacks*` | date > 2019-10-22 |
//! | Transactions (gateway B) | `4002_{date}_transactions_v{n}-{n}.csv` | date > 2019-10-08 |
//! | Transactions (gateway A) | `1000_400001_{date}_transactions_v{n}-{n}.csv` | date > 2019-10-08 |
//! | Risepay | contains `DaveDailyTransactions` | always valid |
//!
//! Cutoffs are strict: a file dated exactly on the cutoff is excluded.

use chrono::NaiveDate;

const GATEWAY_A_PREFIX: &str = "1000_400001_";
const GATEWAY_B_PREFIX: &str = "4002_";
const RISEPAY_TOKEN: &str = "DaveDailyTransactions";

/// Gateway-B chargeback files are only delivered correctly after this date.
fn chargebacks_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 10, 22).expect("valid cutoff date")
}

/// Direct-transaction files are only delivered correctly after this date.
fn transactions_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 10, 8).expect("valid cutoff date")
}

/// Extract the embedded `YYYYMMDD` batch date from a settlement file name
///
/// Scans underscore-separated segments for the first 8-digit token that
/// parses as a calendar date. Returns `None` for names without one (for
/// example Risepay archive files).
pub fn embedded_date(name: &str) -> Option<NaiveDate> {
    name.split('_')
        .filter(|seg| seg.len() == 8 && seg.bytes().all(|b| b.is_ascii_digit()))
        .find_map(|seg| NaiveDate::parse_from_str(seg, "%Y%m%d").ok())
}

/// Split `{date}{rest}` where the name starts with an 8-digit date token.
fn split_date(rest: &str) -> Option<(NaiveDate, &str)> {
    if rest.len() < 8 || !rest.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let date = NaiveDate::parse_from_str(&rest[..8], "%Y%m%d").ok()?;
    Some((date, &rest[8..]))
}

/// `_transactions_v{n}-{n}.csv` suffix, both version numbers non-empty digits.
fn is_transactions_suffix(rest: &str) -> bool {
    let Some(version) = rest.strip_prefix("_transactions_v") else {
        return false;
    };
    let Some((major, minor)) = version.split_once('-') else {
        return false;
    };
    let Some(minor) = minor.strip_suffix(".csv") else {
        return false;
    };
    !major.is_empty()
        && !minor.is_empty()
        && major.bytes().all(|b| b.is_ascii_digit())
        && minor.bytes().all(|b| b.is_ascii_digit())
}

/// Legacy chargeback files delivered through gateway A; no date cutoff.
pub fn is_legacy_chargebacks(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(GATEWAY_A_PREFIX) else {
        return false;
    };
    match split_date(rest) {
        Some((_, rest)) => rest.starts_with("_chargebacks"),
        None => false,
    }
}

/// Gateway-B chargeback files; valid only strictly after 2019-10-22.
pub fn is_chargebacks(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(GATEWAY_B_PREFIX) else {
        return false;
    };
    match split_date(rest) {
        Some((date, rest)) => rest.starts_with("_chargebacks") && date > chargebacks_cutoff(),
        None => false,
    }
}

/// Direct-transaction files from either gateway; valid only strictly after
/// 2019-10-08.
pub fn is_transactions(name: &str) -> bool {
    let rest = name
        .strip_prefix(GATEWAY_A_PREFIX)
        .or_else(|| name.strip_prefix(GATEWAY_B_PREFIX));
    let Some(rest) = rest else {
        return false;
    };
    match split_date(rest) {
        Some((date, rest)) => is_transactions_suffix(rest) && date > transactions_cutoff(),
        None => false,
    }
}

/// Risepay daily archive files; always valid, never reconciled.
pub fn is_risepay(name: &str) -> bool {
    name.contains(RISEPAY_TOKEN)
}

/// True when the file name came through the legacy gateway-A prefix.
pub fn is_gateway_a(name: &str) -> bool {
    name.starts_with(GATEWAY_A_PREFIX)
}
