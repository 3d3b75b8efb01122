//! Raw row → normalized event conversion
//!
//! Each file shape has its own converter. Converters are strict about the
//! fields reconciliation depends on (external id, status, amount, original
//! date) and lenient about everything else: optional columns that are absent
//! or blank simply stay `None` on the event.

use crate::parser::status::{chargeback_status, transaction_status};
use crate::types::{RawRow, ReconError, SettlementEvent, SettlementStatus, SettlementType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

// Chargeback file columns
pub const COL_ORIGINAL_TRANSACTION_ID: &str = "Original Transaction ID";
pub const COL_ACTION_STATUS: &str = "Action Status";
pub const COL_CASE_STATUS: &str = "Status";
pub const COL_EXCEPTION_TYPE: &str = "Exception Type";
pub const COL_EXCEPTION_DATE: &str = "Exception Date";
pub const COL_STATUS_DATE: &str = "Status Date";
pub const COL_ORIGINAL_CREATION_DATE: &str = "Original Creation Date";

// Direct-transaction file columns
pub const COL_TRANSACTION_ID: &str = "Transaction ID";
pub const COL_TRANSACTION_STATUS: &str = "Status";
pub const COL_TRANSACTION_TYPE: &str = "Type";
pub const COL_CREATED_AT: &str = "Created At";
pub const COL_APPROVAL_CODE: &str = "Approval Code";
pub const COL_NETWORK: &str = "Network";
pub const COL_NETWORK_ID: &str = "Network ID";

// Shared columns
pub const COL_AMOUNT: &str = "Amount";
pub const COL_FIRST_NAME: &str = "First Name";
pub const COL_LAST_NAME: &str = "Last Name";
pub const COL_LAST_FOUR: &str = "Last 4";

/// Non-empty value of a column, when present.
fn field<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column).map(String::as_str).filter(|v| !v.is_empty())
}

fn required<'a>(row: &'a RawRow, column: &str, file: &str) -> Result<&'a str, ReconError> {
    field(row, column).ok_or_else(|| ReconError::row_parse(file, format!("missing '{}'", column)))
}

/// Parse a row date in either provider format (`5/31/2018` or `2018-05-31`).
pub fn parse_row_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

fn required_date(row: &RawRow, column: &str, file: &str) -> Result<NaiveDate, ReconError> {
    let value = required(row, column, file)?;
    parse_row_date(value)
        .ok_or_else(|| ReconError::row_parse(file, format!("invalid date '{}' in '{}'", value, column)))
}

fn optional_date(row: &RawRow, column: &str) -> Option<NaiveDate> {
    field(row, column).and_then(parse_row_date)
}

/// Parse a provider amount string, tolerating `$` and thousands separators.
pub fn parse_amount(value: &str, file: &str) -> Result<Decimal, ReconError> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    Decimal::from_str(cleaned.trim())
        .map_err(|e| ReconError::row_parse(file, format!("invalid amount '{}': {}", value, e)))
}

fn full_name(row: &RawRow) -> String {
    let first = field(row, COL_FIRST_NAME).unwrap_or_default();
    let last = field(row, COL_LAST_NAME).unwrap_or_default();
    [first, last]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a chargeback exception row into a normalized event
///
/// The action-status text drives the ledger status via the constant table;
/// text outside the table is a parse failure so new provider wordings are
/// noticed instead of misfiled. Chargebacks always settle against payments.
pub fn convert_chargeback_row(row: &RawRow, file: &str) -> Result<SettlementEvent, ReconError> {
    let external_id = required(row, COL_ORIGINAL_TRANSACTION_ID, file)?.to_string();
    let action = required(row, COL_ACTION_STATUS, file)?;
    let status = chargeback_status(action).ok_or_else(|| {
        ReconError::row_parse(file, format!("unmapped action status '{}'", action))
    })?;

    Ok(SettlementEvent {
        external_id,
        status,
        status_date: optional_date(row, COL_STATUS_DATE),
        chargeback_date: optional_date(row, COL_EXCEPTION_DATE),
        original_date: required_date(row, COL_ORIGINAL_CREATION_DATE, file)?,
        amount: parse_amount(required(row, COL_AMOUNT, file)?, file)?,
        settlement_type: SettlementType::Payment,
        full_name: full_name(row),
        last_four: field(row, COL_LAST_FOUR).unwrap_or_default().to_string(),
        approval_code: None,
        network: None,
        network_id: None,
        raw: row.clone(),
    })
}

/// Convert a direct-transaction row into a normalized event
///
/// The `Type` column decides whether the row settles a payment (pull) or a
/// disbursement (push); network fields ride along for the advance backfill.
pub fn convert_transaction_row(row: &RawRow, file: &str) -> Result<SettlementEvent, ReconError> {
    let external_id = required(row, COL_TRANSACTION_ID, file)?.to_string();
    let status = transaction_status(required(row, COL_TRANSACTION_STATUS, file)?);

    let type_text = required(row, COL_TRANSACTION_TYPE, file)?;
    let settlement_type = if type_text.eq_ignore_ascii_case("disbursement")
        || type_text.eq_ignore_ascii_case("push")
    {
        SettlementType::Disbursement
    } else if type_text.eq_ignore_ascii_case("payment") || type_text.eq_ignore_ascii_case("pull") {
        SettlementType::Payment
    } else {
        return Err(ReconError::row_parse(
            file,
            format!("unknown transaction type '{}'", type_text),
        ));
    };

    Ok(SettlementEvent {
        external_id,
        status,
        status_date: None,
        chargeback_date: None,
        original_date: required_date(row, COL_CREATED_AT, file)?,
        amount: parse_amount(required(row, COL_AMOUNT, file)?, file)?,
        settlement_type,
        full_name: full_name(row),
        last_four: field(row, COL_LAST_FOUR).unwrap_or_default().to_string(),
        approval_code: field(row, COL_APPROVAL_CODE).map(str::to_string),
        network: field(row, COL_NETWORK).map(str::to_string),
        network_id: field(row, COL_NETWORK_ID).map(str::to_string),
        raw: row.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chargeback_row() -> RawRow {
        RawRow::from([
            (COL_ORIGINAL_TRANSACTION_ID.to_string(), "foo-bop".to_string()),
            (COL_ACTION_STATUS.to_string(), "Documentation received".to_string()),
            (COL_CASE_STATUS.to_string(), "open".to_string()),
            (COL_EXCEPTION_TYPE.to_string(), "chargeback".to_string()),
            (COL_AMOUNT.to_string(), "55.74".to_string()),
            (COL_ORIGINAL_CREATION_DATE.to_string(), "5/31/2018".to_string()),
            (COL_STATUS_DATE.to_string(), "7/23/2018".to_string()),
            (COL_FIRST_NAME.to_string(), "Jess".to_string()),
            (COL_LAST_NAME.to_string(), "Fraser".to_string()),
            (COL_LAST_FOUR.to_string(), "4242".to_string()),
        ])
    }

    fn transaction_row() -> RawRow {
        RawRow::from([
            (COL_TRANSACTION_ID.to_string(), "txn-77".to_string()),
            (COL_TRANSACTION_STATUS.to_string(), "Complete".to_string()),
            (COL_TRANSACTION_TYPE.to_string(), "disbursement".to_string()),
            (COL_AMOUNT.to_string(), "75.00".to_string()),
            (COL_CREATED_AT.to_string(), "10/15/2019".to_string()),
            (COL_FIRST_NAME.to_string(), "Sam".to_string()),
            (COL_LAST_NAME.to_string(), "Okafor".to_string()),
            (COL_LAST_FOUR.to_string(), "1881".to_string()),
            (COL_APPROVAL_CODE.to_string(), "A1B2C3".to_string()),
            (COL_NETWORK.to_string(), "VisaFF".to_string()),
            (COL_NETWORK_ID.to_string(), "net-991".to_string()),
        ])
    }

    #[test]
    fn test_chargeback_row_converts() {
        let event = convert_chargeback_row(&chargeback_row(), "cb.csv").unwrap();

        assert_eq!(event.external_id, "foo-bop");
        assert_eq!(event.status, SettlementStatus::Representment);
        assert_eq!(event.amount, Decimal::new(5574, 2));
        assert_eq!(event.settlement_type, SettlementType::Payment);
        assert_eq!(
            event.original_date,
            NaiveDate::from_ymd_opt(2018, 5, 31).unwrap()
        );
        assert_eq!(
            event.status_date,
            Some(NaiveDate::from_ymd_opt(2018, 7, 23).unwrap())
        );
        assert_eq!(event.full_name, "Jess Fraser");
        assert_eq!(event.raw, chargeback_row());
    }

    #[test]
    fn test_chargeback_row_unmapped_action_status_fails() {
        let mut row = chargeback_row();
        row.insert(COL_ACTION_STATUS.to_string(), "Pending review".to_string());

        let result = convert_chargeback_row(&row, "cb.csv");
        assert!(matches!(result, Err(ReconError::RowParse { .. })));
    }

    #[test]
    fn test_chargeback_row_missing_external_id_fails() {
        let mut row = chargeback_row();
        row.remove(COL_ORIGINAL_TRANSACTION_ID);

        let result = convert_chargeback_row(&row, "cb.csv");
        assert!(matches!(result, Err(ReconError::RowParse { .. })));
    }

    #[test]
    fn test_transaction_row_converts_disbursement() {
        let event = convert_transaction_row(&transaction_row(), "txn.csv").unwrap();

        assert_eq!(event.external_id, "txn-77");
        assert_eq!(event.status, SettlementStatus::Completed);
        assert_eq!(event.settlement_type, SettlementType::Disbursement);
        assert_eq!(event.approval_code.as_deref(), Some("A1B2C3"));
        assert_eq!(event.network.as_deref(), Some("VisaFF"));
        assert_eq!(event.network_id.as_deref(), Some("net-991"));
    }

    #[test]
    fn test_transaction_row_pull_is_payment() {
        let mut row = transaction_row();
        row.insert(COL_TRANSACTION_TYPE.to_string(), "pull".to_string());

        let event = convert_transaction_row(&row, "txn.csv").unwrap();
        assert_eq!(event.settlement_type, SettlementType::Payment);
    }

    #[test]
    fn test_transaction_row_unknown_type_fails() {
        let mut row = transaction_row();
        row.insert(COL_TRANSACTION_TYPE.to_string(), "sideways".to_string());

        let result = convert_transaction_row(&row, "txn.csv");
        assert!(matches!(result, Err(ReconError::RowParse { .. })));
    }

    #[test]
    fn test_amount_tolerates_currency_formatting() {
        assert_eq!(
            parse_amount("$1,234.56", "f.csv").unwrap(),
            Decimal::new(123456, 2)
        );
    }

    #[test]
    fn test_blank_optional_columns_stay_none() {
        let mut row = transaction_row();
        row.insert(COL_APPROVAL_CODE.to_string(), String::new());
        row.remove(COL_NETWORK);

        let event = convert_transaction_row(&row, "txn.csv").unwrap();
        assert_eq!(event.approval_code, None);
        assert_eq!(event.network, None);
    }
}
