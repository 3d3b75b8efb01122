//! Error types for the settlement reconciliation engine
//!
//! This is a background batch job with no user-visible failure channel, so
//! every variant here ultimately surfaces through logs and metrics. The
//! variants encode the isolation boundary each failure respects:
//!
//! - **FileAccess**: listing or download failed; isolated to that file
//! - **RowParse**: a file or row could not be decoded; the file is skipped
//! - **RowReconciliation**: a domain-record mutation failed; isolated to that row
//! - **NetworkBackfill**: advance network update failed; always swallowed
//! - **Ledger**: the ledger write itself failed; the row is considered failed

use thiserror::Error;

/// Main error type for the reconciliation engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconError {
    /// Listing or downloading a remote file failed
    ///
    /// Isolated to the file: the sweep logs it and moves on. Only a failure
    /// to list the remote directory at all aborts a sweep.
    #[error("File access error for '{file}': {message}")]
    FileAccess {
        /// Remote file or directory involved
        file: String,
        /// Description of the transfer failure
        message: String,
    },

    /// A file or row could not be decoded into a normalized event
    #[error("Row parse error in '{file}'{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    RowParse {
        /// File the row came from
        file: String,
        /// Line number, when known
        line: Option<u64>,
        /// Description of the parse failure
        message: String,
    },

    /// A correlated domain record could not be mutated
    ///
    /// Caught per row: the ledger write for the row is still attempted and
    /// subsequent rows in the file are still processed.
    #[error("Reconciliation error for external id '{external_id}': {message}")]
    RowReconciliation {
        /// External id of the row that failed
        external_id: String,
        /// Description of the mutation failure
        message: String,
    },

    /// The advance network backfill failed
    ///
    /// Never escalated: disbursement-status propagation must not be affected.
    #[error("Network backfill failed for advance {advance_id}: {message}")]
    NetworkBackfill {
        /// Internal id of the advance
        advance_id: i64,
        /// Description of the persistence failure
        message: String,
    },

    /// The ledger entry itself could not be persisted
    ///
    /// Not guarded: a row whose ledger write fails counts as a failed row.
    #[error("Ledger persistence failed for external id '{external_id}': {message}")]
    Ledger {
        /// External id of the entry
        external_id: String,
        /// Description of the persistence failure
        message: String,
    },

    /// Downstream publication failed
    ///
    /// Fire-and-forget: logged by the processor, never propagated.
    #[error("Publish failed for external id '{external_id}': {message}")]
    Publish {
        /// External id of the update
        external_id: String,
        /// Description of the publish failure
        message: String,
    },

    /// Local I/O error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },
}

impl From<std::io::Error> for ReconError {
    fn from(error: std::io::Error) -> Self {
        ReconError::Io {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl ReconError {
    /// Create a FileAccess error
    pub fn file_access(file: &str, message: impl ToString) -> Self {
        ReconError::FileAccess {
            file: file.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a RowParse error without a line number
    pub fn row_parse(file: &str, message: impl ToString) -> Self {
        ReconError::RowParse {
            file: file.to_string(),
            line: None,
            message: message.to_string(),
        }
    }

    /// Create a RowParse error with a line number
    pub fn row_parse_at(file: &str, line: u64, message: impl ToString) -> Self {
        ReconError::RowParse {
            file: file.to_string(),
            line: Some(line),
            message: message.to_string(),
        }
    }

    /// Create a RowReconciliation error
    pub fn row_reconciliation(external_id: &str, message: impl ToString) -> Self {
        ReconError::RowReconciliation {
            external_id: external_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a NetworkBackfill error
    pub fn network_backfill(advance_id: i64, message: impl ToString) -> Self {
        ReconError::NetworkBackfill {
            advance_id,
            message: message.to_string(),
        }
    }

    /// Create a Ledger error
    pub fn ledger(external_id: &str, message: impl ToString) -> Self {
        ReconError::Ledger {
            external_id: external_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a Publish error
    pub fn publish(external_id: &str, message: impl ToString) -> Self {
        ReconError::Publish {
            external_id: external_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable error-kind tag for metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            ReconError::FileAccess { .. } => "file_access",
            ReconError::RowParse { .. } => "row_parse",
            ReconError::RowReconciliation { .. } => "row_reconciliation",
            ReconError::NetworkBackfill { .. } => "network_backfill",
            ReconError::Ledger { .. } => "ledger",
            ReconError::Publish { .. } => "publish",
            ReconError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::file_access(
        ReconError::file_access("4002_20200101_chargebacks.csv", "connection reset"),
        "File access error for '4002_20200101_chargebacks.csv': connection reset"
    )]
    #[case::row_parse_with_line(
        ReconError::row_parse_at("txns.csv", 42, "invalid amount"),
        "Row parse error in 'txns.csv' at line 42: invalid amount"
    )]
    #[case::row_parse_without_line(
        ReconError::row_parse("txns.csv", "missing header"),
        "Row parse error in 'txns.csv': missing header"
    )]
    #[case::row_reconciliation(
        ReconError::row_reconciliation("ext-9", "payment update rejected"),
        "Reconciliation error for external id 'ext-9': payment update rejected"
    )]
    #[case::network_backfill(
        ReconError::network_backfill(7, "advance row locked"),
        "Network backfill failed for advance 7: advance row locked"
    )]
    #[case::ledger(
        ReconError::ledger("ext-9", "write timed out"),
        "Ledger persistence failed for external id 'ext-9': write timed out"
    )]
    fn test_error_display(#[case] error: ReconError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: ReconError = io_error.into();
        assert!(matches!(error, ReconError::Io { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
