//! Collaborator ports
//!
//! Everything the engine touches outside its own process boundary sits
//! behind one of these traits: the remote file source, the durable ledger
//! and dedup registry, the domain-record store, the outbound event bus, and
//! metrics. The reconciliation core holds trait objects only, so tests and
//! the local demo mode can swap in the in-memory implementations from
//! [`memory`] without a live backend.

use crate::types::{
    Advance, Payment, ReconError, SettlementLedgerEntry, SettlementStatus, SettlementUpdate,
    SubscriptionPayment,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod local;
pub mod memory;

/// One remote file as reported by a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>) -> Self {
        RemoteFile { name: name.into() }
    }
}

/// Remote file transfer contract
///
/// The engine consumes nothing else from the transfer mechanism: list a
/// directory, fetch a file's bytes.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// List the files currently available in a remote directory
    async fn list(&self, directory: &str) -> Result<Vec<RemoteFile>, ReconError>;

    /// Download one file's raw bytes
    async fn get(&self, directory: &str, name: &str) -> Result<Vec<u8>, ReconError>;
}

/// Durable settlement ledger: one entry per external id, never deleted
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Find the entry for an external id
    async fn find(&self, external_id: &str) -> Result<Option<SettlementLedgerEntry>, ReconError>;

    /// Create the entry for a first-sighted external id
    async fn create(&self, entry: SettlementLedgerEntry) -> Result<(), ReconError>;

    /// Persist an updated entry, including any appended modification records
    async fn update(&self, entry: SettlementLedgerEntry) -> Result<(), ReconError>;
}

/// Read/write access to the correlated domain records
///
/// Lookups are by external id; mutations by internal id, limited to the
/// exact fields reconciliation owns.
#[async_trait]
pub trait DomainStore: Send + Sync {
    async fn find_payment(&self, external_id: &str) -> Result<Option<Payment>, ReconError>;

    async fn find_subscription_payment(
        &self,
        external_id: &str,
    ) -> Result<Option<SubscriptionPayment>, ReconError>;

    async fn find_advance(&self, external_id: &str) -> Result<Option<Advance>, ReconError>;

    async fn set_payment_status(
        &self,
        payment_id: i64,
        status: SettlementStatus,
    ) -> Result<(), ReconError>;

    async fn set_disbursement_status(
        &self,
        advance_id: i64,
        status: SettlementStatus,
    ) -> Result<(), ReconError>;

    /// Backfill the network fields on an advance
    async fn set_advance_network(
        &self,
        advance_id: i64,
        approval_code: &str,
        network: &str,
        network_id: &str,
    ) -> Result<(), ReconError>;

    /// Increase an advance's outstanding balance (a reversed payment means
    /// the advance is owed that money again)
    async fn add_outstanding(&self, advance_id: i64, amount: Decimal) -> Result<(), ReconError>;
}

/// Durable dedup ledger of fully ingested file names
#[async_trait]
pub trait ProcessedFileRegistry: Send + Sync {
    /// Has this file name not yet been fully ingested?
    async fn is_unprocessed(&self, file_name: &str) -> Result<bool, ReconError>;

    /// Record a fully ingested file
    ///
    /// Must not error when the name is already recorded; re-marking is
    /// treated as already processed.
    async fn mark_processed(
        &self,
        file_name: &str,
        rows_processed: u64,
        duration_seconds: u64,
    ) -> Result<(), ReconError>;
}

/// Outbound settlement-update bus; fire-and-forget from the engine's view
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, update: SettlementUpdate) -> Result<(), ReconError>;
}

/// Injected metrics port
///
/// Counters are tagged with the file type, processor gateway, and error
/// kind. The production adapter emits them as structured log events on a
/// dedicated target; tests use a counting double.
pub trait ReconMetrics: Send + Sync {
    fn increment(&self, name: &str, tags: &[(&str, &str)]);
}
