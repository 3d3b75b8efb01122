//! In-memory collaborator implementations
//!
//! DashMap-backed implementations of the persistence and publication ports.
//! They back the local demo mode and the test suites; the sweep and
//! processor only ever see the traits, so swapping in real backends is a
//! wiring change.

use crate::ports::{
    DomainStore, EventPublisher, LedgerStore, ProcessedFileRegistry, ReconMetrics,
};
use crate::types::{
    Advance, Payment, ProcessedFile, ReconError, SettlementLedgerEntry, SettlementStatus,
    SettlementUpdate, SubscriptionPayment,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Mutex;

/// In-memory settlement ledger keyed by external id
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: DashMap<String, SettlementLedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of an entry, mainly for tests and the demo summary
    pub fn entry(&self, external_id: &str) -> Option<SettlementLedgerEntry> {
        self.entries.get(external_id).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find(&self, external_id: &str) -> Result<Option<SettlementLedgerEntry>, ReconError> {
        Ok(self.entries.get(external_id).map(|e| e.clone()))
    }

    async fn create(&self, entry: SettlementLedgerEntry) -> Result<(), ReconError> {
        self.entries.insert(entry.external_id.clone(), entry);
        Ok(())
    }

    async fn update(&self, entry: SettlementLedgerEntry) -> Result<(), ReconError> {
        self.entries.insert(entry.external_id.clone(), entry);
        Ok(())
    }
}

/// In-memory domain records, pre-seeded by tests or the demo driver
#[derive(Debug, Default)]
pub struct MemoryDomain {
    payments: DashMap<i64, Payment>,
    subscription_payments: DashMap<i64, SubscriptionPayment>,
    advances: DashMap<i64, Advance>,
}

impl MemoryDomain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_payment(&self, payment: Payment) {
        self.payments.insert(payment.id, payment);
    }

    pub fn insert_subscription_payment(&self, subscription: SubscriptionPayment) {
        self.subscription_payments.insert(subscription.id, subscription);
    }

    pub fn insert_advance(&self, advance: Advance) {
        self.advances.insert(advance.id, advance);
    }

    pub fn payment(&self, id: i64) -> Option<Payment> {
        self.payments.get(&id).map(|p| p.clone())
    }

    pub fn advance(&self, id: i64) -> Option<Advance> {
        self.advances.get(&id).map(|a| a.clone())
    }
}

#[async_trait]
impl DomainStore for MemoryDomain {
    async fn find_payment(&self, external_id: &str) -> Result<Option<Payment>, ReconError> {
        Ok(self
            .payments
            .iter()
            .find(|p| p.external_id == external_id)
            .map(|p| p.clone()))
    }

    async fn find_subscription_payment(
        &self,
        external_id: &str,
    ) -> Result<Option<SubscriptionPayment>, ReconError> {
        Ok(self
            .subscription_payments
            .iter()
            .find(|s| s.external_id == external_id)
            .map(|s| s.clone()))
    }

    async fn find_advance(&self, external_id: &str) -> Result<Option<Advance>, ReconError> {
        Ok(self
            .advances
            .iter()
            .find(|a| a.external_id == external_id)
            .map(|a| a.clone()))
    }

    async fn set_payment_status(
        &self,
        payment_id: i64,
        status: SettlementStatus,
    ) -> Result<(), ReconError> {
        let mut payment = self.payments.get_mut(&payment_id).ok_or_else(|| {
            ReconError::row_reconciliation("", format!("payment {} not found", payment_id))
        })?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(())
    }

    async fn set_disbursement_status(
        &self,
        advance_id: i64,
        status: SettlementStatus,
    ) -> Result<(), ReconError> {
        let mut advance = self.advances.get_mut(&advance_id).ok_or_else(|| {
            ReconError::row_reconciliation("", format!("advance {} not found", advance_id))
        })?;
        advance.disbursement_status = status;
        advance.updated_at = Utc::now();
        Ok(())
    }

    async fn set_advance_network(
        &self,
        advance_id: i64,
        approval_code: &str,
        network: &str,
        network_id: &str,
    ) -> Result<(), ReconError> {
        let mut advance = self
            .advances
            .get_mut(&advance_id)
            .ok_or_else(|| ReconError::network_backfill(advance_id, "advance not found"))?;
        advance.approval_code = Some(approval_code.to_string());
        advance.network = Some(network.to_string());
        advance.network_id = Some(network_id.to_string());
        Ok(())
    }

    async fn add_outstanding(&self, advance_id: i64, amount: Decimal) -> Result<(), ReconError> {
        let mut advance = self.advances.get_mut(&advance_id).ok_or_else(|| {
            ReconError::row_reconciliation("", format!("advance {} not found", advance_id))
        })?;
        advance.outstanding += amount;
        advance.updated_at = Utc::now();
        Ok(())
    }
}

/// In-memory processed-file registry
///
/// Duplicate `mark_processed` calls keep the first record, matching the
/// durable registry's no-error contract.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    files: DashMap<String, ProcessedFile>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, file_name: &str) -> Option<ProcessedFile> {
        self.files.get(file_name).map(|f| f.clone())
    }
}

#[async_trait]
impl ProcessedFileRegistry for MemoryRegistry {
    async fn is_unprocessed(&self, file_name: &str) -> Result<bool, ReconError> {
        Ok(!self.files.contains_key(file_name))
    }

    async fn mark_processed(
        &self,
        file_name: &str,
        rows_processed: u64,
        duration_seconds: u64,
    ) -> Result<(), ReconError> {
        self.files
            .entry(file_name.to_string())
            .or_insert_with(|| ProcessedFile {
                file_name: file_name.to_string(),
                rows_processed,
                processing_duration_seconds: duration_seconds,
                created_at: Utc::now(),
            });
        Ok(())
    }
}

/// Capturing publisher for tests and the demo driver
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<SettlementUpdate>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<SettlementUpdate> {
        self.published.lock().expect("publisher lock").clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, update: SettlementUpdate) -> Result<(), ReconError> {
        self.published.lock().expect("publisher lock").push(update);
        Ok(())
    }
}

/// Counting metrics double
///
/// Counter keys are `name{tag=value,...}` with tags in the order given,
/// which keeps test assertions readable.
#[derive(Debug, Default)]
pub struct MemoryMetrics {
    counters: DashMap<String, u64>,
}

impl MemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str, tags: &[(&str, &str)]) -> u64 {
        self.counters
            .get(&Self::key(name, tags))
            .map(|c| *c)
            .unwrap_or(0)
    }

    fn key(name: &str, tags: &[(&str, &str)]) -> String {
        let tags = tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}{{{}}}", name, tags)
    }
}

impl ReconMetrics for MemoryMetrics {
    fn increment(&self, name: &str, tags: &[(&str, &str)]) {
        *self.counters.entry(Self::key(name, tags)).or_insert(0) += 1;
    }
}
