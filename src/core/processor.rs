//! Reconciliation state machine
//!
//! [`ReconciliationProcessor::process_data`] applies one normalized event to
//! the settlement ledger and to the correlated domain records. The failure
//! boundaries here are the financial-safety core of the system:
//!
//! - the ledger write is never guarded: if it fails, the row failed and the
//!   sweep counts it, but re-running the file replays it safely;
//! - domain-record mutations are guarded per row: a failed payment or
//!   advance update is logged and metric'd without poisoning the rest of
//!   the file;
//! - the advance network backfill is guarded independently of
//!   disbursement-status propagation, so one can succeed when the other
//!   fails;
//! - downstream publication is fire-and-forget.

use crate::core::transition::{apply_plan, initial_representment, plan_transition};
use crate::parser::FileMeta;
use crate::ports::{DomainStore, EventPublisher, LedgerStore, ReconMetrics};
use crate::types::{
    Advance, ReconError, SettlementEvent, SettlementLedgerEntry, SettlementStatus,
    SettlementType, SettlementUpdate, SourceType, UpdateOperation,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Applies normalized settlement events to the ledger and domain records
pub struct ReconciliationProcessor {
    ledger: Arc<dyn LedgerStore>,
    domain: Arc<dyn DomainStore>,
    publisher: Arc<dyn EventPublisher>,
    metrics: Arc<dyn ReconMetrics>,
}

impl ReconciliationProcessor {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        domain: Arc<dyn DomainStore>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<dyn ReconMetrics>,
    ) -> Self {
        ReconciliationProcessor {
            ledger,
            domain,
            publisher,
            metrics,
        }
    }

    /// Apply one normalized event from one settlement file
    ///
    /// `None` means an archive-only row: nothing to reconcile. An `Err`
    /// from this method means the ledger write itself failed; the caller
    /// counts the row as failed and continues with the next one.
    pub async fn process_data(
        &self,
        event: Option<SettlementEvent>,
        file: &FileMeta,
    ) -> Result<(), ReconError> {
        let Some(event) = event else {
            return Ok(());
        };

        match self.ledger.find(&event.external_id).await? {
            None => self.create_entry(event, file).await,
            Some(entry) => self.update_entry(entry, event, file).await,
        }
    }

    /// First sighting of an external id: create the ledger entry
    ///
    /// The source link is resolved preferring Payment, then
    /// SubscriptionPayment, then Advance. No match is not an error; the
    /// entry is created unlinked.
    async fn create_entry(
        &self,
        event: SettlementEvent,
        file: &FileMeta,
    ) -> Result<(), ReconError> {
        let source = self.resolve_source(&event.external_id).await;
        let (representment_start, representment_end) = initial_representment(&event);

        let entry = SettlementLedgerEntry {
            external_id: event.external_id.clone(),
            settlement_type: event.settlement_type,
            status: event.status,
            amount: event.amount,
            processed_date: event.status_date.unwrap_or(event.original_date),
            source_id: source.map(|(_, id)| id),
            source_type: source.map(|(source_type, _)| source_type),
            gateway: file.gateway,
            raw: event.raw.clone(),
            representment_start,
            representment_end,
            modifications: Vec::new(),
            updated_at: Utc::now(),
        };
        self.ledger.create(entry).await?;

        self.propagate(&event, event.status, file).await;
        self.publish(&event, UpdateOperation::Create).await;
        Ok(())
    }

    /// Later sighting: plan the transition and persist only real changes
    async fn update_entry(
        &self,
        mut entry: SettlementLedgerEntry,
        event: SettlementEvent,
        file: &FileMeta,
    ) -> Result<(), ReconError> {
        let plan = plan_transition(&entry, &event);

        if apply_plan(&mut entry, &plan, &file.name).is_some() {
            entry.raw = event.raw.clone();
            entry.updated_at = Utc::now();
            self.ledger.update(entry).await?;
        } else if entry.raw != event.raw {
            // No status or representment change, but keep the audit copy of
            // the row current.
            entry.raw = event.raw.clone();
            entry.updated_at = Utc::now();
            self.ledger.update(entry).await?;
        }

        self.propagate(&event, plan.status, file).await;
        self.publish(&event, UpdateOperation::Update).await;
        Ok(())
    }

    /// Resolve the internal record an external id correlates to
    ///
    /// Lookup failures are treated as no match: correlation is best-effort
    /// and must never fail the row.
    async fn resolve_source(&self, external_id: &str) -> Option<(SourceType, i64)> {
        match self.domain.find_payment(external_id).await {
            Ok(Some(payment)) => return Some((SourceType::Payment, payment.id)),
            Ok(None) => {}
            Err(error) => warn!(external_id, %error, "payment lookup failed"),
        }
        match self.domain.find_subscription_payment(external_id).await {
            Ok(Some(subscription)) => {
                return Some((SourceType::SubscriptionPayment, subscription.id))
            }
            Ok(None) => {}
            Err(error) => warn!(external_id, %error, "subscription payment lookup failed"),
        }
        match self.domain.find_advance(external_id).await {
            Ok(Some(advance)) => Some((SourceType::Advance, advance.id)),
            Ok(None) => None,
            Err(error) => {
                warn!(external_id, %error, "advance lookup failed");
                None
            }
        }
    }

    /// Propagate the reconciled status to the correlated domain record
    ///
    /// All failures in here are isolated to the row: logged, metric'd, and
    /// swallowed so the rest of the file still processes.
    async fn propagate(&self, event: &SettlementEvent, status: SettlementStatus, file: &FileMeta) {
        match event.settlement_type {
            SettlementType::Disbursement => self.propagate_disbursement(event, status, file).await,
            SettlementType::Payment => self.propagate_payment(event, status, file).await,
        }
    }

    async fn propagate_disbursement(
        &self,
        event: &SettlementEvent,
        status: SettlementStatus,
        file: &FileMeta,
    ) {
        let advance = match self.domain.find_advance(&event.external_id).await {
            Ok(Some(advance)) => advance,
            Ok(None) => return,
            Err(error) => {
                self.record_domain_failure(event, file, &error);
                return;
            }
        };

        if is_stale(file, advance.updated_at) {
            debug!(
                file = %file.name,
                external_id = %event.external_id,
                "stale file; disbursement status not propagated"
            );
        } else if let Err(error) = self.domain.set_disbursement_status(advance.id, status).await {
            self.record_domain_failure(event, file, &error);
        }

        // Independent of the status write above: backfill only fills in
        // previously-absent values, so it is allowed even for stale files,
        // and its failure must never affect the status propagation.
        self.update_advance_network(event, &advance, file).await;
    }

    async fn propagate_payment(
        &self,
        event: &SettlementEvent,
        status: SettlementStatus,
        file: &FileMeta,
    ) {
        let payment = match self.domain.find_payment(&event.external_id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => return,
            Err(error) => {
                self.record_domain_failure(event, file, &error);
                return;
            }
        };

        if is_stale(file, payment.updated_at) {
            debug!(
                file = %file.name,
                external_id = %event.external_id,
                "stale file; payment status not propagated"
            );
            return;
        }

        if let Err(error) = self.domain.set_payment_status(payment.id, status).await {
            self.record_domain_failure(event, file, &error);
            return;
        }

        // A reversal means the advance is owed that money again. The credit
        // is applied only on the transition out of Completed: a payment
        // already reversed was already credited, so replaying the same row
        // must not move the balance again.
        let reversed = status != SettlementStatus::Completed
            && payment.status == SettlementStatus::Completed;
        if reversed {
            if let Some(advance_id) = payment.advance_id {
                if let Err(error) = self.domain.add_outstanding(advance_id, payment.amount).await {
                    self.record_domain_failure(event, file, &error);
                }
            }
        }
    }

    /// Backfill approval code / network / network id on an advance
    ///
    /// Runs only when all three are present on the event and at least one
    /// differs from the advance. Failures are always swallowed.
    async fn update_advance_network(
        &self,
        event: &SettlementEvent,
        advance: &Advance,
        file: &FileMeta,
    ) {
        let (Some(approval_code), Some(network), Some(network_id)) = (
            event.approval_code.as_deref(),
            event.network.as_deref(),
            event.network_id.as_deref(),
        ) else {
            return;
        };

        let unchanged = advance.approval_code.as_deref() == Some(approval_code)
            && advance.network.as_deref() == Some(network)
            && advance.network_id.as_deref() == Some(network_id);
        if unchanged {
            return;
        }

        if let Err(error) = self
            .domain
            .set_advance_network(advance.id, approval_code, network, network_id)
            .await
        {
            error!(
                file = %file.name,
                advance_id = advance.id,
                %error,
                "advance network backfill failed"
            );
            self.metrics.increment(
                "settlement.network_backfill.failed",
                &[("gateway", file.gateway.as_str()), ("error", error.kind())],
            );
        }
    }

    fn record_domain_failure(&self, event: &SettlementEvent, file: &FileMeta, error: &ReconError) {
        error!(
            file = %file.name,
            external_id = %event.external_id,
            %error,
            "domain record update failed"
        );
        self.metrics.increment(
            "settlement.domain_update.failed",
            &[("gateway", file.gateway.as_str()), ("error", error.kind())],
        );
    }

    /// Publish the settlement update downstream; fire-and-forget
    async fn publish(&self, event: &SettlementEvent, operation: UpdateOperation) {
        let update = SettlementUpdate::from_event(event, operation);
        if let Err(error) = self.publisher.publish(update).await {
            warn!(external_id = %event.external_id, %error, "settlement update publish failed");
            self.metrics.increment(
                "settlement.publish.failed",
                &[("error", error.kind())],
            );
        }
    }
}

/// Staleness guard: a file dated before the domain record's last update
/// must not overwrite newer state
///
/// Comparison is at day granularity against the date embedded in the file
/// name. Files without an embedded date are never considered stale.
fn is_stale(file: &FileMeta, record_updated_at: DateTime<Utc>) -> bool {
    match file.batch_date() {
        Some(batch_date) => batch_date < record_updated_at.date_naive(),
        None => false,
    }
}
