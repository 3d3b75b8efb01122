//! Pure ledger transition planning
//!
//! Given the current ledger entry and a normalized event, decide the new
//! status, the representment bookkeeping dates, and whether anything
//! actually changed. This is deliberately a pure function of its inputs so
//! re-running a file can never produce a different outcome: idempotence of
//! the whole pipeline rests on it.

use crate::types::{
    Modification, ModificationDelta, SettlementEvent, SettlementLedgerEntry, SettlementStatus,
};
use chrono::NaiveDate;

/// Planned outcome of applying one event to one ledger entry
///
/// The representment fields are candidates: they are `Some` only when the
/// event proposes a date different from the one already stored. A proposal
/// equal to the stored value is a no-op and never produces a modification.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    /// Status the entry should hold after this event
    pub status: SettlementStatus,

    /// New representment start date, when it differs from the stored one
    pub representment_start: Option<NaiveDate>,

    /// New representment end date, when it differs from the stored one
    pub representment_end: Option<NaiveDate>,
}

impl TransitionPlan {
    /// True when applying this plan would change the entry
    pub fn changes(&self, entry: &SettlementLedgerEntry) -> bool {
        self.status != entry.status
            || self.representment_start.is_some()
            || self.representment_end.is_some()
    }
}

/// Representment date the event proposes for the given status
///
/// A Representment status opens the dispute (start date); a Completed
/// status closes it in the merchant's favor (end date). Both come from the
/// provider's status date at day granularity.
fn proposed_start(event: &SettlementEvent) -> Option<NaiveDate> {
    match event.status {
        SettlementStatus::Representment => event.status_date,
        _ => None,
    }
}

fn proposed_end(event: &SettlementEvent) -> Option<NaiveDate> {
    match event.status {
        SettlementStatus::Completed => event.status_date,
        _ => None,
    }
}

/// Plan the transition for an existing ledger entry
pub fn plan_transition(entry: &SettlementLedgerEntry, event: &SettlementEvent) -> TransitionPlan {
    let representment_start = proposed_start(event).filter(|d| entry.representment_start != Some(*d));
    let representment_end = proposed_end(event).filter(|d| entry.representment_end != Some(*d));

    TransitionPlan {
        status: event.status,
        representment_start,
        representment_end,
    }
}

/// Representment dates for a first-sighted external id
pub fn initial_representment(event: &SettlementEvent) -> (Option<NaiveDate>, Option<NaiveDate>) {
    (proposed_start(event), proposed_end(event))
}

/// Apply a plan to an entry, returning the audit record when it changed
///
/// Returns `None` when the plan is a no-op; callers skip persistence of a
/// modification record in that case.
pub fn apply_plan(
    entry: &mut SettlementLedgerEntry,
    plan: &TransitionPlan,
    file_name: &str,
) -> Option<Modification> {
    if !plan.changes(entry) {
        return None;
    }

    let mut previous = ModificationDelta::default();
    let mut new = ModificationDelta::default();

    if plan.status != entry.status {
        previous.status = Some(entry.status);
        new.status = Some(plan.status);
        entry.status = plan.status;
    }
    if let Some(start) = plan.representment_start {
        previous.representment_start = entry.representment_start;
        new.representment_start = Some(start);
        entry.representment_start = Some(start);
    }
    if let Some(end) = plan.representment_end {
        previous.representment_end = entry.representment_end;
        new.representment_end = Some(end);
        entry.representment_end = Some(end);
    }

    let modification = Modification {
        previous,
        new,
        file_name: file_name.to_string(),
    };
    entry.modifications.push(modification.clone());
    Some(modification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Gateway;
    use crate::types::{RawRow, SettlementType};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(status: SettlementStatus) -> SettlementLedgerEntry {
        SettlementLedgerEntry {
            external_id: "ext-1".to_string(),
            settlement_type: SettlementType::Payment,
            status,
            amount: Decimal::new(5574, 2),
            processed_date: date(2018, 5, 31),
            source_id: None,
            source_type: None,
            gateway: Gateway::GatewayB,
            raw: RawRow::new(),
            representment_start: None,
            representment_end: None,
            modifications: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    fn event(status: SettlementStatus, status_date: Option<NaiveDate>) -> SettlementEvent {
        SettlementEvent {
            external_id: "ext-1".to_string(),
            status,
            status_date,
            chargeback_date: None,
            original_date: date(2018, 5, 31),
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
    fn test_representment_sets_start_date() {
        let entry = entry(SettlementStatus::Completed);
        let event = event(SettlementStatus::Representment, Some(date(2018, 7, 23)));

        let plan = plan_transition(&entry, &event);
        assert_eq!(plan.status, SettlementStatus::Representment);
        assert_eq!(plan.representment_start, Some(date(2018, 7, 23)));
        assert_eq!(plan.representment_end, None);
        assert!(plan.changes(&entry));
    }

    #[test]
    fn test_completed_sets_end_date() {
        let mut entry = entry(SettlementStatus::Representment);
        entry.representment_start = Some(date(2018, 7, 23));
        let event = event(SettlementStatus::Completed, Some(date(2018, 8, 10)));

        let plan = plan_transition(&entry, &event);
        assert_eq!(plan.status, SettlementStatus::Completed);
        assert_eq!(plan.representment_end, Some(date(2018, 8, 10)));
        assert_eq!(plan.representment_start, None);
    }

    #[test]
    fn test_equal_proposed_date_is_a_no_op() {
        let mut entry = entry(SettlementStatus::Completed);
        entry.representment_end = Some(date(2018, 8, 10));
        let event = event(SettlementStatus::Completed, Some(date(2018, 8, 10)));

        let plan = plan_transition(&entry, &event);
        assert_eq!(plan.representment_end, None);
        assert!(!plan.changes(&entry));
    }

    #[test]
    fn test_plan_is_pure() {
        let entry = entry(SettlementStatus::Completed);
        let event = event(SettlementStatus::Chargeback, None);

        let first = plan_transition(&entry, &event);
        let second = plan_transition(&entry, &event);
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_plan_records_previous_and_new() {
        let mut entry = entry(SettlementStatus::Completed);
        let event = event(SettlementStatus::Representment, Some(date(2018, 7, 23)));
        let plan = plan_transition(&entry, &event);

        let modification = apply_plan(&mut entry, &plan, "cb.csv").unwrap();

        assert_eq!(modification.previous.status, Some(SettlementStatus::Completed));
        assert_eq!(modification.new.status, Some(SettlementStatus::Representment));
        assert_eq!(modification.previous.representment_start, None);
        assert_eq!(
            modification.new.representment_start,
            Some(date(2018, 7, 23))
        );
        assert_eq!(modification.file_name, "cb.csv");

        assert_eq!(entry.status, SettlementStatus::Representment);
        assert_eq!(entry.representment_start, Some(date(2018, 7, 23)));
        assert_eq!(entry.modifications.len(), 1);
    }

    #[test]
    fn test_apply_no_op_plan_appends_nothing() {
        let mut entry = entry(SettlementStatus::Chargeback);
        let event = event(SettlementStatus::Chargeback, None);
        let plan = plan_transition(&entry, &event);

        assert_eq!(apply_plan(&mut entry, &plan, "cb.csv"), None);
        assert!(entry.modifications.is_empty());
    }

    #[test]
    fn test_initial_representment_from_event() {
        let rp_event = event(SettlementStatus::Representment, Some(date(2018, 7, 23)));
        assert_eq!(
            initial_representment(&rp_event),
            (Some(date(2018, 7, 23)), None)
        );

        let cb_event = event(SettlementStatus::Chargeback, Some(date(2018, 7, 23)));
        assert_eq!(initial_representment(&cb_event), (None, None));
    }
}
