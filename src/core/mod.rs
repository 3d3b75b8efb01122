//! Reconciliation core
//!
//! The sweep lists and selects files, the processor applies each normalized
//! row to the ledger and domain records, and the transition module holds the
//! pure status/representment planning both of them rely on.

pub mod processor;
pub mod selector;
pub mod sweep;
pub mod transition;

pub use processor::ReconciliationProcessor;
pub use selector::select_files;
pub use sweep::{FileSweep, SweepSummary};
