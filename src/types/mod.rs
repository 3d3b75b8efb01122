//! Core data types for settlement reconciliation
//!
//! This module contains the normalized event shape, the durable ledger
//! types, the correlated domain records, and the engine's error type.

pub mod domain;
pub mod error;
pub mod event;
pub mod ledger;

pub use domain::{Advance, Payment, SubscriptionPayment};
pub use error::ReconError;
pub use event::{
    RawRow, SettlementEvent, SettlementStatus, SettlementType, SettlementUpdate, UpdateOperation,
};
pub use ledger::{
    Modification, ModificationDelta, ProcessedFile, SettlementLedgerEntry, SourceType,
};
