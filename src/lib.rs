//! Settlement Reconciliation Engine
//! # Overview
//!
//! This library ingests settlement and chargeback CSV files from payment
//! processors and reconciles them against internal payment and advance
//! records through a durable settlement ledger.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (SettlementEvent, SettlementLedgerEntry, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`parser`] - Per-feed parsing strategies: filename predicates, row
//!   filters, and raw-row conversion
//! - [`ports`] - Trait seams for the file source, ledger, dedup registry,
//!   domain records, event bus, and metrics
//! - [`core`] - Business logic components:
//!   - [`core::sweep`] - Sweep orchestration per feed
//!   - [`core::selector`] - Candidate file selection with dedup
//!   - [`core::processor`] - The reconciliation state machine
//!   - [`core::transition`] - Pure status/representment planning
//! - [`io`] - CSV decoding of settlement files
//!
//! # Reconciliation Outcomes
//!
//! Each reconciled row lands in one of:
//!
//! - **Create**: first sighting of an external id; a ledger entry is created
//!   and linked to the matching internal record when one exists
//! - **Update**: a later sighting; status and representment changes are
//!   applied and recorded in the entry's modification history
//! - **Archive-only**: rows from feeds that are stored but never reconciled
//!
//! Status changes propagate to the linked payment or advance unless the file
//! is older than the record's last update, and every create/update is
//! published downstream on a fire-and-forget basis.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod parser;
pub mod ports;
pub mod types;

pub use core::{FileSweep, ReconciliationProcessor, SweepSummary};
pub use parser::{FileMeta, Gateway, SettlementParser};
pub use types::{
    ReconError, SettlementEvent, SettlementLedgerEntry, SettlementStatus, SettlementUpdate,
};
