//! Co-op Ledger Library
//! # Overview
//!
//! This library keeps track of how much of a shared bank account belongs to
//! each member of a co-op. The bank only exposes its balance and a short page
//! of recent transactions; the ledger turns that feed into per-member shares.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (LedgerState, Operation, usernames, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::reconciler`] - Merging of a feed page into the ledger
//!   - [`core::stacker`] - Collapsing of identical consecutive operations
//!   - [`core::transfer`] - Manual transfers between members
//!   - [`core::delta`] - Recent balance changes per member
//!   - [`core::ledger_store`] - Ownership and persistence of the ledger
//!   - [`core::r#async`] - Ledger service actor and feed poller
//! - [`io`] - Ledger file, Hypixel API, report rendering and commands
//!
//! # Operations
//!
//! The ledger records four kinds of entries:
//!
//! - **PlayerPurse**: a member deposited (positive) or withdrew (negative)
//! - **PlayerTransfer**: a member handed part of their share to another
//! - **BankInterest**: interest credited by the bank, owned by nobody
//! - **AnomalyMarker**: the feed page was full, records may be missing
//!
//! # Ledger State
//!
//! The persisted ledger maintains:
//! - `users`: each member's share
//! - `bank_interest`: interest accrued so far
//! - `balance`, `max_balance`: last values reported by the bank
//! - `drift`: how far the shares and interest are from the reported balance
//! - `last_processed_timestamp`: newest feed record already accounted for

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use core::{reconcile, transfer, LedgerService, LedgerStore, Report};
pub use types::{
    FeedSnapshot, LedgerError, LedgerState, Operation, OperationKind, RawTransaction,
    StyledUsername, Username,
};
