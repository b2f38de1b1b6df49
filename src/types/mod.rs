//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `error`: Error types for the ledger
//! - `feed`: Raw transactions as reported by the external source
//! - `ledger`: The persisted ledger aggregate
//! - `operation`: Reconciled ledger entries
//! - `username`: Styled and normalized member names

pub mod error;
pub mod feed;
pub mod ledger;
pub mod operation;
pub mod username;

pub use error::LedgerError;
pub use feed::{FeedSnapshot, RawTransaction, TransactionAction, FEED_PAGE_LIMIT};
pub use ledger::{LedgerState, DRIFT_TOLERANCE, LEDGER_VERSION};
pub use operation::{Operation, OperationKind, Timestamp};
pub use username::{Initiator, StyledUsername, Username, RESERVED_ACTOR};
