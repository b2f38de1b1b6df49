//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Clock and feed abstractions
//! - `stacker` - Collapsing of identical consecutive operations
//! - `reconciler` - Merging of a feed page into the ledger
//! - `transfer` - Manual transfers between members
//! - `delta` - Recent balance changes per member
//! - `report` - Read-only view of the ledger
//! - `ledger_store` - Ownership and persistence of the committed ledger
//! - `async` - Ledger service and feed poller

pub mod r#async;
pub mod delta;
pub mod ledger_store;
pub mod reconciler;
pub mod report;
pub mod stacker;
pub mod traits;
pub mod transfer;

pub use delta::{deltas, UserDelta, DELTA_WINDOW_MILLIS};
pub use ledger_store::LedgerStore;
pub use r#async::{LedgerHandle, LedgerService, Poller, PollerConfig, PollerHandle};
pub use reconciler::{reconcile, DriftWarning, Reconciliation};
pub use report::{Report, UserBalance, DEFAULT_OPERATION_LIMIT};
pub use traits::{Clock, FeedSource, FixedClock, SystemClock};
pub use transfer::{transfer, TransferOutcome};
