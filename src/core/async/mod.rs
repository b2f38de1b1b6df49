//! Asynchronous runtime components
//!
//! This module wires the pure ledger operations into a long-running process:
//!
//! - **LedgerService**: single-owner actor serializing every ledger mutation
//! - **LedgerHandle**: cloneable async front-end of the service
//! - **Poller**: fetches the feed on an interval or on demand
//!
//! # Concurrency
//!
//! At most one mutation is in flight at any time: the service handles its
//! queue one request at a time. Fetching runs concurrently with transfers and
//! reports since it never touches the ledger until the snapshot is queued.

pub mod poller;
pub mod service;

pub use poller::{Poller, PollerConfig, PollerHandle};
pub use service::{LedgerHandle, LedgerService};
