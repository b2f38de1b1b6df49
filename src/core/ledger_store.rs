//! Persistent ledger store
//!
//! This module provides the `LedgerStore`, the single owner of the committed
//! [`LedgerState`] and of the file backing it.
//!
//! # Commit Discipline
//!
//! Every mutation is computed on a copy of the committed state. The copy is
//! flushed to disk first and only then becomes the committed state, so:
//! - a failed cycle (malformed record, storage error) leaves both memory and
//!   disk at the previous state
//! - readers only ever observe complete states
//!
//! # Schema Version
//!
//! The store refuses to open a file whose version differs from
//! [`LEDGER_VERSION`].

use crate::core::reconciler::{self, Reconciliation};
use crate::core::transfer::{self, TransferOutcome};
use crate::io::json_store;
use crate::types::{FeedSnapshot, LedgerError, LedgerState, Timestamp, Username, LEDGER_VERSION};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Check that a persisted ledger can be operated on
///
/// # Errors
///
/// Returns `SchemaVersion` for any version other than [`LEDGER_VERSION`].
pub fn ensure_supported_version(version: u64) -> Result<(), LedgerError> {
    match version {
        LEDGER_VERSION => Ok(()),
        0 | 1 => Err(LedgerError::schema_version(
            version,
            LEDGER_VERSION,
            "ledger file is too old",
        )),
        2 => Err(LedgerError::schema_version(
            version,
            LEDGER_VERSION,
            "no migration from version 2 yet",
        )),
        _ => Err(LedgerError::schema_version(
            version,
            LEDGER_VERSION,
            "ledger file is newer than this build",
        )),
    }
}

/// Owner of the committed ledger and its file
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    state: LedgerState,
}

impl LedgerStore {
    /// Load the ledger file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not a ledger
    /// document, or at an unsupported version.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = json_store::read_ledger(&path)?;
        ensure_supported_version(state.version)?;
        debug!(path = %path.display(), operations = state.operations.len(), "ledger loaded");
        Ok(LedgerStore { path, state })
    }

    /// Create an empty ledger file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if a file already exists at `path` or cannot be
    /// written.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = LedgerState::new();
        json_store::create_ledger(&path, &state)?;
        Ok(LedgerStore { path, state })
    }

    /// The committed state
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush `next` and make it the committed state
    pub fn commit(&mut self, next: LedgerState) -> Result<(), LedgerError> {
        json_store::write_ledger(&self.path, &next)?;
        debug!(path = %self.path.display(), operations = next.operations.len(), "ledger flushed");
        self.state = next;
        Ok(())
    }

    /// Reconcile a feed snapshot and commit the result
    ///
    /// See [`reconciler::reconcile`]. Nothing is written if reconciliation
    /// fails.
    pub fn reconcile(
        &mut self,
        snapshot: &FeedSnapshot,
        now: Timestamp,
    ) -> Result<Reconciliation, LedgerError> {
        let reconciliation = reconciler::reconcile(&self.state, snapshot, now)?;
        self.commit(reconciliation.state.clone())?;
        Ok(reconciliation)
    }

    /// Apply a transfer and commit the result
    ///
    /// See [`transfer::transfer`]. Ignored and rejected transfers write
    /// nothing.
    pub fn transfer(
        &mut self,
        amount: Decimal,
        sender: &Username,
        receiver: &Username,
        now: Timestamp,
    ) -> Result<TransferOutcome, LedgerError> {
        let outcome = transfer::transfer(&self.state, amount, sender, receiver, now)?;
        if let TransferOutcome::Applied { state, .. } = &outcome {
            self.commit(state.clone())?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTransaction;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    fn coins(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, false)]
    #[case(2, false)]
    #[case(3, true)]
    #[case(4, false)]
    fn test_supported_versions(#[case] version: u64, #[case] supported: bool) {
        assert_eq!(ensure_supported_version(version).is_ok(), supported);
    }

    #[test]
    fn test_create_then_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        LedgerStore::create(&path).unwrap();
        let store = LedgerStore::open(&path).unwrap();

        assert_eq!(store.state(), &LedgerState::new());
    }

    #[test]
    fn test_open_refuses_old_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{ "version": 2, "users": {}, "operations": [] }"#).unwrap();

        let result = LedgerStore::open(&path);

        assert!(matches!(
            result,
            Err(LedgerError::SchemaVersion { found: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn test_reconcile_is_flushed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = LedgerStore::create(&path).unwrap();

        let snapshot = FeedSnapshot {
            transactions: vec![RawTransaction::deposit(coins(100), 1, "Alice")],
            balance: coins(100),
            max_balance: 0,
        };
        store.reconcile(&snapshot, 10).unwrap();

        let reopened = LedgerStore::open(&path).unwrap();
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.state().users[&Username::new("Alice")], coins(100));
    }

    #[test]
    fn test_fractional_balances_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = LedgerStore::create(&path).unwrap();
        let cents: Decimal = "0.123456789".parse().unwrap();

        let snapshot = FeedSnapshot {
            transactions: vec![
                RawTransaction::deposit(coins(10_000_000_000), 1, "Alice"),
                RawTransaction::deposit(cents, 2, "Alice"),
                RawTransaction::deposit(cents, 3, "Bank Interest"),
            ],
            balance: "10000000000.246913578".parse().unwrap(),
            max_balance: 60_000_000_000,
        };
        store.reconcile(&snapshot, 10).unwrap();

        let reopened = LedgerStore::open(&path).unwrap();
        assert_eq!(reopened.state(), store.state());
        assert_eq!(
            reopened.state().users[&Username::new("Alice")],
            "10000000000.123456789".parse::<Decimal>().unwrap()
        );
        assert_eq!(reopened.state().bank_interest, cents);
        assert_eq!(reopened.state().drift, Decimal::ZERO);
    }

    #[test]
    fn test_failed_reconcile_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = LedgerStore::create(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let snapshot = FeedSnapshot {
            transactions: vec![
                RawTransaction::deposit(coins(100), 1, "Alice"),
                RawTransaction::deposit(coins(100), 2, ""),
            ],
            balance: coins(200),
            max_balance: 0,
        };
        let result = store.reconcile(&snapshot, 10);

        assert!(matches!(result, Err(LedgerError::MalformedRecord { .. })));
        assert_eq!(store.state(), &LedgerState::new());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_rejected_transfer_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut store = LedgerStore::create(&path).unwrap();
        store
            .reconcile(
                &FeedSnapshot {
                    transactions: vec![RawTransaction::deposit(coins(200), 1, "Alice")],
                    balance: coins(200),
                    max_balance: 0,
                },
                10,
            )
            .unwrap();
        let before = store.state().clone();

        let result = store.transfer(
            coins(10),
            &Username::new("Alice"),
            &Username::new("Ghost"),
            20,
        );

        assert!(matches!(result, Err(LedgerError::UnknownUser { .. })));
        assert_eq!(store.state(), &before);
        assert_eq!(LedgerStore::open(&path).unwrap().state(), &before);
    }
}
