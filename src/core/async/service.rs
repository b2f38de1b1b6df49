//! Single-owner ledger service
//!
//! The `LedgerService` owns the [`LedgerStore`] and is the only place where
//! the ledger is mutated. Requests arrive on a bounded channel and are
//! answered one at a time through one-shot replies, so reconciliation and
//! transfers never interleave.
//!
//! # Architecture
//!
//! ```text
//! LedgerHandle (cloneable)  ──mpsc──▶  LedgerService (blocking thread)
//!        ▲                                   ├── LedgerStore (file + state)
//!        └──────────── oneshot ◀─────────────┴── Clock
//! ```
//!
//! The service runs on a blocking thread since every mutation ends with a
//! synchronous file write. It stops once every handle has been dropped.

use crate::core::ledger_store::LedgerStore;
use crate::core::reconciler::Reconciliation;
use crate::core::report::Report;
use crate::core::traits::Clock;
use crate::core::transfer::TransferOutcome;
use crate::types::{FeedSnapshot, LedgerError, Timestamp, Username};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Pending requests accepted before senders have to wait
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, LedgerError>>;

#[derive(Debug)]
enum Command {
    Reconcile {
        snapshot: FeedSnapshot,
        reply: Reply<Reconciliation>,
    },
    Transfer {
        amount: Decimal,
        sender: Username,
        receiver: Username,
        reply: Reply<TransferOutcome>,
    },
    Report {
        limit: usize,
        reply: Reply<Report>,
    },
}

/// Actor owning the ledger store
pub struct LedgerService {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
    last_check: Option<Timestamp>,
    commands: mpsc::Receiver<Command>,
}

impl LedgerService {
    /// Start the service on a blocking thread
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: LedgerStore, clock: impl Clock + 'static) -> LedgerHandle {
        let (sender, commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let service = LedgerService {
            store,
            clock: Arc::new(clock),
            last_check: None,
            commands,
        };
        tokio::task::spawn_blocking(move || service.run());
        LedgerHandle { sender }
    }

    fn run(mut self) {
        debug!(path = %self.store.path().display(), "ledger service started");
        while let Some(command) = self.commands.blocking_recv() {
            self.handle(command);
        }
        debug!("ledger service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Reconcile { snapshot, reply } => {
                let now = self.clock.now();
                let result = self.store.reconcile(&snapshot, now);
                if result.is_ok() {
                    self.last_check = Some(now);
                }
                if reply.send(result).is_err() {
                    warn!("reconciliation requester went away before the reply");
                }
            }
            Command::Transfer {
                amount,
                sender,
                receiver,
                reply,
            } => {
                let now = self.clock.now();
                let result = self.store.transfer(amount, &sender, &receiver, now);
                if reply.send(result).is_err() {
                    warn!("transfer requester went away before the reply");
                }
            }
            Command::Report { limit, reply } => {
                let report = Report::build(
                    self.store.state(),
                    self.clock.now(),
                    self.last_check,
                    limit,
                );
                if reply.send(report).is_err() {
                    warn!("report requester went away before the reply");
                }
            }
        }
    }
}

/// Cloneable access to a running [`LedgerService`]
///
/// Every method fails with `ServiceUnavailable` once the service has stopped.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<Command>,
}

impl LedgerHandle {
    /// Reconcile a fetched snapshot, see [`LedgerStore::reconcile`]
    pub async fn reconcile(&self, snapshot: FeedSnapshot) -> Result<Reconciliation, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Reconcile { snapshot, reply }).await?;
        response.await.map_err(|_| LedgerError::ServiceUnavailable)?
    }

    /// Apply a transfer, see [`LedgerStore::transfer`]
    pub async fn transfer(
        &self,
        amount: Decimal,
        sender: Username,
        receiver: Username,
    ) -> Result<TransferOutcome, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Transfer {
            amount,
            sender,
            receiver,
            reply,
        })
        .await?;
        response.await.map_err(|_| LedgerError::ServiceUnavailable)?
    }

    /// Build a report of the committed ledger
    pub async fn report(&self, limit: usize) -> Result<Report, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Report { limit, reply }).await?;
        response.await.map_err(|_| LedgerError::ServiceUnavailable)?
    }

    async fn send(&self, command: Command) -> Result<(), LedgerError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| LedgerError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::DEFAULT_OPERATION_LIMIT;
    use crate::core::traits::FixedClock;
    use crate::types::{Operation, RawTransaction};
    use tempfile::tempdir;

    fn coins(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn snapshot(transactions: Vec<RawTransaction>, balance: i64) -> FeedSnapshot {
        FeedSnapshot {
            transactions,
            balance: coins(balance),
            max_balance: 5_000_000,
        }
    }

    #[tokio::test]
    async fn test_reconcile_then_report() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::create(dir.path().join("data.json")).unwrap();
        let handle = LedgerService::spawn(store, FixedClock(10_000));

        let reconciliation = handle
            .reconcile(snapshot(
                vec![
                    RawTransaction::deposit(coins(200), 1, "§aAlice"),
                    RawTransaction::deposit(coins(100), 2, "Bob"),
                ],
                300,
            ))
            .await
            .unwrap();
        assert_eq!(reconciliation.accepted, 2);

        let report = handle.report(DEFAULT_OPERATION_LIMIT).await.unwrap();
        assert_eq!(report.total_operations, 2);
        assert_eq!(report.users[0].username, Username::new("Alice"));
        assert_eq!(report.last_check, Some(10_000));
        assert_eq!(report.max_balance, 5_000_000);
    }

    #[tokio::test]
    async fn test_last_check_only_moves_on_success() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::create(dir.path().join("data.json")).unwrap();
        let handle = LedgerService::spawn(store, FixedClock(10_000));

        let result = handle
            .reconcile(snapshot(vec![RawTransaction::deposit(coins(1), 1, "")], 1))
            .await;
        assert!(matches!(result, Err(LedgerError::MalformedRecord { .. })));

        let report = handle.report(DEFAULT_OPERATION_LIMIT).await.unwrap();
        assert_eq!(report.last_check, None);
        assert_eq!(report.total_operations, 0);
    }

    #[tokio::test]
    async fn test_transfers_are_serialized_with_reconciliation() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::create(dir.path().join("data.json")).unwrap();
        let handle = LedgerService::spawn(store, FixedClock(10_000));

        handle
            .reconcile(snapshot(
                vec![
                    RawTransaction::deposit(coins(200), 1, "Alice"),
                    RawTransaction::deposit(coins(1), 2, "Bob"),
                ],
                201,
            ))
            .await
            .unwrap();

        let transfers = (0..10).map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .transfer(coins(5), Username::new("Alice"), Username::new("Bob"))
                    .await
            })
        });
        for task in transfers.collect::<Vec<_>>() {
            let outcome = task.await.unwrap().unwrap();
            assert!(matches!(outcome, TransferOutcome::Applied { .. }));
        }

        let report = handle.report(DEFAULT_OPERATION_LIMIT).await.unwrap();
        let balances: Vec<(String, Decimal)> = report
            .users
            .iter()
            .map(|u| (u.username.to_string(), u.balance))
            .collect();
        assert_eq!(
            balances,
            vec![("Alice".to_string(), coins(150)), ("Bob".to_string(), coins(51))]
        );
        assert_eq!(report.total_operations, 12);
    }

    #[tokio::test]
    async fn test_abandoned_report_keeps_service_running() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::create(dir.path().join("data.json")).unwrap();
        let handle = LedgerService::spawn(store, FixedClock(10_000));

        let (reply, response) = oneshot::channel();
        drop(response);
        handle
            .send(Command::Report {
                limit: DEFAULT_OPERATION_LIMIT,
                reply,
            })
            .await
            .unwrap();

        let report = handle.report(DEFAULT_OPERATION_LIMIT).await.unwrap();
        assert_eq!(report.total_operations, 0);
    }

    #[tokio::test]
    async fn test_report_overflow_is_returned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut state = crate::types::LedgerState::new();
        let mut huge = Operation::purse(Username::new("Alice"), Decimal::MAX, 9_000);
        huge.repeat_count = 2;
        state.operations.push(huge);
        crate::io::json_store::write_ledger(&path, &state).unwrap();
        let handle = LedgerService::spawn(LedgerStore::open(&path).unwrap(), FixedClock(10_000));

        let result = handle.report(DEFAULT_OPERATION_LIMIT).await;

        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow { .. })));
    }

    #[tokio::test]
    async fn test_rejected_transfer_is_reported() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::create(dir.path().join("data.json")).unwrap();
        let handle = LedgerService::spawn(store, FixedClock(10_000));

        let result = handle
            .transfer(coins(10), Username::new("Alice"), Username::new("Ghost"))
            .await;

        assert_eq!(result, Err(LedgerError::unknown_user("Alice")));
    }
}
