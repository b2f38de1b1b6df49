//! Feed reconciliation
//!
//! This module merges one page of the external feed into the ledger. The
//! reconciler is pure: it reads the committed [`LedgerState`] and returns the
//! next one, leaving persistence to [`crate::core::LedgerStore`].
//!
//! The algorithm enforces:
//! - Idempotence: records at or below the watermark are dropped, so a replayed
//!   page changes nothing
//! - Chronological order: new records are appended oldest first, never
//!   interleaved with older entries
//! - All-or-nothing: one malformed record aborts the whole cycle
//! - Visibility of truncation: a full page appends an anomaly marker

use crate::core::ledger_store::ensure_supported_version;
use crate::core::stacker;
use crate::types::{
    FeedSnapshot, Initiator, LedgerError, LedgerState, Operation, OperationKind, RawTransaction,
    Timestamp, TransactionAction, DRIFT_TOLERANCE, FEED_PAGE_LIMIT,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Drift above tolerance after a reconciliation
///
/// Not an error: the cycle still commits, the mismatch is only reported.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftWarning {
    /// Absolute mismatch
    pub drift: Decimal,
    /// Balance reported by the external source
    pub balance: Decimal,
    /// Sum of member balances and interest
    pub accounted: Decimal,
}

/// Outcome of one reconciliation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The ledger to commit
    pub state: LedgerState,
    /// Raw records accepted in this cycle
    pub accepted: usize,
    /// Whether the page was full and an anomaly marker was appended
    pub truncated: bool,
    /// Present when drift exceeds tolerance
    pub drift_warning: Option<DriftWarning>,
}

/// Reconcile a feed snapshot against the committed ledger
///
/// Processing steps:
/// 1. Keep raw records newer than the watermark, sorted chronologically
/// 2. Classify each one into a purse or interest operation
/// 3. Append an anomaly marker (at `now`) if the page was full
/// 4. Fold the new operations into the ledger, stacking repeats
/// 5. Apply purse amounts to member balances and interest to the interest total
/// 6. Advance the watermark to the newest accepted record
/// 7. Record the reported balance and capacity and recompute drift
///
/// # Arguments
///
/// * `state` - The committed ledger
/// * `snapshot` - Raw page plus authoritative balance and capacity
/// * `now` - Process time, used for the anomaly marker
///
/// # Errors
///
/// Returns an error if:
/// - The ledger is not at the supported schema version
/// - A new raw record cannot be classified (empty name, negative amount,
///   interest withdrawal)
/// - A balance update would overflow
pub fn reconcile(
    state: &LedgerState,
    snapshot: &FeedSnapshot,
    now: Timestamp,
) -> Result<Reconciliation, LedgerError> {
    ensure_supported_version(state.version)?;

    let mut fresh: Vec<&RawTransaction> = snapshot
        .transactions
        .iter()
        .filter(|raw| raw.timestamp > state.last_processed_timestamp)
        .collect();
    fresh.sort_by_key(|raw| raw.timestamp);

    // Classify everything before touching the next state
    let mut batch = fresh
        .iter()
        .map(|raw| classify(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut next = state.clone();
    for operation in &batch {
        debug!(%operation, timestamp = operation.timestamp, "new operation");
        apply_balance_effect(&mut next, operation)?;
    }

    let truncated = fresh.len() >= FEED_PAGE_LIMIT;
    if truncated {
        warn!(
            accepted = fresh.len(),
            "feed page is full, older transactions may have been missed"
        );
        batch.push(Operation::anomaly_marker(now));
    }

    if let Some(newest) = fresh.last() {
        next.last_processed_timestamp = newest.timestamp;
    }

    stacker::fold_into(&mut next.operations, batch);

    next.balance = snapshot.balance;
    next.max_balance = snapshot.max_balance;
    next.drift = next.compute_drift(snapshot.balance)?;

    let accounted = next.accounted()?;
    let drift_warning = (next.drift > DRIFT_TOLERANCE).then(|| {
        let warning = DriftWarning {
            drift: next.drift,
            balance: snapshot.balance,
            accounted,
        };
        warn!(
            drift = %warning.drift,
            balance = %warning.balance,
            accounted = %warning.accounted,
            "ledger drifted from reported balance"
        );
        warning
    });

    info!(accepted = fresh.len(), drift = %next.drift, "reconciled feed page");

    Ok(Reconciliation {
        state: next,
        accepted: fresh.len(),
        truncated,
        drift_warning,
    })
}

/// Turn one raw record into a ledger operation
///
/// # Errors
///
/// Returns `MalformedRecord` if the initiator cannot be normalized, the
/// amount is negative, or the bank interest actor withdraws.
pub fn classify(raw: &RawTransaction) -> Result<Operation, LedgerError> {
    if raw.amount < Decimal::ZERO {
        return Err(LedgerError::malformed_record(
            raw.timestamp,
            format!("negative amount {}", raw.amount),
        ));
    }

    let operation = match (raw.initiator_name.normalize(raw.timestamp)?, raw.action) {
        (Initiator::BankInterest, TransactionAction::Deposit) => {
            Operation::bank_interest(raw.amount, raw.timestamp)
        }
        (Initiator::BankInterest, TransactionAction::Withdraw) => {
            return Err(LedgerError::malformed_record(
                raw.timestamp,
                "bank interest cannot withdraw",
            ))
        }
        (Initiator::Member(username), TransactionAction::Deposit) => {
            Operation::purse(username, raw.amount, raw.timestamp)
        }
        (Initiator::Member(username), TransactionAction::Withdraw) => {
            Operation::purse(username, -raw.amount, raw.timestamp)
        }
    };

    Ok(operation)
}

/// Apply what a freshly classified operation does to balances
///
/// Transfers and markers never move balances during reconciliation.
fn apply_balance_effect(
    state: &mut LedgerState,
    operation: &Operation,
) -> Result<(), LedgerError> {
    match &operation.kind {
        OperationKind::PlayerPurse { amount, username } => {
            let balance = state.users.entry(username.clone()).or_insert(Decimal::ZERO);
            *balance = balance
                .checked_add(*amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("purse", username.as_str()))?;
        }
        OperationKind::BankInterest { amount } => {
            state.bank_interest = state
                .bank_interest
                .checked_add(*amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("interest", "bank"))?;
        }
        OperationKind::PlayerTransfer { .. } | OperationKind::AnomalyMarker => {}
    }
    Ok(())
}
