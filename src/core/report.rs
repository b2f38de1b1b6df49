//! Read-only view of the committed ledger
//!
//! A [`Report`] is a snapshot taken from a committed [`LedgerState`]. It never
//! mutates the ledger; rendering lives in [`crate::io::report_format`].

use crate::core::delta::{self, UserDelta, DELTA_WINDOW_MILLIS};
use crate::types::{LedgerError, LedgerState, Operation, Timestamp, Username, DRIFT_TOLERANCE};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Number of ledger entries shown when no limit is given
pub const DEFAULT_OPERATION_LIMIT: usize = 25;

/// Balance of one member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBalance {
    pub username: Username,
    pub balance: Decimal,
}

/// Everything a reader wants to know about the shared account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Most recent entries first
    pub operations: Vec<Operation>,
    pub total_operations: usize,
    /// Sorted by balance, largest first
    pub users: Vec<UserBalance>,
    /// Net changes over the last 24 hours
    pub deltas: Vec<UserDelta>,
    pub balance: Decimal,
    pub max_balance: u64,
    /// `balance / max_balance` in percent, absent without a known capacity
    pub completion: Option<Decimal>,
    pub bank_interest: Decimal,
    pub drift: Decimal,
    pub drift_is_important: bool,
    pub last_transaction_timestamp: Timestamp,
    /// When the feed was last reconciled successfully by this process
    pub last_check: Option<Timestamp>,
}

impl Report {
    /// Build a report from a committed ledger
    ///
    /// # Arguments
    ///
    /// * `state` - The committed ledger
    /// * `now` - Process time, anchors the delta window
    /// * `last_check` - Time of the last successful reconciliation, if any
    /// * `limit` - Maximum number of ledger entries to include
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the recent changes of a member cannot be summed.
    pub fn build(
        state: &LedgerState,
        now: Timestamp,
        last_check: Option<Timestamp>,
        limit: usize,
    ) -> Result<Self, LedgerError> {
        let operations = state.operations.iter().rev().take(limit).cloned().collect();

        let mut users: Vec<UserBalance> = state
            .users
            .iter()
            .map(|(username, balance)| UserBalance {
                username: username.clone(),
                balance: *balance,
            })
            .collect();
        users.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.username.cmp(&b.username))
        });

        Ok(Report {
            operations,
            total_operations: state.operations.len(),
            users,
            deltas: delta::deltas(&state.operations, now, DELTA_WINDOW_MILLIS)?,
            balance: state.balance,
            max_balance: state.max_balance,
            completion: completion(state.balance, state.max_balance),
            bank_interest: state.bank_interest,
            drift: state.drift,
            drift_is_important: state.drift > DRIFT_TOLERANCE,
            last_transaction_timestamp: state.last_processed_timestamp,
            last_check,
        })
    }
}

fn completion(balance: Decimal, max_balance: u64) -> Option<Decimal> {
    if max_balance == 0 {
        return None;
    }
    let ratio = balance.checked_div(Decimal::from(max_balance))?;
    let percent = ratio.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
