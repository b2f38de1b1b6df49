//! Manual transfers between co-op members
//!
//! Members settle debts between themselves outside of the bank. A transfer
//! moves part of one member's share to another and is recorded as a
//! `PlayerTransfer` operation. Transfers redistribute balances: the sum of all
//! member balances is unchanged, so drift is not recomputed.

use crate::core::ledger_store::ensure_supported_version;
use crate::types::{LedgerError, LedgerState, Operation, Timestamp, Username};
use rust_decimal::Decimal;
use tracing::info;

/// Outcome of a transfer request
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// The transfer was applied, `state` must be committed
    Applied {
        state: LedgerState,
        operation: Operation,
    },
    /// Sender and receiver are the same member, nothing to do
    Ignored,
}

/// Move `amount` from `sender` to `receiver`
///
/// Validation order:
/// 1. A member transferring to themselves is a no-op, whatever the amount
/// 2. `amount` must be strictly positive
/// 3. Neither side may be the bank interest actor
/// 4. Both members must already have a balance in the ledger
///
/// The watermark moves to `now` unless it is already past it.
///
/// # Arguments
///
/// * `state` - The committed ledger
/// * `amount` - Amount to move (must be positive)
/// * `sender` - Member giving up part of their share
/// * `receiver` - Member credited
/// * `now` - Process time, recorded on the operation
///
/// # Errors
///
/// Returns an error if:
/// - The amount is zero or negative
/// - Either member is the reserved bank interest actor
/// - Either member is unknown
/// - A balance update would overflow
pub fn transfer(
    state: &LedgerState,
    amount: Decimal,
    sender: &Username,
    receiver: &Username,
    now: Timestamp,
) -> Result<TransferOutcome, LedgerError> {
    ensure_supported_version(state.version)?;

    if sender == receiver {
        info!(%sender, "ignoring transfer to self");
        return Ok(TransferOutcome::Ignored);
    }

    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount));
    }

    for member in [sender, receiver] {
        if member.is_reserved() {
            return Err(LedgerError::reserved_actor(member.as_str()));
        }
    }

    let sender_balance = *state
        .users
        .get(sender)
        .ok_or_else(|| LedgerError::unknown_user(sender.as_str()))?;
    let receiver_balance = *state
        .users
        .get(receiver)
        .ok_or_else(|| LedgerError::unknown_user(receiver.as_str()))?;

    let new_sender_balance = sender_balance
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", sender.as_str()))?;
    let new_receiver_balance = receiver_balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", receiver.as_str()))?;

    let operation = Operation::transfer(sender.clone(), receiver.clone(), amount, now);

    let mut next = state.clone();
    next.users.insert(sender.clone(), new_sender_balance);
    next.users.insert(receiver.clone(), new_receiver_balance);
    next.operations.push(operation.clone());
    next.last_processed_timestamp = next.last_processed_timestamp.max(now);

    info!(%sender, %receiver, %amount, "transfer applied");

    Ok(TransferOutcome::Applied {
        state: next,
        operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationKind;
    use rstest::rstest;

    fn coins(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn ledger(users: &[(&str, i64)]) -> LedgerState {
        let mut state = LedgerState::new();
        for (name, balance) in users {
            state.users.insert(Username::new(*name), coins(*balance));
        }
        state
    }

    fn applied(outcome: TransferOutcome) -> (LedgerState, Operation) {
        match outcome {
            TransferOutcome::Applied { state, operation } => (state, operation),
            TransferOutcome::Ignored => panic!("Expected transfer to be applied"),
        }
    }

    #[test]
    fn test_transfer_moves_balance() {
        let state = ledger(&[("Alice", 200), ("Bob", 0)]);

        let outcome = transfer(
            &state,
            coins(50),
            &Username::new("Alice"),
            &Username::new("Bob"),
            1000,
        )
        .unwrap();
        let (next, operation) = applied(outcome);

        assert_eq!(next.users[&Username::new("Alice")], coins(150));
        assert_eq!(next.users[&Username::new("Bob")], coins(50));
        assert_eq!(next.operations, vec![operation.clone()]);
        assert_eq!(
            operation.kind,
            OperationKind::PlayerTransfer {
                amount: coins(50),
                receiver: Username::new("Bob"),
                sender: Username::new("Alice"),
            }
        );
        assert_eq!(next.last_processed_timestamp, 1000);
    }

    #[rstest]
    #[case(10)]
    #[case(200)]
    #[case(999)]
    fn test_transfer_conserves_total(#[case] amount: i64) {
        let state = ledger(&[("Alice", 200), ("Bob", -40), ("Carol", 7)]);

        let outcome = transfer(
            &state,
            coins(amount),
            &Username::new("Alice"),
            &Username::new("Carol"),
            1,
        )
        .unwrap();
        let (next, _) = applied(outcome);

        assert_eq!(next.users_total().unwrap(), state.users_total().unwrap());
    }

    #[test]
    fn test_transfer_to_unknown_user_fails() {
        let state = ledger(&[("Alice", 200)]);

        let result = transfer(
            &state,
            coins(10),
            &Username::new("Alice"),
            &Username::new("Ghost"),
            1,
        );

        assert_eq!(result, Err(LedgerError::unknown_user("Ghost")));
    }

    #[test]
    fn test_transfer_from_unknown_user_fails() {
        let state = ledger(&[("Bob", 0)]);

        let result = transfer(
            &state,
            coins(10),
            &Username::new("Ghost"),
            &Username::new("Bob"),
            1,
        );

        assert_eq!(result, Err(LedgerError::unknown_user("Ghost")));
    }

    #[rstest]
    #[case::positive(10)]
    #[case::zero(0)]
    #[case::negative(-5)]
    fn test_transfer_to_self_is_ignored(#[case] amount: i64) {
        let state = ledger(&[("Alice", 200)]);

        let outcome = transfer(
            &state,
            coins(amount),
            &Username::new("Alice"),
            &Username::new("Alice"),
            1,
        )
        .unwrap();

        assert_eq!(outcome, TransferOutcome::Ignored);
    }

    #[rstest]
    #[case("@bank-interest")]
    #[case("Bank Interest")]
    fn test_transfer_with_reserved_actor_fails(#[case] reserved: &str) {
        let state = ledger(&[("Alice", 200)]);

        let result = transfer(
            &state,
            coins(10),
            &Username::new(reserved),
            &Username::new("Alice"),
            1,
        );

        assert_eq!(result, Err(LedgerError::reserved_actor(reserved)));
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    fn test_non_positive_amount_fails(#[case] amount: i64) {
        let state = ledger(&[("Alice", 200), ("Bob", 0)]);

        let result = transfer(
            &state,
            coins(amount),
            &Username::new("Alice"),
            &Username::new("Bob"),
            1,
        );

        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    #[test]
    fn test_watermark_never_moves_backward() {
        let mut state = ledger(&[("Alice", 200), ("Bob", 0)]);
        state.last_processed_timestamp = 5000;

        let outcome = transfer(
            &state,
            coins(1),
            &Username::new("Alice"),
            &Username::new("Bob"),
            4000,
        )
        .unwrap();
        let (next, _) = applied(outcome);

        assert_eq!(next.last_processed_timestamp, 5000);
    }

    #[test]
    fn test_transfer_does_not_touch_drift() {
        let mut state = ledger(&[("Alice", 200), ("Bob", 0)]);
        state.drift = coins(12);
        state.balance = coins(212);

        let outcome = transfer(
            &state,
            coins(100),
            &Username::new("Alice"),
            &Username::new("Bob"),
            1,
        )
        .unwrap();
        let (next, _) = applied(outcome);

        assert_eq!(next.drift, coins(12));
        assert_eq!(next.balance, coins(212));
    }
}
