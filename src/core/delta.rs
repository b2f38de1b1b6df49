//! Recent balance changes per member
//!
//! Answers "who put in or took out how much lately" by summing the ledger
//! entries of a trailing time window.

use crate::types::{LedgerError, Operation, OperationKind, Timestamp, Username};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default trailing window: 24 hours
pub const DELTA_WINDOW_MILLIS: u64 = 86_400_000;

/// Net change of one member's balance over the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDelta {
    pub username: Username,
    pub delta: Decimal,
}

/// Compute net balance changes over the `window` preceding `now`
///
/// The ledger is scanned from newest to oldest; the first operation at least
/// `window` old is the boundary and every operation after it is recent. When
/// no operation is that old, the whole ledger is recent.
///
/// Purse operations count for their member, transfers for their receiver,
/// each multiplied by its repeat count. Interest and markers are ignored.
///
/// Members whose net change is zero are left out. The result is sorted by
/// delta, largest first, ties broken by username.
///
/// # Errors
///
/// `ArithmeticOverflow` if a member's sum does not fit a decimal.
pub fn deltas(
    operations: &[Operation],
    now: Timestamp,
    window: u64,
) -> Result<Vec<UserDelta>, LedgerError> {
    let recent = match operations
        .iter()
        .rposition(|op| now.saturating_sub(op.timestamp) >= window)
    {
        Some(boundary) => &operations[boundary + 1..],
        None => operations,
    };

    let mut totals: BTreeMap<&Username, Decimal> = BTreeMap::new();
    for operation in recent {
        let username = match &operation.kind {
            OperationKind::PlayerPurse { username, .. } => username,
            OperationKind::PlayerTransfer { receiver, .. } => receiver,
            OperationKind::BankInterest { .. } | OperationKind::AnomalyMarker => continue,
        };
        let total = totals.entry(username).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(operation.total_amount()?)
            .ok_or_else(|| LedgerError::arithmetic_overflow("delta", username.as_str()))?;
    }

    let mut result: Vec<UserDelta> = totals
        .into_iter()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(username, delta)| UserDelta {
            username: username.clone(),
            delta,
        })
        .collect();
    result.sort_by(|a, b| {
        b.delta
            .cmp(&a.delta)
            .then_with(|| a.username.cmp(&b.username))
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HOUR: u64 = 3_600_000;
    const NOW: u64 = 100 * HOUR;

    fn coins(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn purse(name: &str, amount: i64, timestamp: u64) -> Operation {
        Operation::purse(Username::new(name), coins(amount), timestamp)
    }

    fn as_pairs(deltas: &[UserDelta]) -> Vec<(&str, Decimal)> {
        deltas
            .iter()
            .map(|d| (d.username.as_str(), d.delta))
            .collect()
    }

    #[test]
    fn test_only_operations_after_boundary_count() {
        let operations = vec![
            purse("Alice", 1000, NOW - 48 * HOUR),
            purse("Alice", 500, NOW - 24 * HOUR),
            purse("Alice", 20, NOW - 2 * HOUR),
            purse("Bob", -30, NOW - HOUR),
        ];

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(
            as_pairs(&result),
            vec![("Alice", coins(20)), ("Bob", coins(-30))]
        );
    }

    #[test]
    fn test_whole_ledger_is_recent_without_old_entries() {
        let operations = vec![purse("Alice", 10, NOW - 3 * HOUR), purse("Bob", 5, NOW)];

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(
            as_pairs(&result),
            vec![("Alice", coins(10)), ("Bob", coins(5))]
        );
    }

    #[test]
    fn test_transfers_credit_receiver_and_interest_is_ignored() {
        let operations = vec![
            Operation::transfer(
                Username::new("Alice"),
                Username::new("Bob"),
                coins(40),
                NOW - HOUR,
            ),
            Operation::bank_interest(coins(1000), NOW - HOUR),
            Operation::anomaly_marker(NOW - HOUR),
        ];

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(as_pairs(&result), vec![("Bob", coins(40))]);
    }

    #[test]
    fn test_stacked_operations_count_every_repeat() {
        let mut stacked = purse("Alice", 100, NOW - HOUR);
        stacked.repeat_count = 3;

        let result = deltas(&[stacked], NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(as_pairs(&result), vec![("Alice", coins(300))]);
    }

    #[test]
    fn test_zero_net_change_is_omitted() {
        let operations = vec![
            purse("Alice", 100, NOW - 2 * HOUR),
            purse("Alice", -100, NOW - HOUR),
            purse("Bob", 1, NOW),
        ];

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(as_pairs(&result), vec![("Bob", coins(1))]);
    }

    #[test]
    fn test_sorted_by_delta_then_name() {
        let operations = vec![
            purse("Carol", 5, NOW),
            purse("Bob", 50, NOW),
            purse("Alice", 5, NOW),
            purse("Dave", -10, NOW),
        ];

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS).unwrap();

        assert_eq!(
            as_pairs(&result),
            vec![
                ("Bob", coins(50)),
                ("Alice", coins(5)),
                ("Carol", coins(5)),
                ("Dave", coins(-10)),
            ]
        );
    }

    #[rstest]
    #[case::repeated(vec![(Decimal::MAX, 2)], "repeat")]
    #[case::summed(vec![(Decimal::MAX, 1), (Decimal::MAX, 1)], "delta")]
    fn test_overflowing_sum_is_an_error(
        #[case] entries: Vec<(Decimal, u32)>,
        #[case] expected_operation: &str,
    ) {
        let operations: Vec<Operation> = entries
            .into_iter()
            .map(|(amount, repeat_count)| {
                let mut op = Operation::purse(Username::new("Alice"), amount, NOW);
                op.repeat_count = repeat_count;
                op
            })
            .collect();

        let result = deltas(&operations, NOW, DELTA_WINDOW_MILLIS);

        assert!(matches!(
            result,
            Err(LedgerError::ArithmeticOverflow { operation, .. }) if operation == expected_operation
        ));
    }

    #[test]
    fn test_empty_ledger() {
        assert!(deltas(&[], NOW, DELTA_WINDOW_MILLIS).unwrap().is_empty());
    }
}
