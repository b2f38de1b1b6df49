//! Raw feed types
//!
//! These mirror what the external source reports for the shared bank account,
//! before any normalization or classification.

use super::operation::Timestamp;
use super::username::StyledUsername;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of transactions the feed returns per page
///
/// A batch of this size may hide older, never-seen transactions.
pub const FEED_PAGE_LIMIT: usize = 50;

/// Direction of a raw bank transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionAction {
    /// Coins moved from a purse into the bank
    Deposit,
    /// Coins moved from the bank into a purse
    Withdraw,
}

/// One raw transaction as reported by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Unsigned amount, the direction is given by `action`
    pub amount: Decimal,
    pub timestamp: Timestamp,
    pub action: TransactionAction,
    pub initiator_name: StyledUsername,
}

impl RawTransaction {
    pub fn new(
        action: TransactionAction,
        amount: Decimal,
        timestamp: Timestamp,
        initiator_name: &str,
    ) -> Self {
        RawTransaction {
            amount,
            timestamp,
            action,
            initiator_name: StyledUsername::new(initiator_name),
        }
    }

    pub fn deposit(amount: Decimal, timestamp: Timestamp, initiator_name: &str) -> Self {
        Self::new(TransactionAction::Deposit, amount, timestamp, initiator_name)
    }

    pub fn withdraw(amount: Decimal, timestamp: Timestamp, initiator_name: &str) -> Self {
        Self::new(TransactionAction::Withdraw, amount, timestamp, initiator_name)
    }
}

/// Everything one fetch cycle learns from the external source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    /// Page of raw transactions, in whatever order the source returned them
    pub transactions: Vec<RawTransaction>,
    /// Authoritative bank balance
    pub balance: Decimal,
    /// Bank capacity derived from the co-op's upgrades
    pub max_balance: u64,
}
