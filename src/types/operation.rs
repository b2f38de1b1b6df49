//! Ledger operation types
//!
//! An [`Operation`] is one reconciled ledger entry. Its serialized form is a
//! flat JSON object tagged by `kind`, matching the on-disk ledger format:
//!
//! ```json
//! { "kind": "PLAYER_PURSE", "amount": -250, "username": "Alice", "timestamp": 1700000000000, "repeatCount": 1 }
//! ```

use super::error::LedgerError;
use super::username::Username;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event time in epoch milliseconds
pub type Timestamp = u64;

/// What an operation records, with the fields that belong to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// A member deposit (positive amount) or withdrawal (negative amount)
    PlayerPurse { amount: Decimal, username: Username },

    /// Money moved between two members by hand
    ///
    /// `amount` is positive and credited to `receiver`.
    PlayerTransfer {
        amount: Decimal,
        receiver: Username,
        sender: Username,
    },

    /// Interest credited by the bank
    BankInterest { amount: Decimal },

    /// The feed returned a full page, older transactions may be missing
    AnomalyMarker,
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OperationRecord", into = "OperationRecord")]
pub struct Operation {
    pub kind: OperationKind,

    pub timestamp: Timestamp,

    /// Number of identical consecutive records collapsed into this entry
    pub repeat_count: u32,
}

/// `kind` tag of a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum OperationTag {
    PlayerPurse,
    PlayerTransfer,
    #[serde(rename = "BANK_INTERESTS")]
    BankInterest,
    #[serde(rename = "WEIRD_WAYPOINT")]
    AnomalyMarker,
}

/// Flat on-disk shape of an [`Operation`]
///
/// Plain fields only: amounts are exact JSON numbers, and those cannot go
/// through serde's buffered `flatten` or internally tagged representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationRecord {
    kind: OperationTag,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount: Option<Decimal>,
    /// Member for purse entries, receiver for transfers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<Username>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<Username>,
    #[serde(default = "default_repeat_count")]
    repeat_count: u32,
}

fn default_repeat_count() -> u32 {
    1
}

impl From<Operation> for OperationRecord {
    fn from(operation: Operation) -> Self {
        let (kind, amount, username, sender) = match operation.kind {
            OperationKind::PlayerPurse { amount, username } => {
                (OperationTag::PlayerPurse, Some(amount), Some(username), None)
            }
            OperationKind::PlayerTransfer {
                amount,
                receiver,
                sender,
            } => (
                OperationTag::PlayerTransfer,
                Some(amount),
                Some(receiver),
                Some(sender),
            ),
            OperationKind::BankInterest { amount } => {
                (OperationTag::BankInterest, Some(amount), None, None)
            }
            OperationKind::AnomalyMarker => (OperationTag::AnomalyMarker, None, None, None),
        };
        OperationRecord {
            kind,
            timestamp: operation.timestamp,
            amount,
            username,
            sender,
            repeat_count: operation.repeat_count,
        }
    }
}

impl TryFrom<OperationRecord> for Operation {
    type Error = String;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        let tag = record.kind;
        let missing = |field: &str| format!("{tag:?} entry without {field}");
        let kind = match tag {
            OperationTag::PlayerPurse => OperationKind::PlayerPurse {
                amount: record.amount.ok_or_else(|| missing("amount"))?,
                username: record.username.ok_or_else(|| missing("username"))?,
            },
            OperationTag::PlayerTransfer => OperationKind::PlayerTransfer {
                amount: record.amount.ok_or_else(|| missing("amount"))?,
                receiver: record.username.ok_or_else(|| missing("username"))?,
                sender: record.sender.ok_or_else(|| missing("sender"))?,
            },
            OperationTag::BankInterest => OperationKind::BankInterest {
                amount: record.amount.ok_or_else(|| missing("amount"))?,
            },
            OperationTag::AnomalyMarker => OperationKind::AnomalyMarker,
        };
        Ok(Operation {
            kind,
            timestamp: record.timestamp,
            repeat_count: record.repeat_count,
        })
    }
}

impl Operation {
    pub fn new(kind: OperationKind, timestamp: Timestamp) -> Self {
        Operation {
            kind,
            timestamp,
            repeat_count: 1,
        }
    }

    pub fn purse(username: Username, amount: Decimal, timestamp: Timestamp) -> Self {
        Self::new(OperationKind::PlayerPurse { amount, username }, timestamp)
    }

    pub fn transfer(
        sender: Username,
        receiver: Username,
        amount: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self::new(
            OperationKind::PlayerTransfer {
                amount,
                receiver,
                sender,
            },
            timestamp,
        )
    }

    pub fn bank_interest(amount: Decimal, timestamp: Timestamp) -> Self {
        Self::new(OperationKind::BankInterest { amount }, timestamp)
    }

    pub fn anomaly_marker(timestamp: Timestamp) -> Self {
        Self::new(OperationKind::AnomalyMarker, timestamp)
    }

    /// Signed amount of a single occurrence, zero for markers
    pub fn amount(&self) -> Decimal {
        match &self.kind {
            OperationKind::PlayerPurse { amount, .. }
            | OperationKind::PlayerTransfer { amount, .. }
            | OperationKind::BankInterest { amount } => *amount,
            OperationKind::AnomalyMarker => Decimal::ZERO,
        }
    }

    /// Signed amount of all collapsed occurrences
    pub fn total_amount(&self) -> Result<Decimal, LedgerError> {
        self.amount()
            .checked_mul(Decimal::from(self.repeat_count))
            .ok_or_else(|| {
                LedgerError::arithmetic_overflow(
                    "repeat",
                    self.username().map_or("bank", Username::as_str),
                )
            })
    }

    /// Member credited or debited by this operation (receiver for transfers)
    pub fn username(&self) -> Option<&Username> {
        match &self.kind {
            OperationKind::PlayerPurse { username, .. } => Some(username),
            OperationKind::PlayerTransfer { receiver, .. } => Some(receiver),
            OperationKind::BankInterest { .. } | OperationKind::AnomalyMarker => None,
        }
    }

    pub fn sender(&self) -> Option<&Username> {
        match &self.kind {
            OperationKind::PlayerTransfer { sender, .. } => Some(sender),
            _ => None,
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self.kind, OperationKind::PlayerPurse { amount, .. } if amount > Decimal::ZERO)
    }

    pub fn is_withdrawal(&self) -> bool {
        matches!(self.kind, OperationKind::PlayerPurse { amount, .. } if amount < Decimal::ZERO)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OperationKind::PlayerPurse { amount, username } if amount.is_sign_negative() => {
                write!(f, "{username} withdrew {}", amount.abs())?
            }
            OperationKind::PlayerPurse { amount, username } => {
                write!(f, "{username} deposited {amount}")?
            }
            OperationKind::PlayerTransfer {
                amount,
                receiver,
                sender,
            } => write!(f, "{sender} transferred {amount} to {receiver}")?,
            OperationKind::BankInterest { amount } => write!(f, "bank interest {amount}")?,
            OperationKind::AnomalyMarker => f.write_str("feed page full, transactions may be missing")?,
        }
        if self.repeat_count > 1 {
            write!(f, " (x{})", self.repeat_count)?;
        }
        Ok(())
    }
}
