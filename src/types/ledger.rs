//! Persisted ledger aggregate
//!
//! [`LedgerState`] is the single structured record stored on disk. Field names
//! on disk follow the existing data file layout (`lastTransactionTimestamp`,
//! `maxBalance`, `bankInterests`, ...).

use super::error::LedgerError;
use super::operation::{Operation, Timestamp};
use super::username::Username;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version this build reads and writes
pub const LEDGER_VERSION: u64 = 3;

/// Drift above this many coins is worth a warning
pub const DRIFT_TOLERANCE: Decimal = Decimal::ONE;

/// Reconciled state of the shared bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    /// Schema tag, a missing tag reads as 0
    #[serde(default)]
    pub version: u64,

    /// Watermark: timestamp of the last raw record taken into account
    #[serde(rename = "lastTransactionTimestamp", default)]
    pub last_processed_timestamp: Timestamp,

    /// Last balance reported by the external source
    #[serde(default)]
    pub balance: Decimal,

    /// Last bank capacity reported by the external source
    #[serde(rename = "maxBalance", default)]
    pub max_balance: u64,

    /// |balance - (sum of users + interest)| as of the last reconciliation
    #[serde(default)]
    pub drift: Decimal,

    /// Running total of interest credits
    #[serde(rename = "bankInterests", default)]
    pub bank_interest: Decimal,

    /// Share of the balance owned by each member
    #[serde(default)]
    pub users: BTreeMap<Username, Decimal>,

    /// Ledger entries, oldest first
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl LedgerState {
    /// Create an empty ledger at the current schema version
    pub fn new() -> Self {
        LedgerState {
            version: LEDGER_VERSION,
            last_processed_timestamp: 0,
            balance: Decimal::ZERO,
            max_balance: 0,
            drift: Decimal::ZERO,
            bank_interest: Decimal::ZERO,
            users: BTreeMap::new(),
            operations: Vec::new(),
        }
    }

    /// Sum of every member balance
    pub fn users_total(&self) -> Result<Decimal, LedgerError> {
        self.users
            .iter()
            .try_fold(Decimal::ZERO, |total, (username, balance)| {
                total.checked_add(*balance).ok_or_else(|| {
                    LedgerError::arithmetic_overflow("users total", username.as_str())
                })
            })
    }

    /// Member balances plus interest: what the ledger accounts for
    pub fn accounted(&self) -> Result<Decimal, LedgerError> {
        self.users_total()?
            .checked_add(self.bank_interest)
            .ok_or_else(|| LedgerError::arithmetic_overflow("interest", "bank"))
    }

    /// Distance between `balance` and what the ledger accounts for
    pub fn compute_drift(&self, balance: Decimal) -> Result<Decimal, LedgerError> {
        let accounted = self.accounted()?;
        balance
            .checked_sub(accounted)
            .map(|drift| drift.abs())
            .ok_or_else(|| LedgerError::arithmetic_overflow("drift", "bank"))
    }

    pub fn has_user(&self, username: &Username) -> bool {
        self.users.contains_key(username)
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}
