//! Username types and initiator normalization
//!
//! The feed reports who initiated a transaction as a styled display name
//! (optionally prefixed by a `§x` color code). Ledger balances are keyed by the
//! bare member name. Both are kept as distinct types so a raw display name can
//! never be used where a normalized username is expected.

use crate::types::{LedgerError, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Styling prefix marker of in-game display names
pub const STYLE_MARKER: char = '§';

/// Display spellings the feed uses for bank interest credits
pub const BANK_INTEREST_SPELLINGS: [&str; 2] = ["Bank Interest", "Bank Interest (x2)"];

/// Name reserved for the bank interest pseudo-actor
pub const RESERVED_ACTOR: &str = "@bank-interest";

/// Raw initiator name as reported by the feed, possibly style-decorated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyledUsername(String);

impl StyledUsername {
    pub fn new(raw: impl Into<String>) -> Self {
        StyledUsername(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyledUsername {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized member name, used as the key of ledger balances
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Username(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name designates the bank interest pseudo-actor
    pub fn is_reserved(&self) -> bool {
        self.0 == RESERVED_ACTOR || BANK_INTEREST_SPELLINGS.contains(&self.0.as_str())
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Username::new(name)
    }
}

/// Who initiated a feed transaction, once normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiator {
    /// Interest credited by the bank itself
    BankInterest,
    /// A co-op member
    Member(Username),
}

impl StyledUsername {
    /// Normalize the display name into an [`Initiator`]
    ///
    /// A leading `§` and the single code point following it are stripped.
    /// `timestamp` only serves error reporting.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the name is empty, or empty once the style
    /// code is removed.
    pub fn normalize(&self, timestamp: Timestamp) -> Result<Initiator, LedgerError> {
        let raw = self.as_str();
        if raw.is_empty() {
            return Err(LedgerError::malformed_record(
                timestamp,
                "empty initiator name",
            ));
        }

        if BANK_INTEREST_SPELLINGS.contains(&raw) {
            return Ok(Initiator::BankInterest);
        }

        let mut chars = raw.chars();
        let name = if chars.next() == Some(STYLE_MARKER) {
            chars.next();
            chars.as_str()
        } else {
            raw
        };

        if name.is_empty() {
            return Err(LedgerError::malformed_record(
                timestamp,
                format!("initiator name '{raw}' is only a style code"),
            ));
        }

        Ok(Initiator::Member(Username::new(name)))
    }
}
