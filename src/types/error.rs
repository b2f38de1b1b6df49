//! Error types for the co-op ledger
//!
//! This module defines all error types that can occur while reconciling the
//! feed, applying transfers, or persisting the ledger.
//!
//! # Error Categories
//!
//! - **Feed Errors**: the external source could not be fetched or decoded
//! - **Schema Errors**: the persisted ledger is not at the supported version
//! - **Record Errors**: a raw feed record cannot be classified
//! - **Transfer Errors**: unknown or reserved users, non-positive amounts
//! - **Storage Errors**: I/O, JSON and CSV failures
//!
//! Drift above tolerance is deliberately not an error, see
//! [`crate::core::reconciler::DriftWarning`].

use crate::types::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
///
/// Every variant leaves the committed ledger untouched: mutations are only
/// swapped in after a successful flush.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The external feed could not be fetched
    ///
    /// The current cycle is skipped and retried on the next tick.
    #[error("Feed fetch failed: {message}")]
    FeedFetch {
        /// Transport, status or API-level cause
        message: String,
    },

    /// The persisted ledger is not at the supported schema version
    ///
    /// Fatal at startup.
    #[error("Unsupported ledger version {found} (expected {expected}): {reason}")]
    SchemaVersion {
        /// Version found on disk
        found: u64,
        /// Version this build operates on
        expected: u64,
        /// Why the version cannot be used
        reason: String,
    },

    /// A raw feed record could not be classified
    ///
    /// Aborts the whole reconciliation cycle, nothing is flushed.
    #[error("Malformed feed record at {timestamp}: {reason}")]
    MalformedRecord {
        /// Timestamp of the offending record
        timestamp: Timestamp,
        /// What is wrong with it
        reason: String,
    },

    /// A transfer references a user absent from the ledger
    #[error("Unknown user '{username}'")]
    UnknownUser {
        /// The missing username
        username: String,
    },

    /// A transfer references the reserved bank interest actor
    #[error("'{username}' is a reserved actor and cannot take part in a transfer")]
    ReservedActor {
        /// The reserved name that was used
        username: String,
    },

    /// A transfer amount is zero or negative
    #[error("Invalid transfer amount {amount}: must be greater than 0")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected to keep balances consistent.
    #[error("Arithmetic overflow in {operation} for '{username}'")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Balance being updated
        username: String,
    },

    /// Ledger file not found at the specified path
    ///
    /// Fatal at startup; `init` creates a fresh ledger.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading or writing the ledger file
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the encoding error
        message: String,
    },

    /// CSV output failed
    #[error("CSV error: {message}")]
    Csv {
        /// Description of the CSV error
        message: String,
    },

    /// A command line could not be parsed
    #[error("Invalid command '{input}': {reason}")]
    InvalidCommand {
        /// The raw command line
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// The ledger service is no longer running
    #[error("Ledger service unavailable")]
    ServiceUnavailable,
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        LedgerError::Csv {
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        LedgerError::FeedFetch {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a FeedFetch error
    pub fn feed_fetch(message: impl Into<String>) -> Self {
        LedgerError::FeedFetch {
            message: message.into(),
        }
    }

    /// Create a SchemaVersion error
    pub fn schema_version(found: u64, expected: u64, reason: &str) -> Self {
        LedgerError::SchemaVersion {
            found,
            expected,
            reason: reason.to_string(),
        }
    }

    /// Create a MalformedRecord error
    pub fn malformed_record(timestamp: Timestamp, reason: impl Into<String>) -> Self {
        LedgerError::MalformedRecord {
            timestamp,
            reason: reason.into(),
        }
    }

    /// Create an UnknownUser error
    pub fn unknown_user(username: &str) -> Self {
        LedgerError::UnknownUser {
            username: username.to_string(),
        }
    }

    /// Create a ReservedActor error
    pub fn reserved_actor(username: &str) -> Self {
        LedgerError::ReservedActor {
            username: username.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, username: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            username: username.to_string(),
        }
    }

    /// Create an InvalidCommand error
    pub fn invalid_command(input: &str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidCommand {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::file_not_found(
        LedgerError::FileNotFound { path: "data.json".to_string() },
        "File not found: data.json"
    )]
    #[case::feed_fetch(
        LedgerError::FeedFetch { message: "timed out".to_string() },
        "Feed fetch failed: timed out"
    )]
    #[case::schema_version(
        LedgerError::SchemaVersion { found: 2, expected: 3, reason: "no migration yet".to_string() },
        "Unsupported ledger version 2 (expected 3): no migration yet"
    )]
    #[case::malformed_record(
        LedgerError::MalformedRecord { timestamp: 1001, reason: "empty initiator name".to_string() },
        "Malformed feed record at 1001: empty initiator name"
    )]
    #[case::unknown_user(
        LedgerError::UnknownUser { username: "Ghost".to_string() },
        "Unknown user 'Ghost'"
    )]
    #[case::reserved_actor(
        LedgerError::ReservedActor { username: "@bank-interest".to_string() },
        "'@bank-interest' is a reserved actor and cannot take part in a transfer"
    )]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { amount: Decimal::new(-5, 0) },
        "Invalid transfer amount -5: must be greater than 0"
    )]
    #[case::invalid_command(
        LedgerError::InvalidCommand { input: "dance".to_string(), reason: "unknown command".to_string() },
        "Invalid command 'dance': unknown command"
    )]
    #[case::arithmetic_overflow(
        LedgerError::ArithmeticOverflow { operation: "transfer".to_string(), username: "Bob".to_string() },
        "Arithmetic overflow in transfer for 'Bob'"
    )]
    #[case::service_unavailable(LedgerError::ServiceUnavailable, "Ledger service unavailable")]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::unknown_user(
        LedgerError::unknown_user("Ghost"),
        LedgerError::UnknownUser { username: "Ghost".to_string() }
    )]
    #[case::reserved_actor(
        LedgerError::reserved_actor("Bank Interest"),
        LedgerError::ReservedActor { username: "Bank Interest".to_string() }
    )]
    #[case::schema_version(
        LedgerError::schema_version(1, 3, "too old"),
        LedgerError::SchemaVersion { found: 1, expected: 3, reason: "too old".to_string() }
    )]
    #[case::malformed_record(
        LedgerError::malformed_record(7, "negative amount"),
        LedgerError::MalformedRecord { timestamp: 7, reason: "negative amount".to_string() }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::Io { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<u64>("not json").unwrap_err();
        let error: LedgerError = json_error.into();
        assert!(matches!(error, LedgerError::Serialization { .. }));
    }
}
