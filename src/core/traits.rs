//! Core traits for time and feed access
//!
//! This module defines the seams that let the ledger run against the real
//! clock and the real external source in production, and against fixed
//! values in tests.

use crate::types::{FeedSnapshot, LedgerError, Timestamp};
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current process time
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Trait for fetching one page of the external feed
///
/// Implementations return `LedgerError::FeedFetch` on any transport or API
/// failure; callers skip the cycle instead of touching the ledger.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot, LedgerError>;
}
