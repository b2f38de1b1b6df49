//! Periodic feed polling
//!
//! The `Poller` fetches the external feed on a fixed interval, or right away
//! when asked through a [`PollerHandle`], and hands each snapshot to the
//! [`LedgerHandle`]. The network fetch happens here, outside of the ledger
//! service, so a slow API never blocks transfers or reports.
//!
//! Fetch and reconciliation errors are logged and the loop carries on with the
//! next tick. The loop ends once the ledger service has stopped.

use super::service::LedgerHandle;
use crate::core::reconciler::Reconciliation;
use crate::core::traits::FeedSource;
use crate::types::LedgerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Poll timing
#[derive(Clone, Debug, PartialEq)]
pub struct PollerConfig {
    /// Time between two fetches
    pub interval: Duration,
    /// Time after which a fetch is abandoned
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl PollerConfig {
    /// Create a PollerConfig, replacing zero durations by the defaults
    pub fn new(interval: Duration, fetch_timeout: Duration) -> Self {
        let default = Self::default();

        let interval = if interval.is_zero() {
            warn!(
                default_secs = default.interval.as_secs(),
                "invalid poll interval 0, using default"
            );
            default.interval
        } else {
            interval
        };

        let fetch_timeout = if fetch_timeout.is_zero() {
            warn!(
                default_secs = default.fetch_timeout.as_secs(),
                "invalid fetch timeout 0, using default"
            );
            default.fetch_timeout
        } else {
            fetch_timeout
        };

        Self {
            interval,
            fetch_timeout,
        }
    }
}

/// Trigger for an immediate poll
#[derive(Debug, Clone)]
pub struct PollerHandle {
    refresh: Arc<Notify>,
}

impl PollerHandle {
    /// Ask the poller to fetch now instead of waiting for the next tick
    ///
    /// Requests made while a fetch is running collapse into one extra fetch.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }
}

/// Feed polling loop
pub struct Poller {
    feed: Arc<dyn FeedSource>,
    ledger: LedgerHandle,
    config: PollerConfig,
    refresh: Arc<Notify>,
}

impl Poller {
    pub fn new(
        feed: impl FeedSource + 'static,
        ledger: LedgerHandle,
        config: PollerConfig,
    ) -> (Self, PollerHandle) {
        let refresh = Arc::new(Notify::new());
        let poller = Poller {
            feed: Arc::new(feed),
            ledger,
            config,
            refresh: Arc::clone(&refresh),
        };
        (poller, PollerHandle { refresh })
    }

    /// Fetch once and reconcile the result
    ///
    /// # Errors
    ///
    /// * `FeedFetch` - the fetch failed or timed out
    /// * any reconciliation error, see [`LedgerHandle::reconcile`]
    pub async fn poll_once(&self) -> Result<Reconciliation, LedgerError> {
        debug!("fetching feed");
        let snapshot = time::timeout(self.config.fetch_timeout, self.feed.fetch())
            .await
            .map_err(|_| {
                LedgerError::feed_fetch(format!(
                    "no answer within {}ms",
                    self.config.fetch_timeout.as_millis()
                ))
            })??;
        debug!(
            transactions = snapshot.transactions.len(),
            balance = %snapshot.balance,
            "feed fetched"
        );
        self.ledger.reconcile(snapshot).await
    }

    /// Poll until the ledger service stops
    ///
    /// The first poll happens immediately.
    pub async fn run(self) {
        let mut ticker = time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.config.interval.as_secs(),
            "poller started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {
                    debug!("refresh requested");
                    ticker.reset();
                }
            }

            match self.poll_once().await {
                Ok(reconciliation) => info!(
                    accepted = reconciliation.accepted,
                    truncated = reconciliation.truncated,
                    "poll complete"
                ),
                Err(LedgerError::ServiceUnavailable) => break,
                Err(e) => error!(error = %e, "poll failed"),
            }
        }

        info!("poller stopped");
    }
}
