//! Hypixel SkyBlock profile feed
//!
//! Fetches `GET {base}/v2/skyblock/profile?key=…&profile=…` and turns the
//! answer into a [`FeedSnapshot`]. Decoding is kept apart from transport so
//! it can be exercised on fixtures.
//!
//! The API returns at most [`crate::types::FEED_PAGE_LIMIT`] bank
//! transactions, newest included, with no paging.

use crate::core::traits::FeedSource;
use crate::types::{FeedSnapshot, LedgerError, RawTransaction};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.hypixel.net";

const PROFILE_PATH: &str = "/v2/skyblock/profile";

/// Bank capacity unlocked by each upgrade task
pub const BANK_UPGRADES: [(&str, u64); 7] = [
    ("BANK_UPGRADE_STARTER", 5_000_000),
    ("BANK_UPGRADE_GOLD", 100_000_000),
    ("BANK_UPGRADE_DELUXE", 250_000_000),
    ("BANK_UPGRADE_SUPER_DELUXE", 500_000_000),
    ("BANK_UPGRADE_PREMIER", 1_000_000_000),
    ("BANK_UPGRADE_LUXURIOUS", 6_000_000_000),
    ("BANK_UPGRADE_PALATIAL", 60_000_000_000),
];

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    /// Keyed by member UUID
    #[serde(default)]
    pub members: HashMap<String, Member>,
    /// Absent when the co-op disabled the banking API setting
    #[serde(default)]
    pub banking: Option<Banking>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub leveling: Leveling,
}

#[derive(Debug, Default, Deserialize)]
pub struct Leveling {
    #[serde(default)]
    pub completed_tasks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Banking {
    pub balance: Decimal,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// Highest bank capacity unlocked by any of `tasks`, 0 if none
pub fn bank_capacity<'a>(tasks: impl IntoIterator<Item = &'a str>) -> u64 {
    tasks
        .into_iter()
        .filter_map(|task| {
            BANK_UPGRADES
                .iter()
                .find(|(name, _)| *name == task)
                .map(|(_, capacity)| *capacity)
        })
        .max()
        .unwrap_or(0)
}

impl ProfileResponse {
    /// Extract the bank page and capacity
    ///
    /// # Errors
    ///
    /// Returns `FeedFetch` when the API reports a failure or the profile has
    /// no banking data.
    pub fn into_snapshot(self) -> Result<FeedSnapshot, LedgerError> {
        if !self.success {
            let cause = self.cause.as_deref().unwrap_or("no cause given");
            return Err(LedgerError::feed_fetch(format!("API refused the request: {cause}")));
        }

        let profile = self
            .profile
            .ok_or_else(|| LedgerError::feed_fetch("response has no profile"))?;
        let banking = profile
            .banking
            .ok_or_else(|| LedgerError::feed_fetch("profile has no banking data"))?;

        let max_balance = bank_capacity(
            profile
                .members
                .values()
                .flat_map(|member| member.leveling.completed_tasks.iter().map(String::as_str)),
        );

        Ok(FeedSnapshot {
            transactions: banking.transactions,
            balance: banking.balance,
            max_balance,
        })
    }
}

/// Decode a raw profile response body
pub fn decode_profile(body: &str) -> Result<FeedSnapshot, LedgerError> {
    let response: ProfileResponse = serde_json::from_str(body)
        .map_err(|e| LedgerError::feed_fetch(format!("undecodable profile response: {e}")))?;
    response.into_snapshot()
}

/// Feed backed by the Hypixel API
pub struct HypixelFeed {
    client: Client,
    url: String,
    api_key: String,
    profile: String,
}

impl HypixelFeed {
    /// # Arguments
    ///
    /// * `base_url` - API root, [`DEFAULT_API_URL`] in production
    /// * `api_key` - Hypixel developer key
    /// * `profile` - SkyBlock profile UUID of the co-op
    /// * `timeout` - Transport timeout of one request
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coop-ledger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HypixelFeed {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), PROFILE_PATH),
            api_key: api_key.into(),
            profile: profile.into(),
        })
    }
}

#[async_trait]
impl FeedSource for HypixelFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, LedgerError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("key", self.api_key.as_str()), ("profile", self.profile.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "profile response received");

        if !status.is_success() {
            // Error answers still carry a JSON cause
            let cause = serde_json::from_str::<ProfileResponse>(&body)
                .ok()
                .and_then(|r| r.cause)
                .unwrap_or_else(|| "no cause given".to_string());
            return Err(LedgerError::feed_fetch(format!("HTTP {status}: {cause}")));
        }

        decode_profile(&body)
    }
}
