use crate::core::r#async::PollerConfig;
use crate::core::report::DEFAULT_OPERATION_LIMIT;
use crate::io::hypixel::DEFAULT_API_URL;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Keep a co-op bank account's shares in sync with its transaction feed
#[derive(Parser, Debug)]
#[command(name = "coop-ledger")]
#[command(about = "Track each member's share of a shared bank account", long_about = None)]
pub struct CliArgs {
    /// Ledger file path
    #[arg(
        long = "data-file",
        value_name = "PATH",
        env = "COOP_LEDGER_FILE",
        default_value = "data.json",
        global = true
    )]
    pub data_file: PathBuf,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Create an empty ledger file
    Init,
    /// Fetch the feed once and reconcile it
    Reconcile(FeedArgs),
    /// Move part of a member's share to another member
    Transfer {
        #[arg(value_name = "AMOUNT", allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(value_name = "FROM")]
        sender: String,
        #[arg(value_name = "TO")]
        receiver: String,
    },
    /// Print the ledger
    Report {
        #[arg(long = "format", value_name = "FORMAT", default_value = "text")]
        format: ReportFormat,
        /// Number of ledger entries to show
        #[arg(long = "limit", value_name = "COUNT", default_value_t = DEFAULT_OPERATION_LIMIT)]
        limit: usize,
    },
    /// Poll the feed and read commands from stdin
    Serve(FeedArgs),
}

/// Output formats of `report`
#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Csv,
    Json,
}

/// Access to the Hypixel API and poll timing
#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Hypixel API key
    #[arg(long = "api-key", value_name = "KEY", env = "HYPIXEL_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// SkyBlock profile UUID of the co-op
    #[arg(long = "profile", value_name = "UUID", env = "PROFILE_UUID")]
    pub profile: String,

    /// API root URL
    #[arg(
        long = "api-url",
        value_name = "URL",
        env = "HYPIXEL_API_URL",
        default_value = DEFAULT_API_URL
    )]
    pub api_url: String,

    /// Seconds between two polls (serve only)
    #[arg(
        long = "interval-secs",
        value_name = "SECS",
        env = "COOP_LEDGER_INTERVAL_SECS",
        help = "Seconds between two polls (default: 600)"
    )]
    pub interval_secs: Option<u64>,

    /// Seconds before a fetch is abandoned
    #[arg(
        long = "fetch-timeout-secs",
        value_name = "SECS",
        help = "Seconds before a fetch is abandoned (default: 30)"
    )]
    pub fetch_timeout_secs: Option<u64>,
}

impl FeedArgs {
    /// Create a PollerConfig from CLI arguments
    ///
    /// Missing values use the defaults; zero values are replaced by the
    /// defaults with a warning.
    pub fn to_poller_config(&self) -> PollerConfig {
        if self.interval_secs.is_some() || self.fetch_timeout_secs.is_some() {
            let default = PollerConfig::default();
            PollerConfig::new(
                self.interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(default.interval),
                self.fetch_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(default.fetch_timeout),
            )
        } else {
            PollerConfig::default()
        }
    }
}
