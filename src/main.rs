//! Co-op ledger CLI
//!
//! Keeps track of each member's share of a shared SkyBlock bank account.
//!
//! # Usage
//!
//! ```bash
//! coop-ledger init
//! coop-ledger reconcile --api-key KEY --profile UUID
//! coop-ledger transfer 50000 Alice Bob
//! coop-ledger report --format csv > balances.csv
//! coop-ledger serve --interval-secs 300
//! ```
//!
//! `HYPIXEL_API_KEY`, `PROFILE_UUID` and the other settings can also come
//! from the environment or a `.env` file. Logs go to stderr (`RUST_LOG`
//! controls the level), reports to stdout.
//!
//! # Serve Mode
//!
//! Polls the feed on an interval and reads commands from stdin, one per line:
//! `reload`, `transfer;<amount>;<from>;<to>`, `report`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (unreadable or unsupported ledger, fetch failure, rejected transfer, etc.)

use coop_ledger::cli::{self, CliCommand, FeedArgs, ReportFormat};
use coop_ledger::core::{
    Clock, LedgerHandle, LedgerService, LedgerStore, Poller, PollerHandle, Report, SystemClock,
    TransferOutcome, DEFAULT_OPERATION_LIMIT,
};
use coop_ledger::io::{
    parse_command, write_balances_csv, write_report_json, write_report_text, ConsoleCommand,
    HypixelFeed,
};
use coop_ledger::types::{LedgerError, Username};
use std::path::Path;
use std::process;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(run(args.command, &args.data_file));
    // Do not wait on the blocking stdin reader
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(command: CliCommand, data_file: &Path) -> Result<(), LedgerError> {
    match command {
        CliCommand::Init => {
            LedgerStore::create(data_file)?;
            info!(path = %data_file.display(), "empty ledger created");
        }
        CliCommand::Reconcile(feed_args) => reconcile_once(data_file, &feed_args).await?,
        CliCommand::Transfer {
            amount,
            sender,
            receiver,
        } => {
            let mut store = LedgerStore::open(data_file)?;
            let outcome = store.transfer(
                amount,
                &Username::new(sender),
                &Username::new(receiver),
                SystemClock.now(),
            )?;
            match outcome {
                TransferOutcome::Applied { operation, .. } => println!("{}", operation),
                TransferOutcome::Ignored => {
                    println!("Nothing to do: sender and receiver are the same member")
                }
            }
        }
        CliCommand::Report { format, limit } => {
            let store = LedgerStore::open(data_file)?;
            let report = Report::build(store.state(), SystemClock.now(), None, limit)?;
            let stdout = std::io::stdout();
            let mut output = stdout.lock();
            match format {
                ReportFormat::Text => write_report_text(&report, &mut output)?,
                ReportFormat::Csv => write_balances_csv(&report, &mut output)?,
                ReportFormat::Json => write_report_json(&report, &mut output)?,
            }
        }
        CliCommand::Serve(feed_args) => serve(data_file, &feed_args).await?,
    }
    Ok(())
}

fn start(
    data_file: &Path,
    feed_args: &FeedArgs,
) -> Result<(LedgerHandle, Poller, PollerHandle), LedgerError> {
    let config = feed_args.to_poller_config();
    let store = LedgerStore::open(data_file)?;
    let feed = HypixelFeed::new(
        &feed_args.api_url,
        feed_args.api_key.as_str(),
        feed_args.profile.as_str(),
        config.fetch_timeout,
    )?;
    let ledger = LedgerService::spawn(store, SystemClock);
    let (poller, poller_handle) = Poller::new(feed, ledger.clone(), config);
    Ok((ledger, poller, poller_handle))
}

async fn reconcile_once(data_file: &Path, feed_args: &FeedArgs) -> Result<(), LedgerError> {
    let (_ledger, poller, _) = start(data_file, feed_args)?;
    let reconciliation = poller.poll_once().await?;

    println!(
        "Accepted {} new transaction(s), {} operation(s) in the ledger",
        reconciliation.accepted,
        reconciliation.state.operations.len()
    );
    if reconciliation.truncated {
        println!("Feed page was full: some transactions may be missing");
    }
    if let Some(warning) = reconciliation.drift_warning {
        println!(
            "Drift of {} between the bank balance ({}) and the ledger ({})",
            warning.drift, warning.balance, warning.accounted
        );
    }
    Ok(())
}

async fn serve(data_file: &Path, feed_args: &FeedArgs) -> Result<(), LedgerError> {
    let (ledger, poller, poller_handle) = start(data_file, feed_args)?;
    let poller_task = tokio::spawn(poller.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&line, &ledger, &poller_handle).await,
                None => {
                    info!("stdin closed, stopping");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                break;
            }
        }
    }

    poller_task.abort();
    Ok(())
}

async fn handle_line(line: &str, ledger: &LedgerHandle, poller: &PollerHandle) {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "command rejected");
            return;
        }
    };

    match command {
        ConsoleCommand::Reload => poller.refresh(),
        ConsoleCommand::Transfer {
            amount,
            sender,
            receiver,
        } => match ledger.transfer(amount, sender, receiver).await {
            Ok(TransferOutcome::Applied { operation, .. }) => println!("{}", operation),
            Ok(TransferOutcome::Ignored) => {}
            Err(e) => warn!(error = %e, "transfer rejected"),
        },
        ConsoleCommand::Report => match ledger.report(DEFAULT_OPERATION_LIMIT).await {
            Ok(report) => {
                let stdout = std::io::stdout();
                if let Err(e) = write_report_text(&report, &mut stdout.lock()) {
                    warn!(error = %e, "failed to print report");
                }
            }
            Err(e) => warn!(error = %e, "report unavailable"),
        },
    }
}
