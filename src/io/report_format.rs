//! Rendering of ledger reports
//!
//! Three renderers for a [`Report`]:
//! - text, for people reading a terminal
//! - CSV of member balances and their 24h deltas
//! - JSON, the report as-is
//!
//! Amounts in the text renderer are rounded to whole coins and grouped by
//! thousands with spaces (`1 250 000`). Times are shown as `%H:%M %d/%m` UTC.

use crate::core::report::Report;
use crate::types::{LedgerError, Timestamp};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Write;

/// Round to whole coins and group thousands with spaces
pub fn format_coins(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Like [`format_coins`], with an explicit `+` on gains
pub fn format_signed_coins(amount: Decimal) -> String {
    let formatted = format_coins(amount);
    if formatted.starts_with('-') || formatted == "0" {
        formatted
    } else {
        format!("+{formatted}")
    }
}

/// Epoch milliseconds as `HH:MM dd/mm` in UTC
pub fn format_timestamp(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%H:%M %d/%m").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Write the human readable report
pub fn write_report_text(report: &Report, output: &mut dyn Write) -> Result<(), LedgerError> {
    match report.completion {
        Some(completion) => writeln!(
            output,
            "Balance: {} / {} ({}%)",
            format_coins(report.balance),
            format_coins(Decimal::from(report.max_balance)),
            completion
        )?,
        None => writeln!(output, "Balance: {}", format_coins(report.balance))?,
    }
    writeln!(output, "Bank interest: {}", format_coins(report.bank_interest))?;
    if report.drift_is_important {
        writeln!(output, "Drift: {} (!)", format_coins(report.drift))?;
    } else {
        writeln!(output, "Drift: {}", format_coins(report.drift))?;
    }
    writeln!(
        output,
        "Last transaction: {}",
        format_timestamp(report.last_transaction_timestamp)
    )?;
    writeln!(
        output,
        "Last check: {}",
        report
            .last_check
            .map(format_timestamp)
            .unwrap_or_else(|| "never".to_string())
    )?;

    writeln!(output)?;
    writeln!(output, "Members:")?;
    for user in &report.users {
        writeln!(output, "  {:<16} {:>16}", user.username, format_coins(user.balance))?;
    }

    if !report.deltas.is_empty() {
        writeln!(output)?;
        writeln!(output, "Last 24h:")?;
        for delta in &report.deltas {
            writeln!(
                output,
                "  {:<16} {:>16}",
                delta.username,
                format_signed_coins(delta.delta)
            )?;
        }
    }

    writeln!(output)?;
    writeln!(
        output,
        "Operations ({} of {}):",
        report.operations.len(),
        report.total_operations
    )?;
    for operation in &report.operations {
        writeln!(
            output,
            "  {}  {}",
            format_timestamp(operation.timestamp),
            operation
        )?;
    }

    output.flush()?;
    Ok(())
}

/// Write member balances as CSV
///
/// Columns: `username,balance,delta`. Rows follow the report's balance
/// order; members without a recent change get a delta of 0.
pub fn write_balances_csv(report: &Report, output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["username", "balance", "delta"])?;

    for user in &report.users {
        let delta = report
            .deltas
            .iter()
            .find(|delta| delta.username == user.username)
            .map(|delta| delta.delta)
            .unwrap_or(Decimal::ZERO);

        writer.write_record(&[
            user.username.to_string(),
            user.balance.normalize().to_string(),
            delta.normalize().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the report as pretty-printed JSON
pub fn write_report_json(report: &Report, output: &mut dyn Write) -> Result<(), LedgerError> {
    serde_json::to_writer_pretty(&mut *output, report)?;
    writeln!(output)?;
    Ok(())
}
