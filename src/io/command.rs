//! Text command channel
//!
//! One command per line:
//! - `reload` fetches the feed now
//! - `transfer;<amount>;<from>;<to>` moves part of a share between members
//! - `report` prints the text report
//!
//! Blank lines are not commands.

use crate::types::{LedgerError, Username};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Reload,
    Transfer {
        amount: Decimal,
        sender: Username,
        receiver: Username,
    },
    Report,
}

/// Parse one input line, `None` for a blank line
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, LedgerError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

impl FromStr for ConsoleCommand {
    type Err = LedgerError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split(';').map(str::trim);

        match parts.next() {
            Some("reload") if parts.next().is_none() => Ok(ConsoleCommand::Reload),
            Some("report") if parts.next().is_none() => Ok(ConsoleCommand::Report),
            Some("transfer") => {
                let fields: Vec<&str> = parts.collect();
                let [amount, sender, receiver] = fields.as_slice() else {
                    return Err(LedgerError::invalid_command(
                        input,
                        "expected transfer;<amount>;<from>;<to>",
                    ));
                };

                let amount = Decimal::from_str(amount).map_err(|_| {
                    LedgerError::invalid_command(input, format!("'{amount}' is not an amount"))
                })?;
                if sender.is_empty() || receiver.is_empty() {
                    return Err(LedgerError::invalid_command(input, "empty member name"));
                }

                Ok(ConsoleCommand::Transfer {
                    amount,
                    sender: Username::new(*sender),
                    receiver: Username::new(*receiver),
                })
            }
            _ => Err(LedgerError::invalid_command(input, "unknown command")),
        }
    }
}
