//! I/O module
//!
//! Everything that crosses the process boundary.
//!
//! # Components
//!
//! - `json_store` - Atomic read/write of the ledger file
//! - `hypixel` - Hypixel API client and profile decoding
//! - `report_format` - Text, CSV and JSON rendering of reports
//! - `command` - Parsing of the text command channel

pub mod command;
pub mod hypixel;
pub mod json_store;
pub mod report_format;

pub use command::{parse_command, ConsoleCommand};
pub use hypixel::{decode_profile, HypixelFeed, DEFAULT_API_URL};
pub use report_format::{write_balances_csv, write_report_json, write_report_text};
