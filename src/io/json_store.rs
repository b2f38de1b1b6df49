//! JSON persistence of the ledger file
//!
//! The whole [`LedgerState`] is read at once and written at once. Writes go
//! to a temporary file in the same directory which is then renamed over the
//! ledger, so a reader never sees a half-written file.

use crate::types::{LedgerError, LedgerState};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read the ledger file
///
/// # Errors
///
/// * `FileNotFound` - nothing exists at `path`
/// * `Io` - the file could not be read
/// * `Serialization` - the file is not a valid ledger document
pub fn read_ledger(path: &Path) -> Result<LedgerState, LedgerError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LedgerError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => e.into(),
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Replace the ledger file with `state`
pub fn write_ledger(path: &Path, state: &LedgerState) -> Result<(), LedgerError> {
    let file = write_temp(path, state)?;
    file.persist(path).map_err(|e| LedgerError::from(e.error))?;
    Ok(())
}

/// Write `state` to `path`, failing if a file already exists there
pub fn create_ledger(path: &Path, state: &LedgerState) -> Result<(), LedgerError> {
    let file = write_temp(path, state)?;
    file.persist_noclobber(path)
        .map_err(|e| LedgerError::from(e.error))?;
    Ok(())
}

fn write_temp(path: &Path, state: &LedgerState) -> Result<NamedTempFile, LedgerError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut file, state)?;
    file.flush()?;
    file.as_file().sync_all()?;
    Ok(file)
}
