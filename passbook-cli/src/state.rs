use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn passbook_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PASSBOOK_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".passbook"))
}

pub fn ensure_passbook_home() -> Result<PathBuf> {
    let dir = passbook_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// The durable month-keyed ledger file.
pub fn default_ledger_path() -> Result<PathBuf> {
    Ok(ensure_passbook_home()?.join("ledger.json"))
}

/// The query-side filtered snapshot, rewritten after each selection.
pub fn default_filtered_path() -> Result<PathBuf> {
    Ok(ensure_passbook_home()?.join("filtered_transactions.json"))
}
