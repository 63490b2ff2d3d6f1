//! Ledger persistence: the single writable source of truth.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::month::MonthKey;
use crate::transaction::Transaction;

/// Owner of the month-keyed ledger.
///
/// `merge` is the only mutation and is write-through: durable state is
/// updated before the call reports success. Implementations serialize
/// writers internally; readers get point-in-time snapshots and must not
/// assume they reflect later merges.
pub trait LedgerStore: Send + Sync {
    /// Append a batch to the ledger and persist it. On error, neither
    /// durable nor in-memory state has changed.
    fn merge(&self, batch: &[Transaction]) -> Result<(), StoreError>;

    /// A read-only copy of current state.
    fn snapshot(&self) -> Ledger;
}

/// Durable store over a single pretty-printed JSON file.
pub struct JsonLedgerStore {
    path: PathBuf,
    inner: Mutex<Ledger>,
}

impl JsonLedgerStore {
    /// Open a store, loading existing state. A missing, unreadable, or
    /// malformed file reinitializes to an empty ledger; that is a silent
    /// data-loss risk, so it is surfaced with an operator warning rather
    /// than an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ledger = load_lenient(&path);
        Self {
            path,
            inner: Mutex::new(ledger),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomic overwrite: write a sibling temp file, then rename over the
    /// durable path, so a crash mid-write never leaves a torn file.
    fn persist(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(ledger)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Persist {
                path: self.path.clone(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Persist {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })
    }
}

impl LedgerStore for JsonLedgerStore {
    fn merge(&self, batch: &[Transaction]) -> Result<(), StoreError> {
        let mut guard = self.locked();

        // Build the next state aside and persist it before committing to
        // memory, so a failed write leaves live state consistent with disk.
        let mut next = guard.clone();
        next.merge_batch(batch.iter().cloned());
        self.persist(&next)?;

        *guard = next;
        Ok(())
    }

    fn snapshot(&self) -> Ledger {
        self.locked().clone()
    }
}

/// In-memory store with the same contract, for tests and injection.
#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Ledger>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            inner: Mutex::new(ledger),
        }
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn merge(&self, batch: &[Transaction]) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.merge_batch(batch.iter().cloned());
        Ok(())
    }

    fn snapshot(&self) -> Ledger {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Read the durable file, salvaging what can be salvaged.
///
/// A well-formed top-level mapping keeps every record that still parses;
/// invalid buckets or records are dropped with a warning. Anything else
/// (missing file, unreadable file, non-mapping JSON) yields an empty
/// ledger.
fn load_lenient(path: &Path) -> Ledger {
    if !path.exists() {
        return Ledger::new();
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            log::warn!(
                "ledger file {} unreadable, starting empty: {err}",
                path.display()
            );
            return Ledger::new();
        }
    };

    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            log::warn!(
                "ledger file {} is not valid JSON, starting empty: {err}",
                path.display()
            );
            return Ledger::new();
        }
    };

    let Some(map) = value.as_object() else {
        log::warn!(
            "ledger file {} is not a month-key mapping, starting empty",
            path.display()
        );
        return Ledger::new();
    };

    let mut ledger = Ledger::new();
    let mut dropped = 0usize;
    for (key, bucket) in map {
        let Ok(month) = key.parse::<MonthKey>() else {
            log::warn!("dropping unrecognized ledger bucket {key:?}");
            continue;
        };
        let Some(items) = bucket.as_array() else {
            log::warn!("dropping non-list ledger bucket {key:?}");
            continue;
        };
        for item in items {
            match serde_json::from_value::<Transaction>(item.clone()) {
                Ok(txn) => ledger.insert_into(month, txn),
                Err(_) => dropped += 1,
            }
        }
    }
    if dropped > 0 {
        log::warn!(
            "dropped {dropped} malformed record(s) while loading {}",
            path.display()
        );
    }
    ledger
}
