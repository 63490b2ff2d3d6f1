//! Error types for the ledger store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures a `merge` call can surface to its caller.
///
/// Load corruption is deliberately not here: loading a missing or
/// malformed ledger reinitializes empty (with an operator warning) and
/// never fails the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize ledger")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist ledger to {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
