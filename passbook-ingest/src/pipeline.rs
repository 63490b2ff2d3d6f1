//! Per-document ingestion: pages → extraction → normalization → merge.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use passbook_core::normalize::normalize_payload;
use passbook_core::store::LedgerStore;
use passbook_core::transaction::Transaction;

use crate::source::PageSource;

/// Turns one page's text into raw extraction output (free text, possibly
/// malformed). No schema is enforced here; the normalizer validates.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, page_text: &str) -> Result<String>;
}

/// Where a document is in its ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Received,
    PagesExtracted,
    BatchNormalized,
    Merged,
    Persisted,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Received => "received",
            IngestState::PagesExtracted => "pages-extracted",
            IngestState::BatchNormalized => "batch-normalized",
            IngestState::Merged => "merged",
            IngestState::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Outcome of one page within a document.
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    /// 1-based page number.
    pub page: usize,
    /// Transactions that survived normalization.
    pub extracted: usize,
    /// The extraction call itself failed; the page contributed an empty
    /// batch.
    pub failed: bool,
}

/// Per-document ingestion result, reported per-item so a multi-file
/// upload's partial success stays visible.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub pages: Vec<PageOutcome>,
    /// The merged batch, in extraction order.
    pub transactions: Vec<Transaction>,
}

impl DocumentReport {
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.failed).count()
    }
}

/// Drives one document through the ingestion state machine.
pub struct Ingestor<S, E> {
    source: S,
    extractor: E,
    store: Arc<dyn LedgerStore>,
}

impl<S: PageSource, E: PageExtractor> Ingestor<S, E> {
    pub fn new(source: S, extractor: E, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            source,
            extractor,
            store,
        }
    }

    /// Ingest one document.
    ///
    /// A page whose extraction fails contributes an empty batch and the
    /// pass continues; only failure to read the document or to persist
    /// the merge aborts. Zero extracted transactions is a valid outcome.
    pub fn ingest(&self, path: &Path) -> Result<DocumentReport> {
        let document = path.display().to_string();
        log::debug!("{document}: {}", IngestState::Received);

        let pages = self
            .source
            .pages(path)
            .with_context(|| format!("splitting {document} into pages"))?;
        log::debug!(
            "{document}: {} ({} pages)",
            IngestState::PagesExtracted,
            pages.len()
        );

        let mut batch: Vec<Transaction> = Vec::new();
        let mut outcomes = Vec::with_capacity(pages.len());
        for (idx, page_text) in pages.iter().enumerate() {
            let page = idx + 1;
            match self.extractor.extract(page_text) {
                Ok(reply) => {
                    let txns = normalize_payload(&reply);
                    log::debug!("{document}: page {page} yielded {} transaction(s)", txns.len());
                    outcomes.push(PageOutcome {
                        page,
                        extracted: txns.len(),
                        failed: false,
                    });
                    batch.extend(txns);
                }
                Err(err) => {
                    log::warn!("{document}: page {page} extraction failed, using empty batch: {err:#}");
                    outcomes.push(PageOutcome {
                        page,
                        extracted: 0,
                        failed: true,
                    });
                }
            }
        }
        log::debug!(
            "{document}: {} ({} transactions)",
            IngestState::BatchNormalized,
            batch.len()
        );

        self.store
            .merge(&batch)
            .with_context(|| format!("persisting merged batch for {document}"))?;
        log::debug!("{document}: {}", IngestState::Merged);
        log::debug!("{document}: {}", IngestState::Persisted);

        Ok(DocumentReport {
            document,
            pages: outcomes,
            transactions: batch,
        })
    }
}
