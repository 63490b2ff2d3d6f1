//! passbook-ingest: document page sources and the per-document
//! extraction/merge pipeline.

pub mod pipeline;
pub mod source;

pub use pipeline::{DocumentReport, IngestState, Ingestor, PageExtractor, PageOutcome};
pub use source::{PageSource, PdftotextSource, TextFileSource};
