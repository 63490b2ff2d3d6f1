//! passbook-core: month-keyed transaction ledger, normalization, and
//! relevance selection.

pub mod error;
pub mod filter;
pub mod ledger;
pub mod month;
pub mod normalize;
pub mod store;
pub mod transaction;

pub use error::StoreError;
pub use filter::{DateRange, QueryClassification, select};
pub use ledger::Ledger;
pub use month::MonthKey;
pub use normalize::{normalize_batch, normalize_payload, normalize_record, strip_code_fences};
pub use store::{JsonLedgerStore, LedgerStore, MemoryLedgerStore};
pub use transaction::Transaction;
