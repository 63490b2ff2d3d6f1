//! Relevance selection: turning a query classification into a working set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::month::MonthKey;
use crate::transaction::Transaction;

/// Inclusive date window. Bounds are normalized so `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// What the upstream query-classification step decided.
///
/// The default is the conservative reading: the ledger is needed and no
/// explicit window was requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryClassification {
    pub needs_ledger: bool,
    pub range: Option<DateRange>,
}

impl Default for QueryClassification {
    fn default() -> Self {
        Self {
            needs_ledger: true,
            range: None,
        }
    }
}

/// Materialize the working set for a query.
///
/// No range: every bucket, chronologically. With a range: only
/// transactions whose date falls inside it, touching only the month
/// buckets the range can reach. The result is stably sorted ascending by
/// date, since downstream cumulative-sum and time-series consumers assume
/// monotonic time. An empty result is a valid selection, not a failure.
pub fn select(classification: &QueryClassification, ledger: &Ledger) -> Vec<Transaction> {
    let mut working_set: Vec<Transaction> = match classification.range {
        None => ledger.flatten(),
        Some(range) => ledger
            .buckets_in(
                MonthKey::from_date(range.start),
                MonthKey::from_date(range.end),
            )
            .flat_map(|(_, bucket)| bucket.iter())
            .filter(|txn| range.contains(txn.date))
            .cloned()
            .collect(),
    };
    working_set.sort_by_key(|txn| txn.date);
    working_set
}
