//! The month-keyed transaction ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::month::MonthKey;
use crate::transaction::Transaction;

/// All known transactions, bucketed by calendar month.
///
/// Buckets keep append order (extraction order). Merging is append-only:
/// no dedup key exists in statement data, so re-ingesting a document
/// duplicates its entries. The serialized form is the durable ledger
/// file's top level: a `Mon-YY` → transaction-list mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    months: BTreeMap<MonthKey, Vec<Transaction>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every transaction to its month bucket, creating buckets as
    /// needed.
    pub fn merge_batch<I: IntoIterator<Item = Transaction>>(&mut self, batch: I) {
        for txn in batch {
            self.months.entry(txn.month_key()).or_default().push(txn);
        }
    }

    /// Used by lenient store loading, which trusts the bucket key written
    /// in the file rather than recomputing it.
    pub fn insert_into(&mut self, key: MonthKey, txn: Transaction) {
        self.months.entry(key).or_default().push(txn);
    }

    /// Month keys in chronological order.
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.months.keys().copied()
    }

    pub fn bucket(&self, key: MonthKey) -> Option<&[Transaction]> {
        self.months.get(&key).map(Vec::as_slice)
    }

    /// Buckets whose month falls in `[from, to]`, chronologically.
    /// Empty when `from > to`.
    pub fn buckets_in(
        &self,
        from: MonthKey,
        to: MonthKey,
    ) -> impl Iterator<Item = (MonthKey, &[Transaction])> + '_ {
        let range = (from <= to).then(|| self.months.range(from..=to));
        range
            .into_iter()
            .flatten()
            .map(|(key, txns)| (*key, txns.as_slice()))
    }

    /// Every transaction, buckets in chronological order, each bucket's
    /// internal append order preserved.
    pub fn flatten(&self) -> Vec<Transaction> {
        self.months.values().flatten().cloned().collect()
    }

    /// Number of month buckets.
    pub fn month_count(&self) -> usize {
        self.months.len()
    }

    /// Total number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(date: &str, particulars: &str) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%d-%m-%Y").unwrap(),
            particulars: particulars.to_string(),
            deposit: None,
            withdrawal: None,
            balance: None,
        }
    }

    #[test]
    fn test_merge_buckets_by_month() {
        let mut ledger = Ledger::new();
        ledger.merge_batch(vec![
            txn("01-02-2025", "a"),
            txn("15-02-2025", "b"),
            txn("03-01-2025", "c"),
        ]);
        assert_eq!(ledger.month_count(), 2);
        assert_eq!(ledger.bucket("Feb-25".parse().unwrap()).unwrap().len(), 2);
        assert_eq!(ledger.bucket("Jan-25".parse().unwrap()).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_is_order_independent_across_batches() {
        let (a, b, c) = (
            txn("01-02-2025", "a"),
            txn("15-02-2025", "b"),
            txn("03-01-2025", "c"),
        );

        let mut one = Ledger::new();
        one.merge_batch(vec![a.clone(), b.clone()]);
        one.merge_batch(vec![c.clone()]);

        let mut two = Ledger::new();
        two.merge_batch(vec![a]);
        two.merge_batch(vec![b, c]);

        assert_eq!(one, two);
    }

    #[test]
    fn test_remerging_duplicates_entries() {
        // Documented limitation: no dedup key exists in the source data.
        let batch = vec![txn("01-02-2025", "a"), txn("02-02-2025", "b")];
        let mut ledger = Ledger::new();
        ledger.merge_batch(batch.clone());
        ledger.merge_batch(batch);
        assert_eq!(ledger.transaction_count(), 4);
    }

    #[test]
    fn test_flatten_is_chronological_by_bucket() {
        let mut ledger = Ledger::new();
        // Buckets created out of chronological order.
        ledger.merge_batch(vec![txn("10-02-2025", "feb")]);
        ledger.merge_batch(vec![txn("31-12-2024", "dec")]);
        ledger.merge_batch(vec![txn("05-01-2025", "jan")]);

        let all: Vec<String> = ledger
            .flatten()
            .into_iter()
            .map(|t| t.particulars)
            .collect();
        assert_eq!(all, ["dec", "jan", "feb"]);
    }

    #[test]
    fn test_buckets_in_range() {
        let mut ledger = Ledger::new();
        ledger.merge_batch(vec![
            txn("31-12-2024", "dec"),
            txn("05-01-2025", "jan"),
            txn("10-02-2025", "feb"),
            txn("01-03-2025", "mar"),
        ]);

        let keys: Vec<String> = ledger
            .buckets_in("Jan-25".parse().unwrap(), "Feb-25".parse().unwrap())
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, ["Jan-25", "Feb-25"]);

        // Inverted bounds select nothing rather than panicking.
        let none = ledger
            .buckets_in("Feb-25".parse().unwrap(), "Jan-25".parse().unwrap())
            .count();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_durable_shape() {
        let mut ledger = Ledger::new();
        ledger.merge_batch(vec![txn("01-02-2025", "Salary")]);
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_object());
        assert_eq!(json["Feb-25"][0]["Particulars"], "Salary");
    }
}
