//! Validation of untrusted extraction candidates.
//!
//! The page extractor returns free text that may or may not be a JSON
//! array of statement lines, sometimes wrapped in markdown code fences.
//! Everything here collapses failure to "no transactions": a bad record
//! is dropped, a bad batch is empty, and nothing panics or errors.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::transaction::{Transaction, date_format};

/// Parse a strict `DD-MM-YYYY` statement date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), date_format::FORMAT).ok()
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        // Extractors occasionally quote amounts ("1,250.00"); salvage those.
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Validate one raw candidate record.
///
/// Returns `None` (drop, never raise) when `Date` is absent, not a
/// string, or fails strict `DD-MM-YYYY` parsing. A present-but-null
/// amount stays `None`; a numeric `0` stays `Some(0.0)`.
pub fn normalize_record(raw: &Value) -> Option<Transaction> {
    let obj = raw.as_object()?;
    let date = parse_date(obj.get("Date")?.as_str()?)?;

    let particulars = obj
        .get("Particulars")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    Some(Transaction {
        date,
        particulars,
        deposit: numeric(obj.get("Deposit")),
        withdrawal: numeric(obj.get("Withdrawal")),
        balance: numeric(obj.get("Balance")),
    })
}

/// Validate a parsed batch. Anything that is not an array is an empty
/// batch; invalid records are dropped individually.
pub fn normalize_batch(raw: &Value) -> Vec<Transaction> {
    match raw.as_array() {
        Some(items) => items.iter().filter_map(normalize_record).collect(),
        None => Vec::new(),
    }
}

/// Strip one markdown code fence (```json ... ```) if present.
pub fn strip_code_fences(text: &str) -> &str {
    let fenced = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")
        .ok()
        .and_then(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        });
    fenced.unwrap_or(text).trim()
}

/// The untrusted-text boundary: extractor reply in, normalized batch out.
///
/// A reply that is not parseable JSON yields an empty batch. Callers
/// must treat "zero transactions extracted" as a valid outcome for a
/// page that legitimately contains none.
pub fn normalize_payload(text: &str) -> Vec<Transaction> {
    let body = strip_code_fences(text);
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_batch(&value),
        Err(err) => {
            log::warn!("unparseable extraction payload, using empty batch: {err}");
            Vec::new()
        }
    }
}
