//! Query classification: does a query need the ledger, and did the user
//! name an explicit date window?

use serde_json::Value;

use passbook_core::filter::{DateRange, QueryClassification};
use passbook_core::normalize::{parse_date, strip_code_fences};

use crate::client::{ChatClient, ChatTurn};

const CLASSIFY_SYSTEM: &str = r#"You decide whether a user's query requires searching their financial
transaction history.

Rules:
- A greeting or small talk ("Hi", "How are you?") does not need the
  transaction history.
- A query about transactions, balances, deposits, withdrawals, dates, or
  any financial information does need it.
- If unsure, assume it is needed.
- If the query names an explicit date or date range, report it; dates
  without a year belong to the most recent plausible year.

Reply with ONLY a JSON object, no commentary or code blocks:
{"needs_ledger": true or false,
 "start": "dd-mm-yyyy" or null,
 "end": "dd-mm-yyyy" or null}"#;

/// Classify a query. Never fails: an unreachable model or an unparseable
/// reply falls back to the conservative default (ledger needed, no
/// window).
pub fn classify_query(client: &ChatClient, query: &str) -> QueryClassification {
    match client.complete(CLASSIFY_SYSTEM, &[ChatTurn::user(query)]) {
        Ok(reply) => parse_classification(&reply),
        Err(err) => {
            log::warn!("query classification failed, assuming ledger is needed: {err:#}");
            QueryClassification::default()
        }
    }
}

/// Strict parse of the classifier's reply.
pub fn parse_classification(reply: &str) -> QueryClassification {
    let body = strip_code_fences(reply);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("unparseable classification reply, assuming ledger is needed: {err}");
            return QueryClassification::default();
        }
    };

    let needs_ledger = value
        .get("needs_ledger")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let bound = |key: &str| value.get(key).and_then(Value::as_str).and_then(parse_date);
    let range = match (bound("start"), bound("end")) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        _ => None,
    };

    QueryClassification { needs_ledger, range }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%d-%m-%Y").unwrap()
    }

    #[test]
    fn test_parses_range() {
        let c = parse_classification(
            r#"{"needs_ledger": true, "start": "01-02-2025", "end": "10-02-2025"}"#,
        );
        assert!(c.needs_ledger);
        let range = c.range.unwrap();
        assert_eq!(range.start, date("01-02-2025"));
        assert_eq!(range.end, date("10-02-2025"));
    }

    #[test]
    fn test_parses_no_ledger_needed() {
        let c = parse_classification(r#"{"needs_ledger": false, "start": null, "end": null}"#);
        assert!(!c.needs_ledger);
        assert!(c.range.is_none());
    }

    #[test]
    fn test_fenced_reply() {
        let c = parse_classification(
            "```json\n{\"needs_ledger\": true, \"start\": null, \"end\": null}\n```",
        );
        assert!(c.needs_ledger);
        assert!(c.range.is_none());
    }

    #[test]
    fn test_half_open_window_is_dropped() {
        let c = parse_classification(r#"{"needs_ledger": true, "start": "01-02-2025", "end": null}"#);
        assert!(c.range.is_none());
    }

    #[test]
    fn test_garbage_falls_back_to_conservative_default() {
        for reply in ["Yes", "", "{\"needs_ledger\": \"maybe\"}", "not json at all"] {
            let c = parse_classification(reply);
            assert!(c.needs_ledger, "reply {reply:?} should assume the ledger");
            assert!(c.range.is_none());
        }
    }

    #[test]
    fn test_inverted_window_is_normalized() {
        let c = parse_classification(
            r#"{"needs_ledger": true, "start": "10-02-2025", "end": "01-02-2025"}"#,
        );
        let range = c.range.unwrap();
        assert!(range.start <= range.end);
    }
}
