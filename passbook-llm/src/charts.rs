//! Chart-descriptor generation over a working set.
//!
//! The model is asked for a JSON array of figure descriptors
//! (`{"data": [...], "layout": {...}}`). Its replies are treated as
//! untrusted parser input: sanitization either yields renderable
//! descriptors or an empty list, never an error.

use anyhow::{Context, Result};
use serde_json::Value;

use passbook_core::normalize::strip_code_fences;
use passbook_core::transaction::Transaction;

use crate::client::{ChatClient, ChatTurn};

const CHART_SYSTEM: &str = r#"You are a data visualization specialist. You are given transaction
records with Date (dd-mm-yyyy), Particulars, Deposit, Withdrawal, and
Balance fields, plus a user query. Produce a JSON array where each
element is a figure object of the form
{"data": [...traces...], "layout": {...}} that best visualizes the
transactions for the query (line, bar, pie, histogram, ...).

IMPORTANT:
- Return ONLY the JSON array, no commentary or markdown formatting.
- The output must parse as JSON exactly.
- Do not include keys such as "error" or "warning".
- For line charts use trace type "scatter" with "mode": "lines", never
  type "line".
- Return an empty JSON array if no chart can be made from the data."#;

/// Generate sanitized chart descriptors for a query over a working set.
pub fn generate_charts(
    client: &ChatClient,
    query: &str,
    working_set: &[Transaction],
) -> Result<Vec<Value>> {
    let context = serde_json::to_string_pretty(working_set).context("serializing working set")?;
    let reply = client.complete(
        CHART_SYSTEM,
        &[ChatTurn::user(format!(
            "Transactions:\n{context}\n\nQuery: {query}"
        ))],
    )?;
    Ok(sanitize_chart_payload(&reply))
}

/// Clean a raw chart reply into figure descriptors.
///
/// Strips code fences, maps bare `NaN` tokens to `null`, unwraps figures
/// that arrive double-encoded as JSON strings, drops descriptors that
/// are error objects, and removes stray `error` properties from traces.
/// Anything unusable is dropped; a fully unusable reply is an empty list.
pub fn sanitize_chart_payload(raw: &str) -> Vec<Value> {
    let body = strip_code_fences(raw).replace("NaN", "null");

    let parsed: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("unparseable chart payload, dropping: {err}");
            return Vec::new();
        }
    };

    let items = match parsed {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut figures = Vec::new();
    for item in items {
        let mut figure = match item {
            Value::String(inner) => match serde_json::from_str::<Value>(&inner) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("dropping double-encoded figure that does not parse: {err}");
                    continue;
                }
            },
            other => other,
        };

        let Some(obj) = figure.as_object_mut() else {
            continue;
        };
        if obj.contains_key("error") {
            continue;
        }
        if let Some(traces) = obj.get_mut("data").and_then(Value::as_array_mut) {
            for trace in traces {
                if let Some(trace) = trace.as_object_mut() {
                    trace.remove("error");
                }
            }
        }

        figures.push(figure);
    }
    figures
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_array_of_figures() {
        let raw = r#"[{"data": [{"type": "bar"}], "layout": {"title": "t"}}]"#;
        let figures = sanitize_chart_payload(raw);
        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0]["data"][0]["type"], "bar");
    }

    #[test]
    fn test_fenced_payload() {
        let raw = "```json\n[{\"data\": [], \"layout\": {}}]\n```";
        assert_eq!(sanitize_chart_payload(raw).len(), 1);
    }

    #[test]
    fn test_single_figure_is_wrapped() {
        let raw = r#"{"data": [], "layout": {}}"#;
        assert_eq!(sanitize_chart_payload(raw).len(), 1);
    }

    #[test]
    fn test_double_encoded_figures() {
        let raw = r#"["{\"data\": [{\"type\": \"scatter\"}], \"layout\": {}}"]"#;
        let figures = sanitize_chart_payload(raw);
        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0]["data"][0]["type"], "scatter");
    }

    #[test]
    fn test_bare_nan_becomes_null() {
        let raw = r#"[{"data": [{"y": [1, NaN, 3]}], "layout": {}}]"#;
        let figures = sanitize_chart_payload(raw);
        assert_eq!(figures[0]["data"][0]["y"][1], json!(null));
    }

    #[test]
    fn test_error_figure_is_dropped() {
        let raw = r#"[{"error": "no transactions"}, {"data": [], "layout": {}}]"#;
        assert_eq!(sanitize_chart_payload(raw).len(), 1);
    }

    #[test]
    fn test_error_property_is_stripped_from_traces() {
        let raw = r#"[{"data": [{"type": "bar", "error": "x"}], "layout": {}}]"#;
        let figures = sanitize_chart_payload(raw);
        assert!(figures[0]["data"][0].get("error").is_none());
    }

    #[test]
    fn test_garbage_is_empty() {
        assert!(sanitize_chart_payload("sorry, no charts").is_empty());
        assert!(sanitize_chart_payload("").is_empty());
        assert!(sanitize_chart_payload("[\"not json inside\"]").is_empty());
    }
}
