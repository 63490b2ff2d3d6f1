//! Query answering over a selected working set.

use anyhow::{Context, Result};

use passbook_core::transaction::Transaction;

use crate::client::{ChatClient, ChatTurn};

const ANSWER_SYSTEM: &str = r#"You are a personal finance assistant. Answer the user's query using
ONLY the transaction records provided with it. Each record has Date
(dd-mm-yyyy), Particulars, Deposit, Withdrawal, and Balance fields; a
null Deposit or Withdrawal means that side of the line was not reported,
not that it was zero. If the provided records cannot answer the query,
say so plainly instead of guessing."#;

/// Answer a query grounded in the filtered working set.
pub fn answer_query(
    client: &ChatClient,
    query: &str,
    working_set: &[Transaction],
) -> Result<String> {
    let context = serde_json::to_string_pretty(working_set).context("serializing working set")?;
    client.complete(
        ANSWER_SYSTEM,
        &[ChatTurn::user(format!(
            "Transactions:\n{context}\n\nQuery: {query}"
        ))],
    )
}

/// Answer a query that does not need the ledger (greetings, small talk).
pub fn answer_directly(client: &ChatClient, query: &str) -> Result<String> {
    client.complete(
        "Answer the user's query in one or two lines.",
        &[ChatTurn::user(query)],
    )
}
