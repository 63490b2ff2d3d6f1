//! LLM-backed page extraction.

use anyhow::Result;

use passbook_ingest::pipeline::PageExtractor;

use crate::client::{ChatClient, ChatTurn};

const EXTRACTION_SYSTEM: &str = r#"You extract transaction data from one page of a financial document.
The page may contain transactions presented in a table. Go over all the
text on the page and extract every transaction that has a valid date in
dd-mm-yyyy format. Output a JSON array of objects, each with exactly
these keys:
- "Date": string in dd-mm-yyyy format
- "Particulars": string describing the transaction; empty string if missing
- "Deposit": a number, or null if missing
- "Withdrawal": a number, or null if missing
- "Balance": a number, or null if missing

Ignore any transaction without a valid date. Do not confuse 0.0 with
null. Return ONLY a valid JSON array, no commentary or code blocks. If
the page contains no transactions, return an empty JSON array."#;

/// The extraction collaborator: page text in, raw (possibly malformed)
/// reply text out. All validation happens downstream in the normalizer.
pub struct LlmPageExtractor {
    client: ChatClient,
}

impl LlmPageExtractor {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

impl PageExtractor for LlmPageExtractor {
    fn extract(&self, page_text: &str) -> Result<String> {
        self.client.complete(
            EXTRACTION_SYSTEM,
            &[ChatTurn::user(format!("Page text:\n{page_text}"))],
        )
    }
}
