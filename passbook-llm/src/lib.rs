//! passbook-llm: chat client and the model-backed collaborators
//! (page extraction, query classification, answering, charts).

pub mod answer;
pub mod charts;
pub mod classify;
pub mod client;
pub mod extractor;

pub use answer::{answer_directly, answer_query};
pub use charts::{generate_charts, sanitize_chart_payload};
pub use classify::classify_query;
pub use client::{ChatClient, ChatTurn, Provider};
pub use extractor::LlmPageExtractor;
