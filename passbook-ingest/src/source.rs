//! Page sources: document file in, ordered page texts out.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Splits a document into per-page text. Extraction quality is the
/// source's problem; everything downstream only sees page strings.
pub trait PageSource: Send + Sync {
    fn pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Page breaks as emitted by pdftotext and friends.
const FORM_FEED: char = '\u{c}';

fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    // pdftotext terminates the last page with a form feed too.
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Extracts page text from a PDF by shelling out to `pdftotext`.
pub struct PdftotextSource;

impl PageSource for PdftotextSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        if which::which("pdftotext").is_err() {
            bail!(
                "pdftotext not found on PATH.\n\
                 Install poppler-utils (apt install poppler-utils / brew install poppler),\n\
                 or ingest a pre-extracted .txt file instead."
            );
        }

        let output = std::process::Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .with_context(|| format!("running pdftotext on {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext failed on {} with {}: {}",
                path.display(),
                output.status,
                stderr.trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(split_pages(&text))
    }
}

/// Reads pre-extracted statement text, pages separated by form feeds.
/// Lets the pipeline run without a PDF toolchain (and in tests).
pub struct TextFileSource;

impl PageSource for TextFileSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(split_pages(&text))
    }
}
