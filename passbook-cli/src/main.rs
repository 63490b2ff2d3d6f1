use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use passbook_core::filter::select;
use passbook_core::month::MonthKey;
use passbook_core::store::{JsonLedgerStore, LedgerStore};
use passbook_core::transaction::Transaction;
use passbook_ingest::pipeline::{DocumentReport, Ingestor};
use passbook_ingest::source::{PdftotextSource, TextFileSource};
use passbook_llm::answer::{answer_directly, answer_query};
use passbook_llm::charts::generate_charts;
use passbook_llm::classify::classify_query;
use passbook_llm::client::ChatClient;
use passbook_llm::extractor::LlmPageExtractor;

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "passbook", version, about = "Bank-statement ledger assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest statement documents (PDF or pre-extracted text) into the ledger
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print each document's full report (including the merged
        /// batch) as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ledger months and their transaction counts
    Months,

    /// Print one month's transactions (e.g. `passbook show Feb-25`)
    Show { month: String },

    /// Select the transactions relevant to a query and write the
    /// filtered snapshot
    Select { query: String },

    /// Answer a question about your transactions
    Ask { query: String },

    /// Emit chart descriptors for a query as JSON
    Chart { query: String },

    /// Config management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default ~/.passbook/config.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { files, json } => run_ingest(&files, json),
        Command::Months => run_months(),
        Command::Show { month } => run_show(&month),
        Command::Select { query } => run_select(&query),
        Command::Ask { query } => run_ask(&query),
        Command::Chart { query } => run_chart(&query),
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(),
        },
    }
}

fn open_store(cfg: &config::Config) -> Result<Arc<dyn LedgerStore>> {
    let path = match &cfg.storage.ledger_file {
        Some(path) => path.clone(),
        None => state::default_ledger_path()?,
    };
    Ok(Arc::new(JsonLedgerStore::open(path)))
}

fn run_ingest(files: &[PathBuf], json: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;
    let store = open_store(&cfg)?;

    let mut failures = 0usize;
    for file in files {
        match ingest_one(file, &client, Arc::clone(&store)) {
            Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
            Ok(report) => {
                let failed_note = match report.failed_pages() {
                    0 => String::new(),
                    n => format!(", {n} page(s) failed extraction"),
                };
                println!(
                    "{}: merged {} transaction(s) from {} page(s){failed_note}",
                    file.display(),
                    report.transactions.len(),
                    report.pages.len(),
                );
            }
            Err(err) => {
                failures += 1;
                eprintln!("{}: failed: {err:#}", file.display());
            }
        }
    }

    if failures == files.len() {
        bail!("all {} document(s) failed to ingest", failures);
    }
    Ok(())
}

fn ingest_one(
    file: &Path,
    client: &ChatClient,
    store: Arc<dyn LedgerStore>,
) -> Result<DocumentReport> {
    let extractor = LlmPageExtractor::new(client.clone());
    let is_pdf = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ingestor::new(PdftotextSource, extractor, store).ingest(file)
    } else {
        Ingestor::new(TextFileSource, extractor, store).ingest(file)
    }
}

fn run_months() -> Result<()> {
    let cfg = config::load_config()?;
    let ledger = open_store(&cfg)?.snapshot();
    if ledger.is_empty() {
        println!("Ledger is empty. Ingest a statement: passbook ingest <file.pdf>");
        return Ok(());
    }
    for month in ledger.months() {
        let count = ledger.bucket(month).map_or(0, |bucket| bucket.len());
        println!("{month}  {count} transaction(s)");
    }
    Ok(())
}

fn run_show(month: &str) -> Result<()> {
    let key: MonthKey = month
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let cfg = config::load_config()?;
    let ledger = open_store(&cfg)?.snapshot();
    let Some(bucket) = ledger.bucket(key) else {
        bail!("no transactions recorded for {key}");
    };
    println!("{}", serde_json::to_string_pretty(bucket)?);
    Ok(())
}

fn run_select(query: &str) -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;
    let store = open_store(&cfg)?;

    let classification = classify_query(&client, query);
    let working_set = select(&classification, &store.snapshot());
    write_filtered(&cfg, &working_set)?;
    println!("{}", serde_json::to_string_pretty(&working_set)?);
    Ok(())
}

fn run_ask(query: &str) -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;

    let classification = classify_query(&client, query);
    let answer = if classification.needs_ledger {
        let store = open_store(&cfg)?;
        let working_set = select(&classification, &store.snapshot());
        write_filtered(&cfg, &working_set)?;
        answer_query(&client, query, &working_set)?
    } else {
        answer_directly(&client, query)?
    };

    println!("{answer}");
    Ok(())
}

fn run_chart(query: &str) -> Result<()> {
    let cfg = config::load_config()?;
    let client = config::build_client(&cfg)?;
    let store = open_store(&cfg)?;

    let classification = classify_query(&client, query);
    let working_set = select(&classification, &store.snapshot());
    write_filtered(&cfg, &working_set)?;

    let figures = generate_charts(&client, query, &working_set)?;
    if figures.is_empty() {
        eprintln!("No charts could be generated for this query.");
    }
    println!("{}", serde_json::to_string_pretty(&figures)?);
    Ok(())
}

/// Write the query-side snapshot consumed by the answering and charting
/// collaborators.
fn write_filtered(cfg: &config::Config, working_set: &[Transaction]) -> Result<()> {
    let path = match &cfg.storage.filtered_file {
        Some(path) => path.clone(),
        None => state::default_filtered_path()?,
    };
    let json = serde_json::to_string_pretty(working_set)?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
