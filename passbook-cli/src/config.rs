use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use passbook_llm::client::{ChatClient, Provider};

use crate::state::ensure_passbook_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    pub provider: String,
    pub model: String,
    /// Override for chat-completions-compatible endpoints; the provider
    /// default is used when absent.
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Applied to every model call; a timed-out extraction degrades to
    /// an empty page, it never wedges an ingest.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Durable ledger file (default: ~/.passbook/ledger.json).
    pub ledger_file: Option<PathBuf>,
    /// Filtered-snapshot file (default: ~/.passbook/filtered_transactions.json).
    pub filtered_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSection {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                base_url: None,
                api_key_env: "OPENAI_API_KEY".to_string(),
                temperature: 0.2,
                max_tokens: 8000,
                timeout_secs: 100,
            },
            storage: StorageSection::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_passbook_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn build_client(cfg: &Config) -> Result<ChatClient> {
    let provider: Provider = cfg
        .llm
        .provider
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let api_key = std::env::var(&cfg.llm.api_key_env).with_context(|| {
        format!(
            "{} is not set (configure llm.api_key_env in config.toml)",
            cfg.llm.api_key_env
        )
    })?;
    let base_url = cfg
        .llm
        .base_url
        .clone()
        .unwrap_or_else(|| provider.default_base_url().to_string());

    Ok(ChatClient {
        provider,
        model: cfg.llm.model.clone(),
        base_url,
        api_key,
        temperature: cfg.llm.temperature,
        max_tokens: cfg.llm.max_tokens,
        timeout: Duration::from_secs(cfg.llm.timeout_secs),
    })
}
