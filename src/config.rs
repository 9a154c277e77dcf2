// src/config.rs
use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lister::ListOptions;
use crate::ratelimit::RetryPolicy;
use crate::summarize::gemini::DEFAULT_GEMINI_MODEL;
use crate::summarize::openai::DEFAULT_OPENAI_MODEL;
use crate::summarize::Provider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Summarization provider: "gemini" or "openai"
    #[serde(default)]
    pub provider: Provider,

    /// Model name for the OpenAI provider
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Model name for the Gemini provider
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Workspace subdomain for permalinks (default: looked up via auth.test)
    #[serde(default)]
    pub workspace: Option<String>,

    /// Offset from UTC, in hours, for dates and displayed times (default: 9)
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// Max conversations.list requests per listing
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Channels requested per conversations.list page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause between listing pages, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Threads summarized per channel
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Give up after this many rate-limit retries (unset = retry forever)
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,

    /// Give up once rate-limit waits would exceed this many seconds (unset = no limit)
    #[serde(default)]
    pub max_rate_limit_wait_secs: Option<u64>,

    /// Language the summaries should be written in (unset = model's choice)
    #[serde(default)]
    pub summary_language: Option<String>,
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_max_pages() -> u32 {
    10
}

fn default_page_size() -> u32 {
    1000
}

fn default_page_delay_ms() -> u64 {
    300
}

fn default_max_threads() -> usize {
    10
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            openai_model: default_openai_model(),
            gemini_model: default_gemini_model(),
            workspace: None,
            utc_offset_hours: default_utc_offset_hours(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            max_threads: default_max_threads(),
            max_rate_limit_retries: None,
            max_rate_limit_wait_secs: None,
            summary_language: None,
        }
    }
}

impl DigestConfig {
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .with_context(|| format!("utc_offset_hours out of range: {}", self.utc_offset_hours))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_rate_limit_retries,
            max_total_wait: self.max_rate_limit_wait_secs.map(Duration::from_secs),
        }
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            max_pages: self.max_pages,
            page_size: self.page_size,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("digest.toml")
}

pub fn load_config(path: &Path) -> Result<Option<DigestConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let config: DigestConfig =
        toml::from_str(&contents).with_context(|| format!("Invalid {}", path.display()))?;
    if config.max_threads == 0 {
        anyhow::bail!("Invalid {}: max_threads must be at least 1", path.display());
    }
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &DigestConfig) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    std::fs::write(path, toml)?;
    Ok(())
}

/// Write a default config unless one already exists. Returns true if written.
pub fn write_default_config(dir: &Path) -> Result<bool> {
    let path = config_path(dir);
    if path.exists() {
        return Ok(false);
    }
    save_config(&path, &DigestConfig::default())?;
    Ok(true)
}
