pub mod gemini;
pub mod openai;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DigestConfig;
use crate::credentials::Credentials;

pub use gemini::GeminiSummarizer;
pub use openai::OpenAiSummarizer;

/// Which language model service writes the summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
    #[default]
    Gemini,
}

impl Provider {
    /// Environment variable holding this provider's API key.
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "OpenAI"),
            Provider::Gemini => write!(f, "Gemini"),
        }
    }
}

/// HTTP agent for model APIs. Non-2xx answers are returned as responses so
/// the provider's JSON error message reaches the notice.
pub(crate) fn http_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(std::time::Duration::from_secs(120)))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Parse a model API body. A non-JSON body on an error status is reported
/// with the status and the start of the body.
pub fn decode_body(status: u16, body: &str) -> Result<serde_json::Value> {
    match serde_json::from_str(body) {
        Ok(json) => Ok(json),
        Err(_) if !(200..300).contains(&status) => {
            let snippet: String = body.trim().chars().take(200).collect();
            anyhow::bail!("HTTP {status}: {snippet}")
        }
        Err(e) => Err(e).context("Failed to parse response JSON"),
    }
}

/// Something that turns a prompt into summary text.
pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Prompt asking for a one or two sentence summary of a thread transcript.
pub fn build_prompt(transcript: &str, language: Option<&str>) -> String {
    let mut prompt = format!(
        "Summarize the following Slack thread in one sentence:\n\n\
         {transcript}\n\n\
         When summarizing, follow these rules:\n\
         1. Refer to code blocks or snippets only as 'code' or 'source code'; do not include the code itself\n\
         2. Leave out HTML, CSS, JavaScript and other markup syntax\n\
         3. Keep it short and stick to the essentials\n\
         4. Limit the summary to 1-2 sentences\n"
    );
    if let Some(language) = language {
        prompt.push_str(&format!("5. Write the summary in {language}\n"));
    }
    prompt
}

/// The configured provider, or the reason it cannot be used.
/// Summaries never fail outright: problems come back as readable text.
pub struct SummaryService {
    provider: Provider,
    summarizer: Option<Box<dyn Summarizer>>,
}

impl SummaryService {
    /// Build the service for `config.provider`. A missing API key leaves the
    /// service usable; every summary then explains what is missing.
    pub fn from_config(config: &DigestConfig, credentials: &Credentials) -> Self {
        let provider = config.provider;
        let summarizer = credentials.key_for(provider).map(|key| -> Box<dyn Summarizer> {
            match provider {
                Provider::OpenAi => Box::new(OpenAiSummarizer::new(key, &config.openai_model)),
                Provider::Gemini => Box::new(GeminiSummarizer::new(key, &config.gemini_model)),
            }
        });
        if summarizer.is_none() {
            tracing::warn!("{} is not set; {provider} summaries unavailable", provider.key_var());
        }
        Self {
            provider,
            summarizer,
        }
    }

    pub fn with_summarizer(provider: Provider, summarizer: Box<dyn Summarizer>) -> Self {
        Self {
            provider,
            summarizer: Some(summarizer),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn is_available(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Summary text, or an inline notice describing why there is none.
    pub fn summarize_or_notice(&self, prompt: &str) -> String {
        let Some(summarizer) = self.summarizer.as_ref() else {
            return format!("{} is not set.", self.provider.key_var());
        };
        match summarizer.summarize(prompt) {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                tracing::warn!("{} API error: {e:#}", self.provider);
                format!("{} summary failed: {e:#}", self.provider)
            }
        }
    }
}
