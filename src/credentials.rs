use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::summarize::Provider;

pub const SLACK_TOKEN_VAR: &str = "SLACK_USER_TOKEN";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Parse `KEY=value` lines from a `.env` file. Blank lines, `#` comments and
/// an optional `export ` prefix are accepted; matching quotes are stripped.
pub fn parse_dotenv(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            if !key.is_empty() {
                vars.insert(key.to_string(), value.to_string());
            }
        }
    }
    vars
}

/// Process environment layered over an optional `.env` file.
/// Real environment variables win; empty values count as unset.
#[derive(Debug)]
pub struct EnvSource {
    dotenv: BTreeMap<String, String>,
    process_env: bool,
}

impl Default for EnvSource {
    fn default() -> Self {
        Self {
            dotenv: BTreeMap::new(),
            process_env: true,
        }
    }
}

impl EnvSource {
    /// Read `.env` from `dir` if present.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(".env");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self {
            dotenv: parse_dotenv(&content),
            process_env: true,
        })
    }

    /// A source that ignores the process environment.
    pub fn isolated(vars: BTreeMap<String, String>) -> Self {
        Self {
            dotenv: vars,
            process_env: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let from_process = if self.process_env {
            std::env::var(key).ok()
        } else {
            None
        };
        let non_empty = |v: &String| !v.trim().is_empty();
        from_process
            .filter(non_empty)
            .or_else(|| self.dotenv.get(key).cloned().filter(non_empty))
    }
}

/// Secrets for Slack and the summarization providers.
#[derive(Clone)]
pub struct Credentials {
    pub slack_token: String,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("slack_token", &"<redacted>")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// The Slack token is required; provider keys are optional.
    pub fn load(env: &EnvSource) -> Result<Self> {
        let slack_token = env.get(SLACK_TOKEN_VAR).with_context(|| {
            format!("{SLACK_TOKEN_VAR} is not set. Export it or add it to .env")
        })?;
        Ok(Self {
            slack_token,
            openai_api_key: env.get(OPENAI_KEY_VAR),
            gemini_api_key: env.get(GEMINI_KEY_VAR),
        })
    }

    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}
