use anyhow::{Context, Result};

use super::Summarizer;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Chat Completions client used for one-shot summaries.
pub struct OpenAiSummarizer {
    api_key: String,
    model: String,
    base_url: String,
    agent: ureq::Agent,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            agent: super::http_agent(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

pub fn build_chat_request(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

/// Pull the assistant text out of a Chat Completions response.
pub fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    if let Some(msg) = json["error"]["message"].as_str() {
        anyhow::bail!("OpenAI API error: {msg}");
    }
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .context("Missing choices[0].message.content")?;
    Ok(content.to_string())
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let body = serde_json::to_string(&build_chat_request(&self.model, prompt))?;
        let mut resp = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(body)
            .context("POST /v1/chat/completions failed")?;
        let status = resp.status().as_u16();
        let resp_str = resp
            .body_mut()
            .read_to_string()
            .context("Failed to read response body")?;
        let json = super::decode_body(status, &resp_str)?;
        parse_chat_response(&json)
    }
}
