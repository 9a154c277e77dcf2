use anyhow::{Context, Result};

use super::Summarizer;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini `generateContent` client.
pub struct GeminiSummarizer {
    api_key: String,
    model: String,
    base_url: String,
    agent: ureq::Agent,
}

impl GeminiSummarizer {
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.trim_start_matches("models/").to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            agent: super::http_agent(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

pub fn build_generate_request(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
    })
}

/// Concatenate the text parts of the first candidate.
pub fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    if let Some(msg) = json["error"]["message"].as_str() {
        anyhow::bail!("Gemini API error: {msg}");
    }
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .context("Missing candidates[0].content.parts")?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() {
        anyhow::bail!("Gemini returned an empty response");
    }
    Ok(text)
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let body = serde_json::to_string(&build_generate_request(prompt))?;
        let mut resp = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .send(body)
            .with_context(|| format!("POST models/{}:generateContent failed", self.model))?;
        let status = resp.status().as_u16();
        let resp_str = resp
            .body_mut()
            .read_to_string()
            .context("Failed to read response body")?;
        let json = super::decode_body(status, &resp_str)?;
        parse_generate_response(&json)
    }
}
