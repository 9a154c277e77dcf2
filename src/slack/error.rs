use std::time::Duration;

/// Failures from a single Slack Web API call, classified so callers can
/// tell a rate limit apart from everything else.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("rate limited by Slack (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("still rate limited after {attempts} attempts ({}s waited)", waited.as_secs())]
    RateLimitExhausted { attempts: u32, waited: Duration },

    #[error("Slack API error in {method}: {error}")]
    Api { method: String, error: String },

    #[error("{method} returned HTTP {status}")]
    Http { method: String, status: u16 },

    #[error("{method} request failed: {message}")]
    Transport { method: String, message: String },

    #[error("failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SlackError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SlackError::RateLimited { .. })
    }
}
