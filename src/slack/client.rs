use serde::Deserialize;
use std::time::Duration;

use super::error::SlackError;
use super::types::{AuthInfo, ListRequest, ListResponse, RawChannel, SlackMessage, UserProfile};
use super::SlackApi;

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Blocking HTTP client for the Slack Web API, authenticated with a bearer token.
pub struct SlackClient {
    token: String,
    base_url: String,
    agent: ureq::Agent,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        // Status codes are classified by `classify_response`, not by ureq.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(60)))
            .build();
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Point the client at a different API root (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a full method URL.
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }

    /// Make an authenticated GET request, return the classified JSON body.
    fn get(&self, method: &str, params: &[(&str, &str)]) -> Result<serde_json::Value, SlackError> {
        let url = self.api_url(method);
        let mut req = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.token));
        for &(key, value) in params {
            req = req.query(key, value);
        }
        tracing::debug!(method, "calling Slack API");

        let transport = |e: ureq::Error| SlackError::Transport {
            method: method.to_string(),
            message: e.to_string(),
        };
        let mut resp = req.call().map_err(transport)?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.body_mut().read_to_string().map_err(transport)?;

        classify_response(method, status, retry_after.as_deref(), &body)
    }
}

impl SlackApi for SlackClient {
    fn list_conversations(&self, request: &ListRequest) -> Result<ListResponse, SlackError> {
        let types = request.types_param();
        let limit = request.limit.to_string();
        let exclude_archived = request.exclude_archived.to_string();
        let mut params = vec![
            ("types", types.as_str()),
            ("limit", limit.as_str()),
            ("exclude_archived", exclude_archived.as_str()),
        ];
        if let Some(cursor) = request.cursor.as_deref() {
            params.push(("cursor", cursor));
        }
        let body = self.get("conversations.list", &params)?;
        parse_list_response(&body)
    }

    fn conversation_history(
        &self,
        channel: &str,
        oldest: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<SlackMessage>, SlackError> {
        let limit = limit.map(|l| l.to_string());
        let mut params = vec![("channel", channel)];
        if let Some(oldest) = oldest {
            params.push(("oldest", oldest));
        }
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        let body = self.get("conversations.history", &params)?;
        parse_messages_response("conversations.history", &body)
    }

    fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
    ) -> Result<Vec<SlackMessage>, SlackError> {
        let body = self.get("conversations.replies", &[("channel", channel), ("ts", ts)])?;
        parse_messages_response("conversations.replies", &body)
    }

    fn user_info(&self, user_id: &str) -> Result<UserProfile, SlackError> {
        let body = self.get("users.info", &[("user", user_id)])?;
        parse_user_info_response(&body)
    }

    fn auth_test(&self) -> Result<AuthInfo, SlackError> {
        let body = self.get("auth.test", &[])?;
        parse_auth_test_response(&body)
    }
}

// --- Response Classification ---

/// Read a `Retry-After` header value as whole seconds.
/// Missing or malformed values yield `None`.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turn an HTTP status, `Retry-After` header and body into either the JSON
/// payload of a successful call or a classified error.
///
/// HTTP 429 and `{"ok": false, "error": "ratelimited"}` are both rate limits.
pub fn classify_response(
    method: &str,
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> Result<serde_json::Value, SlackError> {
    if status == 429 {
        return Err(SlackError::RateLimited {
            retry_after: parse_retry_after(retry_after),
        });
    }

    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) if !(200..300).contains(&status) => {
            return Err(SlackError::Http {
                method: method.to_string(),
                status,
            })
        }
        Err(source) => {
            return Err(SlackError::Decode {
                method: method.to_string(),
                source,
            })
        }
    };

    if json["ok"].as_bool() != Some(true) {
        let error = json["error"].as_str().unwrap_or("unknown error");
        if error == "ratelimited" {
            return Err(SlackError::RateLimited {
                retry_after: parse_retry_after(retry_after),
            });
        }
        return Err(SlackError::Api {
            method: method.to_string(),
            error: error.to_string(),
        });
    }

    if !(200..300).contains(&status) {
        return Err(SlackError::Http {
            method: method.to_string(),
            status,
        });
    }

    Ok(json)
}

// --- Response Parsers ---

fn decode<T: for<'de> Deserialize<'de>>(
    method: &str,
    json: &serde_json::Value,
) -> Result<T, SlackError> {
    T::deserialize(json).map_err(|source| SlackError::Decode {
        method: method.to_string(),
        source,
    })
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    channels: Vec<RawChannel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

pub fn parse_list_response(json: &serde_json::Value) -> Result<ListResponse, SlackError> {
    let envelope: ListEnvelope = decode("conversations.list", json)?;
    let next_cursor = envelope
        .response_metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.is_empty());
    Ok(ListResponse {
        channels: envelope.channels,
        next_cursor,
    })
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<SlackMessage>,
}

pub fn parse_messages_response(
    method: &str,
    json: &serde_json::Value,
) -> Result<Vec<SlackMessage>, SlackError> {
    let envelope: MessagesEnvelope = decode(method, json)?;
    Ok(envelope.messages)
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: RawUser,
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    profile: RawUserProfile,
}

#[derive(Deserialize, Default)]
struct RawUserProfile {
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    display_name: String,
}

/// A response without a `user` object is a decode error, never a blank profile.
pub fn parse_user_info_response(json: &serde_json::Value) -> Result<UserProfile, SlackError> {
    let envelope: UserEnvelope = decode("users.info", json)?;
    let user = envelope.user;
    let real_name = if user.profile.real_name.is_empty() {
        user.real_name
    } else {
        user.profile.real_name
    };
    Ok(UserProfile {
        id: user.id,
        name: user.name,
        real_name,
        display_name: user.profile.display_name,
    })
}

pub fn parse_auth_test_response(json: &serde_json::Value) -> Result<AuthInfo, SlackError> {
    let field = |key: &str| json[key].as_str().unwrap_or("").to_string();
    Ok(AuthInfo {
        team: field("team"),
        team_id: field("team_id"),
        url: field("url"),
    })
}
