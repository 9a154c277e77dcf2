use serde::{Deserialize, Serialize};

/// Conversation kinds accepted by `conversations.list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    PublicChannel,
    PrivateChannel,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::PublicChannel => "public_channel",
            ResourceType::PrivateChannel => "private_channel",
        }
    }
}

/// Parameters for one `conversations.list` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub types: Vec<ResourceType>,
    pub limit: u32,
    pub exclude_archived: bool,
    /// Opaque continuation token from the previous page, forwarded verbatim.
    pub cursor: Option<String>,
}

impl ListRequest {
    /// Comma-joined `types` parameter, e.g. "public_channel,private_channel".
    pub fn types_param(&self) -> String {
        self.types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One page of `conversations.list`.
#[derive(Debug, Clone, Default)]
pub struct ListResponse {
    pub channels: Vec<RawChannel>,
    /// `None` once the collection is exhausted (Slack sends an empty string).
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub value: String,
}

/// Channel object as returned by Slack. Only the fields we project are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChannel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub topic: Option<TextValue>,
    #[serde(default)]
    pub purpose: Option<TextValue>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_archived: bool,
}

/// A channel the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    pub topic: String,
    pub purpose: String,
    pub is_private: bool,
    pub is_member: bool,
}

impl From<RawChannel> for ChannelRecord {
    fn from(raw: RawChannel) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            topic: raw.topic.map(|t| t.value).unwrap_or_default(),
            purpose: raw.purpose.map(|p| p.value).unwrap_or_default(),
            is_private: raw.is_private,
            is_member: raw.is_member,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotProfile {
    #[serde(default)]
    pub name: Option<String>,
}

/// A message from `conversations.history` or `conversations.replies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackMessage {
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub bot_profile: Option<BotProfile>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_count: Option<u32>,
}

impl SlackMessage {
    /// True when this message starts a thread.
    pub fn is_thread_root(&self) -> bool {
        self.thread_ts.as_deref() == Some(self.ts.as_str())
    }
}

/// Naming fields from `users.info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub display_name: String,
}

impl UserProfile {
    /// Best human-readable name: real name, then display name, then login.
    pub fn best_name(&self) -> &str {
        [&self.real_name, &self.display_name, &self.name]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.as_str())
            .unwrap_or(self.id.as_str())
    }
}

/// Identity of the token's workspace, from `auth.test`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInfo {
    pub team: String,
    pub team_id: String,
    pub url: String,
}

impl AuthInfo {
    /// Subdomain used in permalinks. Taken from the workspace URL
    /// (`https://acme.slack.com/` -> `acme`), falling back to the team name.
    pub fn workspace_identifier(&self) -> Option<String> {
        let host = self
            .url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or("");
        if let Some(sub) = host.strip_suffix(".slack.com") {
            if !sub.is_empty() {
                return Some(sub.to_string());
            }
        }
        if self.team.is_empty() {
            None
        } else {
            Some(self.team.clone())
        }
    }
}
