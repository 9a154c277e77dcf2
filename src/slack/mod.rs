pub mod client;
pub mod error;
pub mod types;

pub use client::SlackClient;
pub use error::SlackError;
pub use types::{
    AuthInfo, ChannelRecord, ListRequest, ListResponse, RawChannel, ResourceType, SlackMessage,
    UserProfile,
};

/// The subset of the Slack Web API this tool talks to. `SlackClient` is the
/// HTTP implementation; tests substitute scripted fakes.
pub trait SlackApi {
    /// One page of `conversations.list`.
    fn list_conversations(&self, request: &ListRequest) -> Result<ListResponse, SlackError>;

    /// `conversations.history`, newest first, optionally bounded below by `oldest`.
    fn conversation_history(
        &self,
        channel: &str,
        oldest: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<SlackMessage>, SlackError>;

    /// All messages of the thread rooted at `ts`, root first.
    fn conversation_replies(&self, channel: &str, ts: &str)
        -> Result<Vec<SlackMessage>, SlackError>;

    fn user_info(&self, user_id: &str) -> Result<UserProfile, SlackError>;

    fn auth_test(&self) -> Result<AuthInfo, SlackError>;
}
