#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use slack_digest::ratelimit::Sleeper;
use slack_digest::slack::{
    AuthInfo, ChannelRecord, ListRequest, ListResponse, RawChannel, SlackApi, SlackError,
    SlackMessage, UserProfile,
};
use slack_digest::summarize::Summarizer;

/// Records every requested delay instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn total(&self) -> Duration {
        self.slept.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

pub fn rate_limited(secs: u64) -> SlackError {
    SlackError::RateLimited {
        retry_after: Some(Duration::from_secs(secs)),
    }
}

pub fn api_error(method: &str, error: &str) -> SlackError {
    SlackError::Api {
        method: method.to_string(),
        error: error.to_string(),
    }
}

pub fn raw_channel(id: &str, name: &str, is_member: bool) -> RawChannel {
    RawChannel {
        id: id.to_string(),
        name: name.to_string(),
        is_member,
        ..Default::default()
    }
}

pub fn page(channels: Vec<RawChannel>, next_cursor: Option<&str>) -> ListResponse {
    ListResponse {
        channels,
        next_cursor: next_cursor.map(|c| c.to_string()),
    }
}

pub fn record(id: &str, name: &str) -> ChannelRecord {
    ChannelRecord {
        id: id.to_string(),
        name: name.to_string(),
        topic: String::new(),
        purpose: String::new(),
        is_private: false,
        is_member: true,
    }
}

pub fn message(ts: &str, thread_ts: Option<&str>, user: Option<&str>, text: &str) -> SlackMessage {
    SlackMessage {
        ts: ts.to_string(),
        thread_ts: thread_ts.map(|t| t.to_string()),
        user: user.map(|u| u.to_string()),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// Scripted Slack API. Listing pages are consumed in order; history,
/// replies and users are looked up by key. Every call is recorded.
#[derive(Default)]
pub struct FakeSlack {
    pub list_pages: RefCell<VecDeque<Result<ListResponse, SlackError>>>,
    pub list_requests: RefCell<Vec<ListRequest>>,
    /// channel id -> messages, or the Slack error code to fail with
    pub history: HashMap<String, Result<Vec<SlackMessage>, String>>,
    pub history_calls: RefCell<Vec<(String, Option<String>, Option<u32>)>>,
    /// (channel id, thread ts) -> messages
    pub replies: HashMap<(String, String), Vec<SlackMessage>>,
    pub replies_calls: RefCell<Vec<(String, String)>>,
    pub users: HashMap<String, UserProfile>,
    pub user_calls: RefCell<Vec<String>>,
    /// Rate-limit answers to hand out before `users.info` succeeds.
    pub user_rate_limits: RefCell<u32>,
    pub auth: Option<AuthInfo>,
}

impl FakeSlack {
    pub fn with_pages(pages: Vec<Result<ListResponse, SlackError>>) -> Self {
        Self {
            list_pages: RefCell::new(pages.into()),
            ..Default::default()
        }
    }

    pub fn add_user(&mut self, id: &str, real_name: &str) {
        self.users.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                name: id.to_lowercase(),
                real_name: real_name.to_string(),
                display_name: String::new(),
            },
        );
    }
}

impl SlackApi for FakeSlack {
    fn list_conversations(&self, request: &ListRequest) -> Result<ListResponse, SlackError> {
        self.list_requests.borrow_mut().push(request.clone());
        self.list_pages
            .borrow_mut()
            .pop_front()
            .expect("unexpected conversations.list request")
    }

    fn conversation_history(
        &self,
        channel: &str,
        oldest: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<SlackMessage>, SlackError> {
        self.history_calls.borrow_mut().push((
            channel.to_string(),
            oldest.map(|o| o.to_string()),
            limit,
        ));
        match self.history.get(channel) {
            Some(Ok(messages)) => {
                let n = limit.map_or(messages.len(), |l| l as usize);
                Ok(messages.iter().take(n).cloned().collect())
            }
            Some(Err(code)) => Err(api_error("conversations.history", code)),
            None => Err(api_error("conversations.history", "channel_not_found")),
        }
    }

    fn conversation_replies(
        &self,
        channel: &str,
        ts: &str,
    ) -> Result<Vec<SlackMessage>, SlackError> {
        self.replies_calls
            .borrow_mut()
            .push((channel.to_string(), ts.to_string()));
        self.replies
            .get(&(channel.to_string(), ts.to_string()))
            .cloned()
            .ok_or_else(|| api_error("conversations.replies", "thread_not_found"))
    }

    fn user_info(&self, user_id: &str) -> Result<UserProfile, SlackError> {
        self.user_calls.borrow_mut().push(user_id.to_string());
        {
            let mut remaining = self.user_rate_limits.borrow_mut();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(rate_limited(1));
            }
        }
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| api_error("users.info", "user_not_found"))
    }

    fn auth_test(&self) -> Result<AuthInfo, SlackError> {
        self.auth
            .clone()
            .ok_or_else(|| api_error("auth.test", "invalid_auth"))
    }
}

/// Summarizer that echoes a fixed reply and remembers every prompt.
pub struct EchoSummarizer {
    pub reply: Result<String, String>,
    pub prompts: std::rc::Rc<RefCell<Vec<String>>>,
}

impl EchoSummarizer {
    pub fn ok(reply: &str) -> (Self, std::rc::Rc<RefCell<Vec<String>>>) {
        let prompts = std::rc::Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                reply: Ok(reply.to_string()),
                prompts: prompts.clone(),
            },
            prompts,
        )
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            prompts: Default::default(),
        }
    }
}

impl Summarizer for EchoSummarizer {
    fn summarize(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(e) => Err(anyhow::anyhow!("{e}")),
        }
    }
}
