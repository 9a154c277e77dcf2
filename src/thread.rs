use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::ratelimit::ApiContext;
use crate::slack::SlackMessage;

/// Link back to a thread in the Slack web UI.
///
/// Slack permalinks drop the dot from the timestamp and prefix it with `p`:
/// `1610000000.000100` becomes `p1610000000000100`.
pub fn thread_permalink(workspace: &str, channel_id: &str, thread_ts: &str) -> String {
    let ts = thread_ts.replace('.', "");
    format!("https://{workspace}.slack.com/archives/{channel_id}/p{ts}")
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"archives/([A-Z0-9]+)/p(\d{10})(\d+)").expect("static regex is valid")
    })
}

/// Extract `(channel_id, thread_ts)` from a Slack message permalink.
pub fn parse_thread_link(link: &str) -> Option<(String, String)> {
    let caps = link_pattern().captures(link)?;
    let channel = caps[1].to_string();
    let ts = format!("{}.{}", &caps[2], &caps[3]);
    Some((channel, ts))
}

/// Messages that start a thread, in their original order.
pub fn root_threads(messages: &[SlackMessage]) -> Vec<&SlackMessage> {
    messages.iter().filter(|m| m.is_thread_root()).collect()
}

/// Slack `oldest` value for midnight of `date` in the given offset.
pub fn since_timestamp(date: NaiveDate, offset: FixedOffset) -> String {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc = local_midnight - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    utc.and_utc().timestamp().to_string()
}

/// Render a Slack timestamp as `YYYY-MM-DD HH:MM` in the given offset.
/// Unparseable timestamps are returned unchanged.
pub fn format_ts(ts: &str, offset: FixedOffset) -> String {
    let secs = ts.split('.').next().and_then(|s| s.parse::<i64>().ok());
    match secs.and_then(|s| DateTime::from_timestamp(s, 0)) {
        Some(dt) => dt.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}

/// Per-run cache of user id -> display name.
#[derive(Debug, Default)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a known name, skipping the `users.info` lookup for that id.
    pub fn insert(&mut self, user_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(user_id.into(), name.into());
    }

    /// Name to show for the author of `message`.
    ///
    /// Human authors are looked up once through `users.info`; bots fall back
    /// to the message's `username` or bot profile.
    pub fn resolve(&mut self, ctx: &ApiContext<'_>, message: &SlackMessage) -> String {
        if let Some(user_id) = message.user.as_deref() {
            if let Some(name) = self.names.get(user_id) {
                return name.clone();
            }
            let name = match ctx.call(|api| api.user_info(user_id)) {
                Ok(profile) => profile.best_name().to_string(),
                Err(e) => {
                    tracing::warn!("users.info failed for {user_id}: {e}");
                    format!("(unknown: {user_id})")
                }
            };
            self.names.insert(user_id.to_string(), name.clone());
            return name;
        }

        if let Some(username) = message.username.as_deref() {
            return username.to_string();
        }
        if let Some(bot) = message.bot_profile.as_ref().and_then(|b| b.name.as_deref()) {
            return format!("{bot} (bot)");
        }
        let id = message.bot_id.as_deref().unwrap_or("unknown");
        format!("(unknown: {id})")
    }
}

/// Flatten a thread into `name: text` lines for the summarizer.
/// Code fences and inline code are replaced with placeholders.
pub fn render_transcript(lines: &[(String, String)]) -> String {
    lines
        .iter()
        .map(|(name, text)| {
            let text = text.replace("```", "[code block]").replace('`', "[code]");
            format!("{name}: {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve authors and render the transcript of a whole thread.
pub fn transcript_for(
    ctx: &ApiContext<'_>,
    users: &mut UserDirectory,
    messages: &[SlackMessage],
) -> String {
    let lines: Vec<(String, String)> = messages
        .iter()
        .map(|m| (users.resolve(ctx, m), m.text.clone().unwrap_or_default()))
        .collect();
    render_transcript(&lines)
}
