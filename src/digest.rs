use chrono::FixedOffset;
use std::collections::HashSet;

use crate::ratelimit::ApiContext;
use crate::slack::{ChannelRecord, SlackError};
use crate::summarize::{build_prompt, SummaryService};
use crate::thread::{self, UserDirectory};

/// Fallback permalink subdomain when none is configured or discoverable.
pub const DEFAULT_WORKSPACE: &str = "workspace";

#[derive(Debug, Clone)]
pub struct DigestRequest {
    /// Slack `oldest` timestamp; only threads started after it are included.
    pub since: String,
    pub max_threads: usize,
    /// Subdomain used to build permalinks.
    pub workspace: String,
    pub utc_offset: FixedOffset,
    pub language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ThreadDigest {
    pub channel_id: String,
    pub channel_name: String,
    pub ts: String,
    /// Thread start, `YYYY-MM-DD HH:MM` in the request's offset.
    pub posted_at: String,
    pub permalink: String,
    /// The summary, or a readable notice if it could not be produced.
    pub summary: String,
    pub message_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelDigest {
    pub channel_name: String,
    pub threads: Vec<ThreadDigest>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DigestReport {
    pub channels: Vec<ChannelDigest>,
    /// Channels that had no threads since the cutoff.
    pub empty_channels: Vec<String>,
    /// Requested channel names that were not found among member channels.
    pub unknown_channels: Vec<String>,
}

impl DigestReport {
    pub fn total_threads(&self) -> usize {
        self.channels.iter().map(|c| c.threads.len()).sum()
    }
}

/// Workspace subdomain for permalinks: the configured value, else the one
/// reported by `auth.test`, else `DEFAULT_WORKSPACE`.
pub fn resolve_workspace(ctx: &ApiContext<'_>, configured: Option<&str>) -> String {
    if let Some(ws) = configured.filter(|w| !w.is_empty()) {
        return ws.to_string();
    }
    match ctx.call(|api| api.auth_test()) {
        Ok(info) => info.workspace_identifier().unwrap_or_else(|| {
            tracing::warn!("auth.test returned no workspace name; using '{DEFAULT_WORKSPACE}'");
            DEFAULT_WORKSPACE.to_string()
        }),
        Err(e) => {
            tracing::warn!("Failed to fetch team info: {e}");
            DEFAULT_WORKSPACE.to_string()
        }
    }
}

/// Ids of the channels with at least one message since `since`.
/// Channels whose history cannot be read are left out.
pub fn active_channel_ids(
    ctx: &ApiContext<'_>,
    channels: &[ChannelRecord],
    since: &str,
) -> HashSet<String> {
    let mut active = HashSet::new();
    for ch in channels {
        match ctx.call(|api| api.conversation_history(&ch.id, Some(since), Some(1))) {
            Ok(messages) if !messages.is_empty() => {
                active.insert(ch.id.clone());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to check messages in #{}: {e}", ch.name),
        }
    }
    active
}

/// Fetch one thread and summarize it. Returns the summary (or notice) and
/// the number of messages in the thread.
pub fn summarize_thread(
    ctx: &ApiContext<'_>,
    users: &mut UserDirectory,
    summaries: &SummaryService,
    channel_id: &str,
    thread_ts: &str,
    language: Option<&str>,
) -> Result<(String, usize), SlackError> {
    let messages = ctx.call(|api| api.conversation_replies(channel_id, thread_ts))?;
    let transcript = thread::transcript_for(ctx, users, &messages);
    let prompt = build_prompt(&transcript, language);
    Ok((summaries.summarize_or_notice(&prompt), messages.len()))
}

/// Summarize recent threads in each channel, one channel and one thread at
/// a time. A failing channel or thread is recorded and the rest continue.
pub fn build_digest(
    ctx: &ApiContext<'_>,
    summaries: &SummaryService,
    channels: &[ChannelRecord],
    request: &DigestRequest,
) -> DigestReport {
    let mut report = DigestReport::default();
    let mut users = UserDirectory::new();

    for ch in channels {
        tracing::info!("Loading threads in #{}", ch.name);
        let since = Some(request.since.as_str());
        let history = match ctx.call(|api| api.conversation_history(&ch.id, since, None)) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Failed to process #{}: {e}", ch.name);
                report.channels.push(ChannelDigest {
                    channel_name: ch.name.clone(),
                    threads: Vec::new(),
                    error: Some(format!("Failed to process #{}: {e}", ch.name)),
                });
                continue;
            }
        };

        let roots: Vec<_> = thread::root_threads(&history)
            .into_iter()
            .take(request.max_threads)
            .collect();
        if roots.is_empty() {
            report.empty_channels.push(ch.name.clone());
            continue;
        }

        let mut digest = ChannelDigest {
            channel_name: ch.name.clone(),
            ..Default::default()
        };
        for (i, root) in roots.iter().enumerate() {
            tracing::info!("Summarizing thread {}/{} in #{}", i + 1, roots.len(), ch.name);
            let (summary, message_count) = match summarize_thread(
                ctx,
                &mut users,
                summaries,
                &ch.id,
                &root.ts,
                request.language.as_deref(),
            ) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Failed to fetch thread {} in #{}: {e}", root.ts, ch.name);
                    (format!("Failed to fetch thread: {e}"), 0)
                }
            };
            digest.threads.push(ThreadDigest {
                channel_id: ch.id.clone(),
                channel_name: ch.name.clone(),
                ts: root.ts.clone(),
                posted_at: thread::format_ts(&root.ts, request.utc_offset),
                permalink: thread::thread_permalink(&request.workspace, &ch.id, &root.ts),
                summary,
                message_count,
            });
        }
        report.channels.push(digest);
    }

    report
}
