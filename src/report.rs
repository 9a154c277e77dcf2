use std::collections::HashSet;
use std::fmt::Write;

use crate::digest::DigestReport;
use crate::slack::ChannelRecord;

/// Markdown rendering of a digest: one section per channel, one entry per
/// thread, then a closing summary line.
pub fn render_digest(report: &DigestReport) -> String {
    let mut out = String::new();

    for channel in &report.channels {
        if let Some(err) = &channel.error {
            let _ = writeln!(out, "> {err}\n");
            continue;
        }
        let _ = writeln!(
            out,
            "### {} ({} threads)\n",
            channel.channel_name,
            channel.threads.len()
        );
        for t in &channel.threads {
            let _ = writeln!(out, "**{}** · [open thread]({})", t.posted_at, t.permalink);
            let _ = writeln!(out, "{}", t.summary);
            let _ = writeln!(out, "_{} messages_\n", t.message_count);
        }
    }

    if !report.unknown_channels.is_empty() {
        let _ = writeln!(
            out,
            "Not a member of (or no such channel): {}",
            hashtags(&report.unknown_channels)
        );
    }

    let total = report.total_threads();
    if total == 0 {
        let _ = writeln!(out, "No threads to summarize in the selected channels.");
    } else {
        if !report.empty_channels.is_empty() {
            let _ = writeln!(
                out,
                "No threads found in: {}",
                hashtags(&report.empty_channels)
            );
        }
        let _ = writeln!(out, "Summarized {total} threads.");
    }

    out
}

fn hashtags(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per channel: activity marker (when known), privacy marker, name, topic.
pub fn render_channels(channels: &[ChannelRecord], active: Option<&HashSet<String>>) -> String {
    let mut out = String::new();
    for ch in channels {
        let activity = match active {
            Some(ids) if ids.contains(&ch.id) => "* ",
            Some(_) => "  ",
            None => "",
        };
        let privacy = if ch.is_private { "private" } else { "public " };
        let _ = write!(out, "{activity}{privacy}  #{}", ch.name);
        if !ch.topic.is_empty() {
            let _ = write!(out, "  {}", ch.topic);
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{} channels", channels.len());
    out
}
