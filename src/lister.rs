use std::time::Duration;

use crate::ratelimit::ApiContext;
use crate::slack::{ChannelRecord, ListRequest, ResourceType};

#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Ceiling on `conversations.list` round-trips, not on channels returned.
    pub max_pages: u32,
    pub page_size: u32,
    /// Pause between pages, on top of any rate-limit backoff.
    pub page_delay: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            page_size: 1000,
            page_delay: Duration::from_millis(300),
        }
    }
}

/// Channels gathered by `list_member_channels`.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Member channels in the order Slack returned them.
    pub channels: Vec<ChannelRecord>,
    /// Pages fetched successfully.
    pub pages: u32,
    /// Set when a non-rate-limit failure stopped the listing early.
    /// `channels` still holds everything gathered before it.
    pub error: Option<String>,
}

/// Page through `conversations.list` (public and private, archived included)
/// and keep the channels the user is a member of.
///
/// Stops when Slack returns no further cursor, after `max_pages` requests,
/// or at the first failure that is not a rate limit.
pub fn list_member_channels(ctx: &ApiContext<'_>, options: &ListOptions) -> Listing {
    let mut listing = Listing::default();
    let mut cursor: Option<String> = None;

    while listing.pages < options.max_pages {
        let request = ListRequest {
            types: vec![ResourceType::PublicChannel, ResourceType::PrivateChannel],
            limit: options.page_size,
            exclude_archived: false,
            cursor: cursor.take(),
        };

        let response = match ctx.call(|api| api.list_conversations(&request)) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to list channels: {e}");
                listing.error = Some(format!("Failed to list channels: {e}"));
                break;
            }
        };
        listing.pages += 1;

        listing.channels.extend(
            response
                .channels
                .into_iter()
                .filter(|ch| ch.is_member)
                .map(ChannelRecord::from),
        );

        match response.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }

        if listing.pages < options.max_pages {
            ctx.sleeper.sleep(options.page_delay);
        }
    }

    tracing::info!(
        channels = listing.channels.len(),
        pages = listing.pages,
        "loaded member channels"
    );
    listing
}
