mod common;

use common::{api_error, page, raw_channel, rate_limited, FakeSlack, RecordingSleeper};
use slack_digest::lister::{list_member_channels, ListOptions};
use slack_digest::ratelimit::{ApiContext, RetryPolicy};
use slack_digest::slack::ResourceType;
use std::time::Duration;

fn options(max_pages: u32) -> ListOptions {
    ListOptions {
        max_pages,
        ..Default::default()
    }
}

#[test]
fn test_two_pages_keeps_members_only() {
    let api = FakeSlack::with_pages(vec![
        Ok(page(
            vec![
                raw_channel("C1", "general", true),
                raw_channel("C2", "secret", false),
                raw_channel("C3", "dev", true),
            ],
            Some("dXNlcjpVMDYxTkZUVDI="),
        )),
        Ok(page(vec![raw_channel("C4", "ops", true)], None)),
    ]);
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    let listing = list_member_channels(&ctx, &options(10));

    let ids: Vec<_> = listing.channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C1", "C3", "C4"]);
    assert!(listing.channels.iter().all(|c| c.is_member));
    assert_eq!(listing.pages, 2);
    assert!(listing.error.is_none());

    let requests = api.list_requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].cursor, None);
    // The cursor is forwarded verbatim
    assert_eq!(requests[1].cursor.as_deref(), Some("dXNlcjpVMDYxTkZUVDI="));
    // One courtesy pause between the two pages
    assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_millis(300)]);
}

#[test]
fn test_request_parameters() {
    let api = FakeSlack::with_pages(vec![Ok(page(vec![], None))]);
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    list_member_channels(&ctx, &options(10));

    let requests = api.list_requests.borrow();
    assert_eq!(
        requests[0].types,
        vec![ResourceType::PublicChannel, ResourceType::PrivateChannel]
    );
    assert_eq!(requests[0].types_param(), "public_channel,private_channel");
    assert_eq!(requests[0].limit, 1000);
    assert!(!requests[0].exclude_archived);
}

#[test]
fn test_max_pages_caps_requests() {
    let pages = (0..5)
        .map(|i| {
            let cursor = format!("cursor-{i}");
            Ok(page(
                vec![raw_channel(&format!("C{i}"), &format!("ch{i}"), true)],
                Some(cursor.as_str()),
            ))
        })
        .collect();
    let api = FakeSlack::with_pages(pages);
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    let listing = list_member_channels(&ctx, &options(3));

    assert_eq!(api.list_requests.borrow().len(), 3);
    assert_eq!(listing.channels.len(), 3);
    assert_eq!(listing.pages, 3);
    assert!(listing.error.is_none());
    // No pause after the last allowed page
    assert_eq!(sleeper.slept.borrow().len(), 2);
}

#[test]
fn test_zero_max_pages_issues_no_request() {
    let api = FakeSlack::default();
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    let listing = list_member_channels(&ctx, &options(0));

    assert!(api.list_requests.borrow().is_empty());
    assert!(listing.channels.is_empty());
}

#[test]
fn test_rate_limit_is_retried_with_same_request() {
    let api = FakeSlack::with_pages(vec![
        Err(rate_limited(2)),
        Ok(page(vec![raw_channel("C1", "general", true)], None)),
    ]);
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    let listing = list_member_channels(&ctx, &options(10));

    assert_eq!(listing.channels.len(), 1);
    assert!(listing.error.is_none());
    let requests = api.list_requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert!(sleeper.total() >= Duration::from_secs(2));
    assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_secs(2)]);
}

#[test]
fn test_error_keeps_partial_results() {
    let api = FakeSlack::with_pages(vec![
        Ok(page(
            vec![raw_channel("C1", "general", true)],
            Some("next"),
        )),
        Err(api_error("conversations.list", "internal_error")),
    ]);
    let sleeper = RecordingSleeper::default();
    let ctx = ApiContext::new(&api, &sleeper, RetryPolicy::unbounded());

    let listing = list_member_channels(&ctx, &options(10));

    assert_eq!(listing.channels.len(), 1);
    assert_eq!(listing.pages, 1);
    let err = listing.error.unwrap();
    assert!(err.contains("internal_error"), "{err}");
    // Non-rate-limit failures are not retried
    assert_eq!(api.list_requests.borrow().len(), 2);
}

#[test]
fn test_exhausted_rate_limit_surfaces_as_error() {
    let api = FakeSlack::with_pages(vec![
        Err(rate_limited(1)),
        Err(rate_limited(1)),
        Err(rate_limited(1)),
    ]);
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy {
        max_retries: Some(2),
        max_total_wait: None,
    };
    let ctx = ApiContext::new(&api, &sleeper, policy);

    let listing = list_member_channels(&ctx, &options(10));

    assert!(listing.channels.is_empty());
    assert!(listing.error.unwrap().contains("still rate limited"));
    assert_eq!(api.list_requests.borrow().len(), 3);
}

#[test]
fn test_projection_drops_unknown_fields() {
    let json = serde_json::json!({
        "id": "C9",
        "name": "design",
        "is_channel": true,
        "is_private": true,
        "is_member": true,
        "topic": { "value": "Figma links", "creator": "U1", "last_set": 0 },
        "purpose": { "value": "", "creator": "", "last_set": 0 },
        "num_members": 12
    });
    let raw: slack_digest::slack::RawChannel = serde_json::from_value(json).unwrap();
    let record = slack_digest::slack::ChannelRecord::from(raw);
    assert_eq!(record.id, "C9");
    assert_eq!(record.topic, "Figma links");
    assert_eq!(record.purpose, "");
    assert!(record.is_private);
}
