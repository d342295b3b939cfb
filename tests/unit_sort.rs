// Sort engine tests — policy ordering, tie-breaking, and fallbacks.

use chrono::{DateTime, Duration, TimeZone, Utc};

use tributary::model::{Author, Engagement, Platform, Post};
use tributary::sort::{order, SortPolicy};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn post(id: &str, platform: Platform, likes: u64, minutes_ago: i64) -> Post {
    Post {
        id: id.to_string(),
        platform,
        author: Author {
            name: "Someone".to_string(),
            handle: "@someone".to_string(),
            avatar: None,
        },
        content: format!("post {id}"),
        timestamp: Some(base_time() - Duration::minutes(minutes_ago)),
        scraped_at: base_time(),
        engagement: Engagement {
            replies: 0,
            reposts: 0,
            likes,
        },
        images: vec![],
        reposter: None,
        source_tab_id: "tab-1".to_string(),
    }
}

#[test]
fn test_engagement_sort_is_descending_by_total() {
    let snapshot = vec![
        post("mid", Platform::Twitter, 10, 0),
        post("low", Platform::Twitter, 5, 0),
        post("high", Platform::Twitter, 20, 0),
    ];
    let ordered = order(&snapshot, SortPolicy::Engagement);
    let likes: Vec<u64> = ordered.iter().map(|p| p.engagement.likes).collect();
    assert_eq!(likes, vec![20, 10, 5]);
}

#[test]
fn test_engagement_sort_treats_defaulted_counters_as_zero() {
    let mut no_engagement = post("none", Platform::Twitter, 0, 0);
    no_engagement.engagement = Engagement::default();
    let snapshot = vec![no_engagement, post("some", Platform::Twitter, 1, 0)];
    let ordered = order(&snapshot, SortPolicy::Engagement);
    assert_eq!(ordered[0].id, "some");
    assert_eq!(ordered[1].id, "none");
}

#[test]
fn test_engagement_sort_ties_keep_collection_order() {
    let snapshot = vec![
        post("first", Platform::Twitter, 7, 0),
        post("second", Platform::Bluesky, 7, 0),
        post("third", Platform::Mastodon, 7, 0),
    ];
    let ordered = order(&snapshot, SortPolicy::Engagement);
    let ids: Vec<&str> = ordered.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn test_chronological_newest_first_and_oldest_first() {
    let snapshot = vec![
        post("old", Platform::Twitter, 0, 60),
        post("new", Platform::Twitter, 0, 1),
        post("mid", Platform::Twitter, 0, 30),
    ];

    let newest = order(&snapshot, SortPolicy::Chronological);
    let ids: Vec<&str> = newest.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);

    let oldest = order(&snapshot, SortPolicy::ChronologicalOld);
    let ids: Vec<&str> = oldest.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["old", "mid", "new"]);
}

#[test]
fn test_chronological_falls_back_to_scraped_at() {
    let mut no_timestamp = post("no-ts", Platform::Twitter, 0, 0);
    no_timestamp.timestamp = None;
    no_timestamp.scraped_at = base_time() - Duration::minutes(10);
    let snapshot = vec![no_timestamp, post("recent", Platform::Twitter, 0, 1)];
    let ordered = order(&snapshot, SortPolicy::Chronological);
    // scraped_at 10 minutes ago loses to a post timestamped 1 minute ago.
    assert_eq!(ordered[0].id, "recent");
}

#[test]
fn test_platform_sort_groups_then_newest_within_group() {
    let snapshot = vec![
        post("tw-old", Platform::Twitter, 0, 60),
        post("ms-1", Platform::Mastodon, 0, 5),
        post("bs-1", Platform::Bluesky, 0, 5),
        post("tw-new", Platform::Twitter, 0, 1),
    ];
    let ordered = order(&snapshot, SortPolicy::Platform);
    let ids: Vec<&str> = ordered.iter().map(|p| p.id.as_str()).collect();
    // bluesky < mastodon < twitter lexicographically; newest first inside.
    assert_eq!(ids, vec!["bs-1", "ms-1", "tw-new", "tw-old"]);
}

#[test]
fn test_order_does_not_mutate_the_snapshot() {
    let snapshot = vec![
        post("b", Platform::Twitter, 1, 0),
        post("a", Platform::Twitter, 2, 0),
    ];
    let _ = order(&snapshot, SortPolicy::Engagement);
    assert_eq!(snapshot[0].id, "b");
    assert_eq!(snapshot[1].id, "a");
}

#[test]
fn test_empty_snapshot_orders_to_empty() {
    for policy in [
        SortPolicy::Chronological,
        SortPolicy::ChronologicalOld,
        SortPolicy::Engagement,
        SortPolicy::Platform,
    ] {
        assert!(order(&[], policy).is_empty());
    }
}
