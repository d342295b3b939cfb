// Data models — the types that flow through the engine.
//
// These are separate from persistence so other modules can use them
// without depending on rusqlite directly. Engagement counters arrive
// under per-platform field names and are normalized here, once, at the
// ingestion boundary — read sites only ever see the canonical triple.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sort::SortPolicy;

/// The platforms the engine knows how to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Bluesky,
    Mastodon,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Bluesky => "bluesky",
            Platform::Mastodon => "mastodon",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who wrote a post. The handle is the cross-platform identity key —
/// display names collide, handles don't (per platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Engagement counters as producers emit them. Field names vary by
/// platform (likes/favourites, retweets/boosts/reblogs, replies/comments),
/// so every known spelling is accepted and missing counters mean zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEngagement {
    #[serde(default, alias = "comments")]
    pub replies: Option<u64>,
    #[serde(default, alias = "retweets", alias = "boosts", alias = "reblogs")]
    pub reposts: Option<u64>,
    #[serde(default, alias = "favorites", alias = "favourites")]
    pub likes: Option<u64>,
}

impl RawEngagement {
    /// Collapse to the canonical triple, treating absent counters as 0.
    pub fn normalize(&self) -> Engagement {
        Engagement {
            replies: self.replies.unwrap_or(0),
            reposts: self.reposts.unwrap_or(0),
            likes: self.likes.unwrap_or(0),
        }
    }
}

/// Canonical engagement triple, normalized at ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub replies: u64,
    pub reposts: u64,
    pub likes: u64,
}

impl Engagement {
    /// Combined engagement, the key for the engagement sort.
    pub fn total(&self) -> u64 {
        self.replies + self.reposts + self.likes
    }
}

/// One observed social post, deduplicated by `id` across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Identity key — stable across re-observation of the same post.
    pub id: String,
    pub platform: Platform,
    pub author: Author,
    pub content: String,
    /// Post-native creation time; absent when the producer couldn't
    /// read one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// When a producer observed this post. Always present; the key for
    /// capacity eviction.
    pub scraped_at: DateTime<Utc>,
    pub engagement: Engagement,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Set when the record is a reshare: the account that re-broadcast
    /// the post, distinct from the original author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposter: Option<String>,
    /// The session that produced this record; cascade-delete key.
    pub source_tab_id: String,
}

impl Post {
    /// The time used for chronological ordering: post-native when the
    /// producer found one, observation time otherwise.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or(self.scraped_at)
    }
}

/// A post as a producer emits it, before normalization. The engine fills
/// in `scraped_at` (when omitted) and the source session at ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingPost {
    pub id: String,
    pub platform: Platform,
    pub author: Author,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "scrapedAt")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engagement: RawEngagement,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub reposter: Option<String>,
}

impl IncomingPost {
    /// Normalize into a stored post record.
    pub fn into_post(self, source_tab_id: &str, now: DateTime<Utc>) -> Post {
        Post {
            id: self.id,
            platform: self.platform,
            author: self.author,
            content: self.content,
            timestamp: self.timestamp,
            scraped_at: self.scraped_at.unwrap_or(now),
            engagement: self.engagement.normalize(),
            images: self.images,
            reposter: self.reposter,
            source_tab_id: source_tab_id.to_string(),
        }
    }
}

/// User-facing settings, persisted alongside the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub sort_by: SortPolicy,
    #[serde(default = "default_true")]
    pub show_notifications: bool,
    #[serde(default)]
    pub auto_refresh: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_by: SortPolicy::Chronological,
            show_notifications: true,
            auto_refresh: false,
        }
    }
}

/// The single durable record: the whole feed plus settings, written as
/// one JSON blob per debounced save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub settings: Settings,
}
