// Tab registry — which browser sessions count as content sources.
//
// Classification is a fixed rule set: a session is monitorable when its
// URL is a scrollable timeline on a known platform domain. Profile,
// single-post, and search/trending pages are excluded — they don't carry
// a feed the producers can scrape. The registry itself is pure
// bookkeeping keyed by session id and is never persisted; it is rebuilt
// from session events on every process start.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::Platform;

/// Mastodon has no single canonical domain; this covers the large
/// general-purpose instances. Anything else is treated as
/// non-monitorable rather than guessed at.
const MASTODON_DOMAINS: &[&str] = &[
    "mastodon.social",
    "mastodon.online",
    "mstdn.social",
    "fosstodon.org",
    "hachyderm.io",
    "infosec.exchange",
];

/// One session currently classified as a content source.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub url: String,
    pub platform: Platform,
    pub last_active: DateTime<Utc>,
}

/// Classify a URL: which platform's feed is this, if any?
///
/// Returns `None` for unknown domains and for pages without a
/// scrollable timeline (single posts, profiles, search, trending).
pub fn classify(url: &str) -> Option<Platform> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, format!("/{path}")),
        None => (rest, "/".to_string()),
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    // Drop the query string; path rules don't care about it.
    let path = path.split('?').next().unwrap_or("/");

    let platform = if host == "twitter.com" || host == "x.com" {
        Platform::Twitter
    } else if host == "bsky.app" {
        Platform::Bluesky
    } else if MASTODON_DOMAINS.contains(&host) {
        Platform::Mastodon
    } else {
        return None;
    };

    if is_feed_path(platform, path) {
        Some(platform)
    } else {
        None
    }
}

/// Does this path hold a scrollable feed (as opposed to a single post,
/// profile, or search page)?
fn is_feed_path(platform: Platform, path: &str) -> bool {
    // Single-post pages, on every platform.
    if path.contains("/status/") || path.contains("/post/") {
        return false;
    }

    match platform {
        Platform::Twitter => {
            matches!(path, "/" | "/home") || path.starts_with("/i/lists/")
        }
        Platform::Bluesky => {
            // Feeds and the home timeline; /profile/<user> alone is a
            // profile page, /profile/<user>/feed/<name> is a feed.
            path == "/" || path.starts_with("/feeds") || path.contains("/feed/")
        }
        Platform::Mastodon => {
            if path.starts_with("/search") || path.starts_with("/explore") {
                return false;
            }
            // /@user is a profile, /@user/123... is a single toot.
            if path.starts_with("/@") {
                return false;
            }
            matches!(path, "/" | "/home" | "/public" | "/public/local")
                || path.starts_with("/deck")
        }
    }
}

/// Tracks the sessions currently treated as monitorable sources.
#[derive(Debug, Default)]
pub struct TabRegistry {
    sessions: HashMap<String, SessionRecord>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a session record. Idempotent; called for
    /// every created/updated event whose URL classifies as a feed.
    pub fn start_monitoring(&mut self, session_id: &str, url: &str, platform: Platform) {
        self.sessions.insert(
            session_id.to_string(),
            SessionRecord {
                session_id: session_id.to_string(),
                url: url.to_string(),
                platform,
                last_active: Utc::now(),
            },
        );
    }

    /// Remove a session. Returns whether it was present; unknown ids
    /// are a silent no-op (the session may already be gone).
    pub fn stop_monitoring(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Update `last_active` on a focus event. Unknown ids are ignored.
    pub fn touch(&mut self, session_id: &str) {
        if let Some(record) = self.sessions.get_mut(session_id) {
            record.last_active = Utc::now();
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_twitter_timeline() {
        assert_eq!(classify("https://twitter.com/home"), Some(Platform::Twitter));
        assert_eq!(classify("https://x.com/home"), Some(Platform::Twitter));
        assert_eq!(classify("https://x.com/"), Some(Platform::Twitter));
        assert_eq!(classify("https://www.x.com/home"), Some(Platform::Twitter));
    }

    #[test]
    fn test_classify_rejects_single_post() {
        assert_eq!(classify("https://x.com/someone/status/123"), None);
        assert_eq!(classify("https://twitter.com/someone/status/123"), None);
        assert_eq!(
            classify("https://bsky.app/profile/a.bsky.social/post/xyz"),
            None
        );
    }

    #[test]
    fn test_classify_rejects_profiles_and_search() {
        assert_eq!(classify("https://x.com/someone"), None);
        assert_eq!(classify("https://bsky.app/profile/a.bsky.social"), None);
        assert_eq!(classify("https://mastodon.social/@user"), None);
        assert_eq!(classify("https://mastodon.social/@user/1099"), None);
        assert_eq!(classify("https://mastodon.social/search?q=rust"), None);
        assert_eq!(classify("https://mastodon.social/explore"), None);
    }

    #[test]
    fn test_classify_accepts_feed_pages() {
        assert_eq!(classify("https://bsky.app/"), Some(Platform::Bluesky));
        assert_eq!(classify("https://bsky.app/feeds"), Some(Platform::Bluesky));
        assert_eq!(
            classify("https://bsky.app/profile/a.bsky.social/feed/whats-hot"),
            Some(Platform::Bluesky)
        );
        assert_eq!(
            classify("https://mastodon.social/home"),
            Some(Platform::Mastodon)
        );
        assert_eq!(
            classify("https://hachyderm.io/public/local"),
            Some(Platform::Mastodon)
        );
    }

    #[test]
    fn test_classify_unknown_domain() {
        assert_eq!(classify("https://example.com/home"), None);
        assert_eq!(classify("not a url"), None);
    }

    #[test]
    fn test_registry_start_stop() {
        let mut registry = TabRegistry::new();
        registry.start_monitoring("tab-1", "https://x.com/home", Platform::Twitter);
        registry.start_monitoring("tab-1", "https://x.com/home", Platform::Twitter);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("tab-1"));

        assert!(registry.stop_monitoring("tab-1"));
        // Unknown id: silent no-op
        assert!(!registry.stop_monitoring("tab-1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_touch_unknown_session_is_noop() {
        let mut registry = TabRegistry::new();
        registry.touch("never-seen");
        assert!(registry.is_empty());
    }
}
