// Feed store — the bounded, deduplicated collection of posts.
//
// Exactly one entry per post id at any time: re-ingestion replaces the
// stored record wholesale, preserving its position in the collection.
// After every mutation the store holds at most `capacity` posts.

use anyhow::{bail, Result};

use crate::model::Post;

/// Maximum number of posts retained by default.
pub const DEFAULT_FEED_CAPACITY: usize = 500;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First observation of this id — the only outcome that should
    /// produce an outbound update notification.
    Created,
    /// The id was already present; its fields were replaced in place.
    Replaced,
}

#[derive(Debug)]
pub struct FeedStore {
    posts: Vec<Post>,
    capacity: usize,
}

impl FeedStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            posts: Vec::new(),
            capacity,
        }
    }

    /// Insert or replace a post by id.
    ///
    /// An empty id is invalid input: nothing is stored and an error is
    /// returned for the caller to report. Existing ids keep their
    /// collection position (which is what makes the platform sort's
    /// tie-breaking stable across re-ingestion).
    pub fn upsert(&mut self, post: Post) -> Result<UpsertOutcome> {
        if post.id.is_empty() {
            bail!("post rejected: empty id");
        }

        let outcome = match self.posts.iter().position(|p| p.id == post.id) {
            Some(index) => {
                self.posts[index] = post;
                UpsertOutcome::Replaced
            }
            None => {
                self.posts.push(post);
                UpsertOutcome::Created
            }
        };

        self.enforce_capacity();
        Ok(outcome)
    }

    /// Evict down to capacity, keeping the most recently *observed*
    /// posts.
    ///
    /// Tradeoff: eviction keys on `scraped_at`, not the post-native
    /// `timestamp`. A scrape storm of old content can't grow the store
    /// without bound, but a genuinely new post observed late loses to a
    /// stale post scraped a moment ago. Intentional; do not switch the
    /// key to `timestamp` without revisiting the memory bound.
    fn enforce_capacity(&mut self) {
        if self.posts.len() > self.capacity {
            self.posts.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
            self.posts.truncate(self.capacity);
        }
    }

    /// Remove every post produced by the given session. Returns how
    /// many were removed; zero is fine (the session may never have
    /// produced anything).
    pub fn cascade_delete(&mut self, session_id: &str) -> usize {
        let before = self.posts.len();
        self.posts.retain(|p| p.source_tab_id != session_id);
        before - self.posts.len()
    }

    /// Empty the store unconditionally.
    pub fn clear_all(&mut self) {
        self.posts.clear();
    }

    /// An owned copy for read-only consumption — callers never observe
    /// a partially applied mutation.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.clone()
    }

    /// Replace the whole collection (startup load). The capacity bound
    /// applies to loaded state too, in case it was written by a build
    /// with a larger limit.
    pub fn replace_all(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.enforce_capacity();
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
