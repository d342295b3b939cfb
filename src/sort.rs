// Sort engine — pure ordering over feed snapshots.
//
// All policies are stable sorts, so posts that compare equal keep the
// order they had in the underlying collection. Nothing here mutates the
// snapshot or touches engine state.

use serde::{Deserialize, Serialize};

use crate::model::Post;

/// How a feed view is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Newest first by post time (observation time when absent).
    #[default]
    Chronological,
    /// Oldest first, same key.
    ChronologicalOld,
    /// Highest combined replies + reposts + likes first.
    Engagement,
    /// Platform name ascending, newest first within each platform.
    Platform,
}

impl SortPolicy {
    /// Parse a policy name. Unknown names fall back to chronological —
    /// a consumer sending a policy this build doesn't know must still
    /// get a feed, never an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "chronological" => SortPolicy::Chronological,
            "chronological-old" => SortPolicy::ChronologicalOld,
            "engagement" => SortPolicy::Engagement,
            "platform" => SortPolicy::Platform,
            _ => SortPolicy::Chronological,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortPolicy::Chronological => "chronological",
            SortPolicy::ChronologicalOld => "chronological-old",
            SortPolicy::Engagement => "engagement",
            SortPolicy::Platform => "platform",
        }
    }
}

impl std::fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order a snapshot under the given policy.
pub fn order(snapshot: &[Post], policy: SortPolicy) -> Vec<Post> {
    let mut posts: Vec<Post> = snapshot.to_vec();
    match policy {
        SortPolicy::Chronological => {
            posts.sort_by(|a, b| b.effective_time().cmp(&a.effective_time()));
        }
        SortPolicy::ChronologicalOld => {
            posts.sort_by(|a, b| a.effective_time().cmp(&b.effective_time()));
        }
        SortPolicy::Engagement => {
            posts.sort_by(|a, b| b.engagement.total().cmp(&a.engagement.total()));
        }
        SortPolicy::Platform => {
            posts.sort_by(|a, b| {
                a.platform
                    .as_str()
                    .cmp(b.platform.as_str())
                    .then_with(|| b.effective_time().cmp(&a.effective_time()))
            });
        }
    }
    posts
}
