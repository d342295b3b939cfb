// Host bridge — everything the engine asks of its host environment.
//
// All of it is best-effort: a failed notification or rescan is logged by
// the engine and ignored. The next user-triggered or periodic refresh
// retries implicitly; nothing here may abort message processing.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::model::Post;

/// Unsolicited outbound events to the presentation consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A post was newly created in the feed (never emitted for
    /// re-ingestion of a known id).
    #[serde(rename = "FEED_UPDATED")]
    FeedUpdated { new_post: Box<Post> },
    /// The feed was explicitly cleared.
    #[serde(rename = "FEED_CLEARED")]
    FeedCleared,
}

#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Push a feed notification to the consumer.
    async fn notify(&self, notification: Notification) -> Result<()>;

    /// Ask one session's producer to re-extract its page. No retry on
    /// failure.
    async fn rescan(&self, session_id: &str) -> Result<()>;

    /// Open a post URL in a new foregrounded session.
    async fn open_url(&self, url: &str) -> Result<()>;

    /// Periodic no-op ping that lowers the odds of the host suspending
    /// the process mid-save-window. Correctness never depends on it.
    async fn keepalive(&self) -> Result<()>;
}
