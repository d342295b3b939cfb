// Wire contract — the JSON message shapes spoken over the host channel.
//
// The `run` command frames these as newline-delimited JSON on
// stdin/stdout. Inbound lines are requests or session lifecycle events;
// outbound lines are responses (acks, feeds) and unsolicited host
// events (notifications, rescan requests, open-url).
//
// Field names accept both snake_case and the camelCase producers emit.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::engine::SessionEventKind;
use crate::host::{HostBridge, Notification};
use crate::model::{IncomingPost, Post, Settings};

/// One inbound line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "NEW_POST")]
    NewPost {
        post: IncomingPost,
        #[serde(alias = "sourceTabId")]
        source_tab_id: String,
    },
    #[serde(rename = "GET_FEED")]
    GetFeed {
        /// Policy name; unknown names fall back to chronological, so
        /// this stays a string until the engine resolves it.
        #[serde(default, alias = "sortBy")]
        sort_by: Option<String>,
    },
    #[serde(rename = "OPEN_POST")]
    OpenPost { url: String },
    #[serde(rename = "REFRESH_FEED")]
    RefreshFeed,
    #[serde(rename = "CLEAR_FEED")]
    ClearFeed,
    #[serde(rename = "UPDATE_SETTINGS")]
    UpdateSettings { settings: Settings },
    #[serde(rename = "SESSION_EVENT")]
    SessionEvent {
        event: WireSessionEvent,
        #[serde(alias = "sessionId")]
        session_id: String,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireSessionEvent {
    Created,
    Updated,
    Activated,
    Removed,
}

impl From<WireSessionEvent> for SessionEventKind {
    fn from(event: WireSessionEvent) -> Self {
        match event {
            WireSessionEvent::Created => SessionEventKind::Created,
            WireSessionEvent::Updated => SessionEventKind::Updated,
            WireSessionEvent::Activated => SessionEventKind::Activated,
            WireSessionEvent::Removed => SessionEventKind::Removed,
        }
    }
}

/// Direct reply to a request.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "ACK")]
    Ack {
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "FEED")]
    Feed { feed: Vec<Post> },
}

impl Response {
    pub fn ack(result: &crate::engine::Ack) -> Self {
        match result {
            Ok(()) => Response::Ack {
                ok: true,
                error: None,
            },
            Err(e) => Response::Ack {
                ok: false,
                error: Some(e.clone()),
            },
        }
    }
}

/// Unsolicited outbound lines other than feed notifications.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    #[serde(rename = "RESCAN")]
    Rescan { session_id: String },
    #[serde(rename = "OPEN_URL")]
    OpenUrl { url: String },
    #[serde(rename = "KEEPALIVE")]
    Keepalive,
}

/// Write one JSON line to the shared stdout.
pub async fn write_line<T: Serialize>(out: &Mutex<Stdout>, value: &T) -> Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    let mut out = out.lock().await;
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

/// HostBridge over stdout JSON lines. Shares the writer with the
/// request/response loop so lines never interleave mid-record.
pub struct StdioBridge {
    out: Arc<Mutex<Stdout>>,
}

impl StdioBridge {
    pub fn new(out: Arc<Mutex<Stdout>>) -> Self {
        Self { out }
    }
}

#[async_trait]
impl HostBridge for StdioBridge {
    async fn notify(&self, notification: Notification) -> Result<()> {
        write_line(&self.out, &notification).await
    }

    async fn rescan(&self, session_id: &str) -> Result<()> {
        write_line(
            &self.out,
            &HostEvent::Rescan {
                session_id: session_id.to_string(),
            },
        )
        .await
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        write_line(
            &self.out,
            &HostEvent::OpenUrl {
                url: url.to_string(),
            },
        )
        .await
    }

    async fn keepalive(&self) -> Result<()> {
        write_line(&self.out, &HostEvent::Keepalive).await
    }
}
