// Message router — the single serialized control point of the engine.
//
// Every external request and session event becomes a Message on one mpsc
// channel, and each message is fully handled (mutation, eviction,
// notification) before the next is taken. That one-handler-at-a-time
// turn is the only synchronization the feed and tab state need.
//
// The debounced save lives here as an armed deadline rather than a
// separate timer task: each mutation re-arms the deadline, and the run
// loop's select fires exactly one durable write per coalesced window,
// always of the state as it is at fire time.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::feed::{FeedStore, UpsertOutcome};
use crate::host::{HostBridge, Notification};
use crate::model::{IncomingPost, PersistedState, Post, Settings};
use crate::persist::{self, StateStore};
use crate::sort::{self, SortPolicy};
use crate::tabs::{self, TabRegistry};

/// Outcome of a request, as reported back to the sender.
pub type Ack = Result<(), String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    Created,
    Updated,
    Activated,
    Removed,
}

/// Everything the engine can be asked to do.
pub enum Message {
    NewPost {
        post: IncomingPost,
        source_tab_id: String,
        reply: Option<oneshot::Sender<Ack>>,
    },
    GetFeed {
        sort_by: Option<SortPolicy>,
        reply: oneshot::Sender<Vec<Post>>,
    },
    OpenPost {
        url: String,
        reply: Option<oneshot::Sender<Ack>>,
    },
    RefreshFeed {
        reply: Option<oneshot::Sender<Ack>>,
    },
    ClearFeed {
        reply: Option<oneshot::Sender<Ack>>,
    },
    UpdateSettings {
        settings: Settings,
        reply: Option<oneshot::Sender<Ack>>,
    },
    SessionEvent {
        kind: SessionEventKind,
        session_id: String,
        url: Option<String>,
    },
}

pub struct Engine {
    feed: FeedStore,
    tabs: TabRegistry,
    settings: Settings,
    store: Arc<dyn StateStore>,
    host: Arc<dyn HostBridge>,
    config: Config,
    /// Armed while a debounced save is pending. Re-armed (reset) by
    /// every mutation, so a burst collapses into one write.
    save_deadline: Option<Instant>,
}

impl Engine {
    /// Load durable state and build the engine.
    ///
    /// This is the startup barrier: the inbound channel is not polled
    /// until `start` has returned, so no ingestion or query can race the
    /// one-time load and overwrite durable history with an empty feed.
    pub async fn start(
        store: Arc<dyn StateStore>,
        host: Arc<dyn HostBridge>,
        config: Config,
    ) -> Result<Self> {
        let state = persist::load_state(store.as_ref()).await?;
        let mut feed = FeedStore::new(config.feed_capacity);
        feed.replace_all(state.posts);
        info!(posts = feed.len(), "Loaded persisted feed state");

        Ok(Self {
            feed,
            tabs: TabRegistry::new(),
            settings: state.settings,
            store,
            host,
            config,
            save_deadline: None,
        })
    }

    /// Run the message loop until the inbound channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Message>) {
        // First tick one full period out — a ping or rescan broadcast
        // at t=0, before any session has registered, is just noise.
        let mut keepalive = time::interval_at(
            Instant::now() + self.config.keepalive_interval,
            self.config.keepalive_interval,
        );
        let mut auto_refresh = time::interval_at(
            Instant::now() + self.config.auto_refresh_interval,
            self.config.auto_refresh_interval,
        );

        loop {
            let deadline = self.save_deadline;
            tokio::select! {
                maybe_msg = rx.recv() => match maybe_msg {
                    Some(msg) => self.handle_message(msg).await,
                    None => break,
                },
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    self.flush().await;
                }
                _ = keepalive.tick() => {
                    if let Err(e) = self.host.keepalive().await {
                        debug!(error = %e, "Keepalive ping failed");
                    }
                }
                _ = auto_refresh.tick(), if self.settings.auto_refresh => {
                    self.broadcast_rescan().await;
                }
            }
        }

        // Channel closed: don't drop an armed save on the floor.
        if self.save_deadline.is_some() {
            self.flush().await;
        }
    }

    /// Handle one message to completion. No error here is fatal — the
    /// loop must keep processing whatever comes next.
    pub async fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::NewPost {
                post,
                source_tab_id,
                reply,
            } => {
                let ack = self.ingest(post, &source_tab_id).await;
                respond(reply, ack);
            }
            Message::GetFeed { sort_by, reply } => {
                let policy = sort_by.unwrap_or(self.settings.sort_by);
                let feed = sort::order(&self.feed.snapshot(), policy);
                let _ = reply.send(feed);
            }
            Message::OpenPost { url, reply } => {
                if let Err(e) = self.host.open_url(&url).await {
                    warn!(url, error = %e, "Failed to open post");
                }
                respond(reply, Ok(()));
            }
            Message::RefreshFeed { reply } => {
                self.broadcast_rescan().await;
                respond(reply, Ok(()));
            }
            Message::ClearFeed { reply } => {
                self.feed.clear_all();
                // Clears persist immediately, not on the debounce.
                self.flush().await;
                if let Err(e) = self.host.notify(Notification::FeedCleared).await {
                    warn!(error = %e, "Failed to push clear notification");
                }
                respond(reply, Ok(()));
            }
            Message::UpdateSettings { settings, reply } => {
                self.settings = settings;
                self.schedule_save();
                respond(reply, Ok(()));
            }
            Message::SessionEvent {
                kind,
                session_id,
                url,
            } => {
                self.handle_session_event(kind, &session_id, url.as_deref())
                    .await;
            }
        }
    }

    /// Normalize and upsert one producer-emitted post.
    async fn ingest(&mut self, incoming: IncomingPost, source_tab_id: &str) -> Ack {
        let post = incoming.into_post(source_tab_id, Utc::now());
        match self.feed.upsert(post.clone()) {
            Ok(UpsertOutcome::Created) => {
                debug!(id = post.id, platform = %post.platform, "New post ingested");
                self.schedule_save();
                if self.settings.show_notifications {
                    let notification = Notification::FeedUpdated {
                        new_post: Box::new(post),
                    };
                    if let Err(e) = self.host.notify(notification).await {
                        warn!(error = %e, "Failed to push feed notification");
                    }
                }
                Ok(())
            }
            Ok(UpsertOutcome::Replaced) => {
                // Known id, refreshed fields — persist, but never
                // re-notify the consumer for unchanged identity.
                self.schedule_save();
                Ok(())
            }
            Err(e) => {
                warn!(source_tab_id, error = %e, "Rejected invalid post");
                Err(e.to_string())
            }
        }
    }

    async fn handle_session_event(
        &mut self,
        kind: SessionEventKind,
        session_id: &str,
        url: Option<&str>,
    ) {
        match kind {
            SessionEventKind::Created | SessionEventKind::Updated => {
                match url.and_then(tabs::classify) {
                    Some(platform) => {
                        let url = url.unwrap_or_default();
                        debug!(session_id, %platform, url, "Monitoring session");
                        self.tabs.start_monitoring(session_id, url, platform);
                    }
                    // Navigated away from a feed page: the producer in
                    // that tab is gone, so its posts go too.
                    None => self.end_session(session_id).await,
                }
            }
            SessionEventKind::Activated => self.tabs.touch(session_id),
            SessionEventKind::Removed => self.end_session(session_id).await,
        }
    }

    /// Stop monitoring a session and cascade-delete its posts.
    async fn end_session(&mut self, session_id: &str) {
        let was_tracked = self.tabs.stop_monitoring(session_id);
        let removed = self.feed.cascade_delete(session_id);
        if removed > 0 {
            info!(session_id, removed, "Dropped posts from ended session");
            self.schedule_save();
        } else if was_tracked {
            debug!(session_id, "Session ended with no posts in feed");
        }
    }

    /// Ask every registered session to re-extract. Per-session failures
    /// are logged and skipped; the fan-out always completes.
    async fn broadcast_rescan(&self) {
        let sessions = self.tabs.session_ids();
        debug!(sessions = sessions.len(), "Broadcasting rescan");
        for session_id in sessions {
            if let Err(e) = self.host.rescan(&session_id).await {
                warn!(session_id, error = %e, "Rescan send failed, skipping session");
            }
        }
    }

    /// Mark state dirty and (re-)arm the debounce deadline.
    fn schedule_save(&mut self) {
        self.save_deadline = Some(Instant::now() + self.config.debounce);
    }

    /// Write the current full state durably and disarm the deadline.
    ///
    /// A failed write is logged, not retried here: the next mutation
    /// re-arms the debounce, so the system self-heals on the next write.
    async fn flush(&mut self) {
        self.save_deadline = None;
        let state = PersistedState {
            posts: self.feed.snapshot(),
            settings: self.settings.clone(),
        };
        match persist::save_state(self.store.as_ref(), &state).await {
            Ok(()) => debug!(posts = state.posts.len(), "Feed state persisted"),
            Err(e) => {
                warn!(error = %e, "Failed to persist feed state; will retry on next mutation");
            }
        }
    }

    // --- Read-only accessors (status display and tests) ---

    pub fn feed_len(&self) -> usize {
        self.feed.len()
    }

    pub fn feed_snapshot(&self) -> Vec<Post> {
        self.feed.snapshot()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tracked_sessions(&self) -> usize {
        self.tabs.len()
    }
}

fn respond(reply: Option<oneshot::Sender<Ack>>, ack: Ack) {
    if let Some(tx) = reply {
        // The requester may have gone away; that's its problem.
        let _ = tx.send(ack);
    }
}
