// MemoryStore — in-memory StateStore used by tests.
//
// Counts saves so debounce-coalescing tests can assert "exactly one
// durable write" instead of inspecting timer internals.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::traits::StateStore;

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<String>>,
    saves: AtomicUsize,
    /// When true, save_state fails — simulates durable storage being
    /// unavailable.
    pub fail_saves: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with pre-existing state (cold-start tests).
    pub fn with_state(json: &str) -> Self {
        Self {
            state: Mutex::new(Some(json.to_string())),
            ..Self::default()
        }
    }

    /// How many saves have completed successfully.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_state(&self) -> Result<Option<String>> {
        Ok(self.state.lock().await.clone())
    }

    async fn save_state(&self, state_json: &str) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("durable storage unavailable");
        }
        *self.state.lock().await = Some(state_json.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn table_count(&self) -> Result<i64> {
        Ok(0)
    }
}
