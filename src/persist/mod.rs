// Persistence layer — durable feed state behind a backend-agnostic trait.
//
// The whole feed plus settings is one JSON blob in a singleton row.
// Writes are debounced by the engine; this module only knows how to
// load, save, and (de)serialize the blob.

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

use anyhow::{Context, Result};
use tracing::warn;

use crate::model::PersistedState;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::StateStore;

/// Serialize state for storage.
pub fn encode_state(state: &PersistedState) -> Result<String> {
    serde_json::to_string(state).context("Failed to serialize feed state")
}

/// Deserialize stored state. A corrupt blob is logged and treated as
/// empty — one bad write must not wedge the engine forever.
pub fn decode_state(json: &str) -> PersistedState {
    match serde_json::from_str(json) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Stored feed state is corrupt, starting empty");
            PersistedState::default()
        }
    }
}

/// Load the persisted state, or the empty default when nothing has been
/// saved yet.
pub async fn load_state(store: &dyn StateStore) -> Result<PersistedState> {
    match store.load_state().await? {
        Some(json) => Ok(decode_state(&json)),
        None => Ok(PersistedState::default()),
    }
}

/// Write the full current state as one durable record.
pub async fn save_state(store: &dyn StateStore, state: &PersistedState) -> Result<()> {
    let json = encode_state(state)?;
    store.save_state(&json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortPolicy;

    #[tokio::test]
    async fn test_load_empty_store_gives_default() {
        let store = MemoryStore::new();
        let state = load_state(&store).await.unwrap();
        assert!(state.posts.is_empty());
        assert_eq!(state.settings.sort_by, SortPolicy::Chronological);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = MemoryStore::new();
        let mut state = PersistedState::default();
        state.settings.auto_refresh = true;
        state.settings.sort_by = SortPolicy::Engagement;

        save_state(&store, &state).await.unwrap();
        let loaded = load_state(&store).await.unwrap();
        assert!(loaded.settings.auto_refresh);
        assert_eq!(loaded.settings.sort_by, SortPolicy::Engagement);
    }

    #[test]
    fn test_corrupt_state_decodes_to_empty() {
        let state = decode_state("{not json");
        assert!(state.posts.is_empty());
    }
}
