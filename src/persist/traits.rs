// StateStore trait — backend-agnostic async interface for durable state.
//
// Implementors: SqliteStore (wraps rusqlite), MemoryStore (tests).
// All methods are async so a sync backend (rusqlite via Mutex) and any
// future native-async backend fit behind a single interface.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state blob, if one has ever been saved.
    async fn load_state(&self) -> Result<Option<String>>;

    /// Save the full state blob (upsert of the singleton record).
    async fn save_state(&self, state_json: &str) -> Result<()>;

    /// Count the number of user-created tables (init confirmation).
    async fn table_count(&self) -> Result<i64>;
}
