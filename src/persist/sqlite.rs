// SqliteStore — rusqlite backend implementing the StateStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is
// !Send. Trait methods lock the mutex, do synchronous rusqlite work, and
// return. The lock is never held across .await points — Rust enforces
// this because MutexGuard is !Send.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::schema;
use super::traits::StateStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the database at the given path and ensure the
    /// schema exists.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }

    /// When the last successful save happened, as recorded by SQLite.
    pub async fn last_saved_at(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let saved_at = conn
            .query_row("SELECT saved_at FROM feed_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(saved_at)
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn load_state(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let json = conn
            .query_row(
                "SELECT state_json FROM feed_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to load feed state")?;
        Ok(json)
    }

    async fn save_state(&self, state_json: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO feed_state (id, state_json, saved_at)
             VALUES (1, ?1, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                 state_json = excluded.state_json,
                 saved_at = excluded.saved_at",
            [state_json],
        )
        .context("Failed to save feed state")?;
        Ok(())
    }

    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        schema::table_count(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteStore {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        SqliteStore::new(conn)
    }

    #[tokio::test]
    async fn test_load_before_first_save() {
        let store = test_store();
        assert_eq!(store.load_state().await.unwrap(), None);
        assert_eq!(store.last_saved_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_overwrites_singleton() {
        let store = test_store();
        store.save_state(r#"{"posts":[]}"#).await.unwrap();
        store.save_state(r#"{"posts":[{}]}"#).await.unwrap();
        assert_eq!(
            store.load_state().await.unwrap(),
            Some(r#"{"posts":[{}]}"#.to_string())
        );
        assert!(store.last_saved_at().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let store = test_store();
        assert_eq!(store.table_count().await.unwrap(), 2);
    }
}
