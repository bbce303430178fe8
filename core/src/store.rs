//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database. The engine reads and
//! writes whole JSON state slices through the [`StateStore`] trait and
//! never sees SQL.

use crate::error::EngineResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Keys of the persisted state slices. One slice per key, each a
/// self-contained JSON value, independently readable and writable.
pub mod keys {
    pub const PRIZES: &str = "prizes";
    pub const TOTAL_BUDGET: &str = "totalBudget";
    pub const SPENT_AMOUNT: &str = "spentAmount";
    pub const SPIN_HISTORY: &str = "spinHistory";
    // Schedule variant
    pub const CURRENT_SPIN_NUMBER: &str = "currentSpinNumber";
    pub const SCHEDULED_SPINS: &str = "scheduledSpins";
    // Cooldown variant
    pub const HIGH_VALUE_SPIN_COUNT: &str = "highValueSpinCount";
    pub const HIGH_VALUE_CONDITION: &str = "highValueCondition";
}

/// Injected storage capability: a durable, synchronous, same-process
/// key → JSON string store. Absence of a key means "seed from defaults".
pub trait StateStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> EngineResult<()>;
    /// Remove every key unconditionally.
    fn clear(&self) -> EngineResult<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the state database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply the schema. Idempotent.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_state WHERE key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear(&self) -> EngineResult<()> {
        self.conn.execute("DELETE FROM kv_state", [])?;
        Ok(())
    }
}
