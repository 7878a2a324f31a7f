//! SQLite Storage for orchestration data
//!
//! 런타임 데이터 저장:
//! - user_quotas: 사용자별 일일 사용량 카운터
//! - cached_content: 해시 키 응답 캐시
//!
//! Both tables are accessed with simple keyed operations only (point read,
//! point insert/update) — the `BackingStore` contract. No transactions.

use crate::core::{BackingStore, CacheRecord, QuotaRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Storage service backing quota counters and the response cache
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open (or create) the database at the given path
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create data directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::Storage(format!("Failed to set pragmas: {}", e)))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Create an in-memory storage (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to create in-memory database: {}", e)))?;

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get current schema version from database
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::Storage(format!("Failed to get schema version: {}", e)))
    }

    /// Initialize database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Per-user daily usage counters
            CREATE TABLE IF NOT EXISTS user_quotas (
                user_id TEXT PRIMARY KEY,
                daily_usage INTEGER NOT NULL DEFAULT 0,
                last_reset TEXT NOT NULL
            );

            -- Hash-keyed response cache
            CREATE TABLE IF NOT EXISTS cached_content (
                hash TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cached_content_kind
                ON cached_content(kind);

            INSERT OR IGNORE INTO schema_version (version) VALUES (1);
            "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to initialize schema: {}", e)))?;

        debug!("Storage schema ready (version {})", CURRENT_SCHEMA_VERSION);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Internal("Lock poisoned".to_string()))
    }

    // ========================================================================
    // Quota Operations
    // ========================================================================

    /// Point read of a user's quota record
    pub fn get_quota(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT user_id, daily_usage, last_reset FROM user_quotas WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(QuotaRecord {
                    user_id: row.get(0)?,
                    daily_usage: row.get::<_, i64>(1)? as u64,
                    last_reset: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| Error::Storage(format!("Failed to get quota: {}", e)))
    }

    /// Insert or overwrite a user's quota record
    ///
    /// This is a blind write of a caller-computed value; callers doing
    /// read-modify-write sequences get no isolation from it.
    pub fn put_quota(&self, record: &QuotaRecord) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO user_quotas (user_id, daily_usage, last_reset)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                daily_usage = excluded.daily_usage,
                last_reset = excluded.last_reset
            "#,
            params![
                record.user_id,
                record.daily_usage as i64,
                record.last_reset
            ],
        )
        .map_err(|e| Error::Storage(format!("Failed to put quota: {}", e)))?;

        Ok(())
    }

    // ========================================================================
    // Cache Operations
    // ========================================================================

    /// Point read of a cache entry by hash
    pub fn get_cached(&self, hash: &str) -> Result<Option<CacheRecord>> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT hash, kind, content, inserted_at FROM cached_content WHERE hash = ?1",
            params![hash],
            |row| {
                Ok(CacheRecord {
                    hash: row.get(0)?,
                    kind: row.get(1)?,
                    content: row.get(2)?,
                    inserted_at: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| Error::Storage(format!("Failed to get cache entry: {}", e)))
    }

    /// Insert a cache entry, superseding any previous row with the same hash
    pub fn put_cached(&self, record: &CacheRecord) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO cached_content (hash, kind, content, inserted_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![record.hash, record.kind, record.content, record.inserted_at],
        )
        .map_err(|e| Error::Storage(format!("Failed to put cache entry: {}", e)))?;

        Ok(())
    }
}

// ============================================================================
// BackingStore 구현
// ============================================================================

#[async_trait]
impl BackingStore for Storage {
    async fn quota_get(&self, user_id: &str) -> Result<Option<QuotaRecord>> {
        self.get_quota(user_id)
    }

    async fn quota_put(&self, record: &QuotaRecord) -> Result<()> {
        self.put_quota(record)
    }

    async fn cache_get(&self, hash: &str) -> Result<Option<CacheRecord>> {
        self.get_cached(hash)
    }

    async fn cache_put(&self, record: &CacheRecord) -> Result<()> {
        self.put_cached(record)
    }
}
