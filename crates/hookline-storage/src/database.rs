// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes; the
//! atomicity of claim/lock operations depends on the single writer.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use hookline_core::HooklineError;

/// Handle to the Hookline SQLite database.
///
/// Cloning is cheap and clones share the same background writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run all
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, HooklineError> {
        Self::open_with(path, true).await
    }

    /// Open with an explicit WAL-mode choice (tests and unusual filesystems).
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, HooklineError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| HooklineError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| HooklineError::Storage {
                source: Box::new(e),
            })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal_mode};
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;"
        );

        let migration_result: Result<(), HooklineError> = conn
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.execute_batch(&pragmas)?;
                Ok(crate::migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migration_result?;

        tracing::debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), HooklineError> {
        self.conn
            .call(|conn| -> Result<_, rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        tracing::debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> HooklineError {
    HooklineError::Storage {
        source: Box::new(e),
    }
}

/// Current time as an RFC 3339 string with millisecond precision.
///
/// Every timestamp the storage layer writes goes through this (or the two
/// offset helpers below) so string comparison equals time comparison.
pub fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A timestamp `secs` seconds in the future.
pub fn ts_in(secs: i64) -> String {
    (Utc::now() + chrono::Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A timestamp `secs` seconds in the past.
pub fn ts_ago(secs: i64) -> String {
    (Utc::now() - chrono::Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());

        // Schema exists after migration.
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<_, rusqlite::Error> {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='queue'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_twice_is_idempotent_for_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        // Second open must not fail re-running migrations.
        let db2 = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db2.close().await.unwrap();
    }

    #[test]
    fn timestamps_order_lexicographically() {
        let past = ts_ago(60);
        let now = now_ts();
        let future = ts_in(60);
        assert!(past < now);
        assert!(now < future);
    }
}
