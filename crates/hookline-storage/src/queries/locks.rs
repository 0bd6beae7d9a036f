// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL-based install locks keyed by tenant.
//!
//! Mutual exclusion is enforced by the unique index on the normalized
//! `(company_id, location_id)` pair; acquisition is a single INSERT (or
//! replace-if-expired) on the writer thread, so there is no read-then-write
//! window. An expired lock is inert: acquisition treats it as absent.

use hookline_core::types::TenantKey;
use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, ts_in, Database};
use crate::models::InstallLock;

/// Attempt to acquire the lock for `key`, good for `ttl_secs`.
///
/// Returns `true` on acquisition. A live lock held by anyone (including the
/// same holder; the lock is not reentrant) yields `false`. An expired row is
/// replaced in the same statement that acquires.
pub async fn try_acquire(
    db: &Database,
    key: &TenantKey,
    holder: &str,
    ttl_secs: i64,
) -> Result<bool, HooklineError> {
    let company_id = key.company_id.clone();
    let location_id = key.location_id.clone();
    let holder = holder.to_string();
    let now = now_ts();
    let expires_at = ts_in(ttl_secs);

    let acquired = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            // Clear an expired row first so the unique index does not block
            // re-acquisition. Both statements run on the single writer, so
            // no other acquisition can interleave.
            conn.execute(
                "DELETE FROM install_locks
                 WHERE ifnull(company_id, '') = ifnull(?1, '')
                   AND ifnull(location_id, '') = ifnull(?2, '')
                   AND expires_at <= ?3",
                rusqlite::params![company_id, location_id, now],
            )?;
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO install_locks
                     (company_id, location_id, holder, acquired_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![company_id, location_id, holder, now, expires_at],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)?;

    if acquired {
        tracing::debug!(%key, "install lock acquired");
    } else {
        tracing::debug!(%key, "install lock contended");
    }
    Ok(acquired)
}

/// Release the lock for `key` if `holder` still owns it.
///
/// Releasing a lock that expired and was taken over by someone else is a
/// no-op; the holder check prevents a slow worker from releasing its
/// successor's lock.
pub async fn release(db: &Database, key: &TenantKey, holder: &str) -> Result<(), HooklineError> {
    let company_id = key.company_id.clone();
    let location_id = key.location_id.clone();
    let holder = holder.to_string();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "DELETE FROM install_locks
                 WHERE ifnull(company_id, '') = ifnull(?1, '')
                   AND ifnull(location_id, '') = ifnull(?2, '')
                   AND holder = ?3",
                rusqlite::params![company_id, location_id, holder],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete all expired lock rows. Returns the number removed.
pub async fn cleanup_expired(db: &Database) -> Result<u64, HooklineError> {
    let now = now_ts();
    let removed = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            Ok(conn.execute("DELETE FROM install_locks WHERE expires_at <= ?1", [&now])? as u64)
        })
        .await
        .map_err(map_tr_err)?;
    if removed > 0 {
        tracing::debug!(removed, "expired install locks cleaned");
    }
    Ok(removed)
}

/// Fetch the lock row for `key`, live or expired, for inspection.
pub async fn get_lock(db: &Database, key: &TenantKey) -> Result<Option<InstallLock>, HooklineError> {
    let company_id = key.company_id.clone();
    let location_id = key.location_id.clone();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT company_id, location_id, holder, acquired_at, expires_at
                 FROM install_locks
                 WHERE ifnull(company_id, '') = ifnull(?1, '')
                   AND ifnull(location_id, '') = ifnull(?2, '')",
            )?;
            Ok(stmt
                .query_row(rusqlite::params![company_id, location_id], |row| {
                    Ok(InstallLock {
                        company_id: row.get(0)?,
                        location_id: row.get(1)?,
                        holder: row.get(2)?,
                        acquired_at: row.get(3)?,
                        expires_at: row.get(4)?,
                    })
                })
                .map(Some)
                .or_else(|e| {
                    if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                        Ok(None)
                    } else {
                        Err(e)
                    }
                })?)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("locks.db");
        Database::open(path.to_str().unwrap()).await.unwrap()
    }

    fn key(company: Option<&str>, location: Option<&str>) -> TenantKey {
        TenantKey::new(company.map(String::from), location.map(String::from)).unwrap()
    }

    #[tokio::test]
    async fn second_acquisition_is_refused_while_live() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        assert!(try_acquire(&db, &k, "worker-a", 180).await.unwrap());
        assert!(!try_acquire(&db, &k, "worker-b", 180).await.unwrap());
        // Not reentrant: the same holder is refused too.
        assert!(!try_acquire(&db, &k, "worker-a", 180).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_acquires_yield_exactly_one_winner() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        let (a, b) = tokio::join!(
            try_acquire(&db, &k, "worker-a", 180),
            try_acquire(&db, &k, "worker-b", 180)
        );
        let wins = [a.unwrap(), b.unwrap()];
        assert_eq!(wins.iter().filter(|won| **won).count(), 1);

        let lock = get_lock(&db, &k).await.unwrap().unwrap();
        assert!(lock.holder == "worker-a" || lock.holder == "worker-b");
    }

    #[tokio::test]
    async fn distinct_tenant_keys_do_not_contend() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        assert!(try_acquire(&db, &key(Some("co-1"), Some("loc-1")), "a", 180).await.unwrap());
        assert!(try_acquire(&db, &key(Some("co-1"), Some("loc-2")), "a", 180).await.unwrap());
        // Company-level install is a distinct key from any location install.
        assert!(try_acquire(&db, &key(Some("co-1"), None), "a", 180).await.unwrap());
        assert!(try_acquire(&db, &key(None, Some("loc-1")), "a", 180).await.unwrap());
    }

    #[tokio::test]
    async fn release_frees_the_key_for_others() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), None);

        assert!(try_acquire(&db, &k, "worker-a", 180).await.unwrap());
        release(&db, &k, "worker-a").await.unwrap();
        assert!(try_acquire(&db, &k, "worker-b", 180).await.unwrap());
    }

    #[tokio::test]
    async fn release_by_non_holder_is_a_no_op() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        assert!(try_acquire(&db, &k, "worker-a", 180).await.unwrap());
        release(&db, &k, "worker-b").await.unwrap();
        // Still held by worker-a.
        assert!(!try_acquire(&db, &k, "worker-b", 180).await.unwrap());
    }

    #[tokio::test]
    async fn expired_lock_is_inert() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(None, Some("loc-9"));

        // ttl of zero expires immediately.
        assert!(try_acquire(&db, &k, "worker-a", 0).await.unwrap());
        assert!(try_acquire(&db, &k, "worker-b", 180).await.unwrap());

        let lock = get_lock(&db, &k).await.unwrap().unwrap();
        assert_eq!(lock.holder, "worker-b");
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_rows() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        try_acquire(&db, &key(Some("co-1"), None), "a", 0).await.unwrap();
        try_acquire(&db, &key(Some("co-2"), None), "a", 180).await.unwrap();

        assert_eq!(cleanup_expired(&db).await.unwrap(), 1);
        assert!(get_lock(&db, &key(Some("co-1"), None)).await.unwrap().is_none());
        assert!(get_lock(&db, &key(Some("co-2"), None)).await.unwrap().is_some());
    }
}
