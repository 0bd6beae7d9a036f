// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit trail. Handlers record lifecycle moments here; nothing
//! in the pipeline ever reads it back.

use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, ts_ago, Database};

pub async fn record(
    db: &Database,
    event_type: &str,
    company_id: Option<String>,
    location_id: Option<String>,
    correlation_id: Option<String>,
    detail: Option<String>,
) -> Result<(), HooklineError> {
    let event_type = event_type.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO app_events
                     (event_type, company_id, location_id, correlation_id, detail, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![event_type, company_id, location_id, correlation_id, detail, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete audit rows older than `retention_days`. Returns rows removed.
pub async fn purge_aged(db: &Database, retention_days: i64) -> Result<u64, HooklineError> {
    let cutoff = ts_ago(retention_days * 86_400);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            Ok(conn.execute("DELETE FROM app_events WHERE created_at < ?1", [&cutoff])? as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn record_and_purge() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        record(&db, "install_complete", Some("co-1".into()), None, Some("job-1".into()), None)
            .await
            .unwrap();

        // Fresh rows survive the purge.
        assert_eq!(purge_aged(&db, 7).await.unwrap(), 0);

        let aged = ts_ago(10 * 86_400);
        db.connection()
            .call(move |conn| -> Result<_, rusqlite::Error> {
                conn.execute("UPDATE app_events SET created_at = ?1", [&aged])?;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(purge_aged(&db, 7).await.unwrap(), 1);
    }
}
