// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-history storage backing the deduplication gate.
//!
//! A delivery is a duplicate when its upstream webhook id was seen inside
//! the retention window, or when its content fingerprint was. The check and
//! the record happen in one writer call, so two concurrent checks of the
//! same delivery cannot both pass.

use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, ts_ago, Database};

/// Check-and-record a delivery. Returns `true` if it was already seen.
///
/// When neither the webhook id nor the fingerprint is on record, the
/// fingerprint is recorded in the same call and `false` is returned.
pub async fn check_and_record(
    db: &Database,
    webhook_id: Option<String>,
    fingerprint: &str,
    event_type: &str,
) -> Result<bool, HooklineError> {
    let fingerprint = fingerprint.to_string();
    let event_type = event_type.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            if let Some(ref wid) = webhook_id {
                let seen: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM webhook_history WHERE webhook_id = ?1",
                    [wid],
                    |row| row.get(0),
                )?;
                if seen > 0 {
                    return Ok(true);
                }
            }
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO webhook_history
                     (fingerprint, webhook_id, event_type, first_seen_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![fingerprint, webhook_id, event_type, now],
            )?;
            Ok(inserted == 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete history rows older than `retention_hours`. Returns rows removed.
pub async fn purge_history(db: &Database, retention_hours: i64) -> Result<u64, HooklineError> {
    let cutoff = ts_ago(retention_hours * 3600);
    let removed = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            Ok(conn.execute(
                "DELETE FROM webhook_history WHERE first_seen_at < ?1",
                [&cutoff],
            )? as u64)
        })
        .await
        .map_err(map_tr_err)?;
    if removed > 0 {
        tracing::debug!(removed, "purged delivery history");
    }
    Ok(removed)
}
