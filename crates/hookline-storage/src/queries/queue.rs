// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue operations: enqueue, batch dequeue, atomic claim, terminal
//! transitions, linear-backoff reschedule, staleness reclaim, and retention
//! purges.
//!
//! All status transitions are single UPDATE statements guarded by a WHERE
//! clause on the current status, executed on the single writer thread. The
//! `changes()` count is the arbiter of who won a race, not any read that
//! preceded the write.

use hookline_core::types::{ClaimResult, QueueItem, QueueName, QueueStatus};
use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, ts_ago, ts_in, Database};

/// Insert a new pending item, eligible immediately.
///
/// Returns the store-assigned id. Intake never deduplicates; every accepted
/// delivery lands here and the gate runs at processing time.
pub async fn enqueue(
    db: &Database,
    queue: QueueName,
    webhook_id: Option<String>,
    event_type: &str,
    payload: &str,
    source: Option<String>,
    max_attempts: u32,
) -> Result<i64, HooklineError> {
    enqueue_after(db, queue, webhook_id, event_type, payload, source, max_attempts, 0).await
}

/// Insert a new pending item that becomes eligible `delay_secs` from now.
#[allow(clippy::too_many_arguments)]
pub async fn enqueue_after(
    db: &Database,
    queue: QueueName,
    webhook_id: Option<String>,
    event_type: &str,
    payload: &str,
    source: Option<String>,
    max_attempts: u32,
    delay_secs: i64,
) -> Result<i64, HooklineError> {
    let queue_name = queue.to_string();
    let event_type = event_type.to_string();
    let payload = payload.to_string();
    let created_at = now_ts();
    let process_after = if delay_secs > 0 { ts_in(delay_secs) } else { created_at.clone() };

    let id = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queue
                     (queue_name, webhook_id, event_type, payload, status,
                      attempts, max_attempts, source, created_at, process_after)
                 VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    queue_name,
                    webhook_id,
                    event_type,
                    payload,
                    max_attempts,
                    source,
                    created_at,
                    process_after,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)?;

    tracing::debug!(id, queue = %queue, "item enqueued");
    Ok(id)
}

/// Fetch up to `limit` eligible items in strict enqueue order.
///
/// Eligible means `pending`, due (`process_after <= now`), and with attempts
/// remaining. This is a read; callers must still [`claim`] each item before
/// processing it.
pub async fn dequeue_batch(
    db: &Database,
    queue: QueueName,
    limit: u32,
) -> Result<Vec<QueueItem>, HooklineError> {
    let queue_name = queue.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, queue_name, webhook_id, event_type, payload, status,
                        attempts, max_attempts, source, last_error, created_at,
                        process_after, last_attempt_at, completed_at
                 FROM queue
                 WHERE queue_name = ?1
                   AND status = 'pending'
                   AND process_after <= ?2
                   AND attempts < max_attempts
                 ORDER BY created_at ASC, id ASC
                 LIMIT ?3",
            )?;
            let items = stmt
                .query_map(rusqlite::params![queue_name, now, limit], map_item)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
        .await
        .map_err(map_tr_err)
}

/// Atomically claim an item for processing.
///
/// The compare-and-set transitions `pending -> processing` and charges one
/// attempt. Exactly one of any number of concurrent callers observes
/// [`ClaimResult::Claimed`].
pub async fn claim(db: &Database, id: i64) -> Result<ClaimResult, HooklineError> {
    let now = now_ts();

    let changed = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            Ok(conn.execute(
                "UPDATE queue
                 SET status = 'processing', attempts = attempts + 1, last_attempt_at = ?1
                 WHERE id = ?2 AND status = 'pending' AND attempts < max_attempts",
                rusqlite::params![now, id],
            )?)
        })
        .await
        .map_err(map_tr_err)?;

    Ok(if changed == 1 { ClaimResult::Claimed } else { ClaimResult::AlreadyClaimed })
}

/// Terminal success: `processing -> completed`.
pub async fn mark_completed(db: &Database, id: i64) -> Result<(), HooklineError> {
    let now = now_ts();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'completed', completed_at = ?1
                 WHERE id = ?2 AND status = 'processing'",
                rusqlite::params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Terminal non-processing exit: `processing -> skipped` with a reason.
///
/// Used for duplicate deliveries and for webhook-queue items handed off to
/// the install-retry queue.
pub async fn mark_skipped(db: &Database, id: i64, reason: &str) -> Result<(), HooklineError> {
    let now = now_ts();
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'skipped', last_error = ?1, completed_at = ?2
                 WHERE id = ?3 AND status = 'processing'",
                rusqlite::params![reason, now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Terminal failure: `processing -> failed` with the final error recorded.
pub async fn mark_failed(db: &Database, id: i64, error: &str) -> Result<(), HooklineError> {
    let now = now_ts();
    let error = error.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'failed', last_error = ?1, completed_at = ?2
                 WHERE id = ?3 AND status = 'processing'",
                rusqlite::params![error, now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Retry or give up after a processing error.
///
/// The claim already charged this attempt, so `attempts` here is the count
/// including the one that just failed. With attempts remaining the item goes
/// back to `pending` with a linear delay of `attempts * unit_secs`; otherwise
/// it is marked `failed`. Returns the resulting status.
pub async fn reschedule_with_backoff(
    db: &Database,
    id: i64,
    error: &str,
    unit_secs: i64,
) -> Result<QueueStatus, HooklineError> {
    let now = now_ts();
    let error = error.to_string();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let (attempts, max_attempts): (i64, i64) = conn.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            if attempts >= max_attempts {
                conn.execute(
                    "UPDATE queue SET status = 'failed', last_error = ?1, completed_at = ?2
                     WHERE id = ?3 AND status = 'processing'",
                    rusqlite::params![error, now, id],
                )?;
                Ok(QueueStatus::Failed)
            } else {
                let delay = attempts * unit_secs;
                let process_after = ts_in(delay);
                conn.execute(
                    "UPDATE queue SET status = 'pending', last_error = ?1, process_after = ?2
                     WHERE id = ?3 AND status = 'processing'",
                    rusqlite::params![error, process_after, id],
                )?;
                Ok(QueueStatus::Pending)
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Reclaim items stuck in `processing` longer than `older_than_secs`.
///
/// A crashed driver leaves its claims in `processing` forever; this sweep
/// returns them to `pending` (the lost attempt stays charged) or, when the
/// lost attempt was the last one, marks them `failed`. Returns the number of
/// items touched.
pub async fn reclaim_stale(db: &Database, older_than_secs: i64) -> Result<u64, HooklineError> {
    let cutoff = ts_ago(older_than_secs);
    let now = now_ts();

    let reclaimed = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let exhausted = conn.execute(
                "UPDATE queue
                 SET status = 'failed', last_error = 'processing timed out', completed_at = ?1
                 WHERE status = 'processing' AND last_attempt_at < ?2
                   AND attempts >= max_attempts",
                rusqlite::params![now, cutoff],
            )?;
            let requeued = conn.execute(
                "UPDATE queue SET status = 'pending'
                 WHERE status = 'processing' AND last_attempt_at < ?1",
                [&cutoff],
            )?;
            Ok((exhausted + requeued) as u64)
        })
        .await
        .map_err(map_tr_err)?;

    if reclaimed > 0 {
        tracing::warn!(reclaimed, "reclaimed stale processing items");
    }
    Ok(reclaimed)
}

/// Delete terminal rows older than `older_than_secs`, judged by their
/// completion time. Returns the number of rows removed.
pub async fn purge_aged(
    db: &Database,
    statuses: &[QueueStatus],
    older_than_secs: i64,
) -> Result<u64, HooklineError> {
    if statuses.is_empty() {
        return Ok(0);
    }
    let cutoff = ts_ago(older_than_secs);
    let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

    let purged = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            let sql = format!(
                "DELETE FROM queue
                 WHERE status IN ({placeholders}) AND completed_at IS NOT NULL
                   AND completed_at < ?"
            );
            let mut params: Vec<&dyn rusqlite::ToSql> =
                statuses.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
            params.push(&cutoff);
            Ok(conn.execute(&sql, params.as_slice())? as u64)
        })
        .await
        .map_err(map_tr_err)?;

    if purged > 0 {
        tracing::debug!(purged, "purged aged queue rows");
    }
    Ok(purged)
}

/// Fetch a single item by id.
pub async fn get_item(db: &Database, id: i64) -> Result<Option<QueueItem>, HooklineError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, queue_name, webhook_id, event_type, payload, status,
                        attempts, max_attempts, source, last_error, created_at,
                        process_after, last_attempt_at, completed_at
                 FROM queue WHERE id = ?1",
            )?;
            Ok(stmt.query_row([id], map_item).map(Some).or_else(|e| {
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

/// Count items in a queue with the given status, for the health surface.
pub async fn count_by_status(
    db: &Database,
    queue: QueueName,
    status: QueueStatus,
) -> Result<u64, HooklineError> {
    let queue_name = queue.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM queue WHERE queue_name = ?1 AND status = ?2",
                rusqlite::params![queue_name, status],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

fn map_item(row: &rusqlite::Row<'_>) -> Result<QueueItem, rusqlite::Error> {
    let queue_name: String = row.get(1)?;
    let status: String = row.get(5)?;
    Ok(QueueItem {
        id: row.get(0)?,
        queue: queue_name.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?,
        webhook_id: row.get(2)?,
        event_type: row.get(3)?,
        payload: row.get(4)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        attempts: row.get(6)?,
        max_attempts: row.get(7)?,
        source: row.get(8)?,
        last_error: row.get(9)?,
        created_at: row.get(10)?,
        process_after: row.get(11)?,
        last_attempt_at: row.get(12)?,
        completed_at: row.get(13)?,
    })
}
