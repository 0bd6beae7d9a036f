// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversations and their messages.
//!
//! The unread counter must survive at-least-once delivery: the message id
//! primary key makes the insert idempotent, and the counter only moves when
//! the insert actually lands. A redelivered InboundMessage therefore never
//! double-counts.

use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, Database};
use crate::models::ConversationRecord;

/// Message direction, as stored.
pub const DIRECTION_INBOUND: &str = "inbound";
pub const DIRECTION_OUTBOUND: &str = "outbound";

/// Record a message and update its conversation in one writer call.
///
/// Creates the conversation row if this is the first message seen for it.
/// Inbound messages that actually insert bump the unread counter; outbound
/// messages never do. Returns `true` when the message was new.
pub async fn record_message(
    db: &Database,
    message_id: &str,
    conversation_id: &str,
    location_id: &str,
    contact_id: Option<String>,
    direction: &str,
    body: Option<String>,
) -> Result<bool, HooklineError> {
    let message_id = message_id.to_string();
    let conversation_id = conversation_id.to_string();
    let location_id = location_id.to_string();
    let direction = direction.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO messages
                     (external_id, conversation_id, location_id, direction, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![message_id, conversation_id, location_id, direction, body, now],
            )?;
            if inserted == 0 {
                // Redelivery; the conversation already reflects this message.
                return Ok(false);
            }

            let unread_delta: i64 = if direction == DIRECTION_INBOUND { 1 } else { 0 };
            conn.execute(
                "INSERT INTO conversations
                     (external_id, location_id, contact_id, unread_count,
                      last_message_body, last_message_at, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?6, ?6)
                 ON CONFLICT (external_id, location_id) DO UPDATE SET
                     contact_id = coalesce(excluded.contact_id, conversations.contact_id),
                     unread_count = conversations.unread_count + ?4,
                     last_message_body = excluded.last_message_body,
                     last_message_at = excluded.last_message_at,
                     deleted = 0,
                     updated_at = excluded.updated_at",
                rusqlite::params![conversation_id, location_id, contact_id, unread_delta, body, now],
            )?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the unread counter with an authoritative upstream value.
///
/// Creates the conversation row when the counter update arrives before any
/// message (out-of-order delivery).
pub async fn set_unread(
    db: &Database,
    conversation_id: &str,
    location_id: &str,
    unread_count: i64,
) -> Result<(), HooklineError> {
    let conversation_id = conversation_id.to_string();
    let location_id = location_id.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO conversations
                     (external_id, location_id, unread_count, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)
                 ON CONFLICT (external_id, location_id) DO UPDATE SET
                     unread_count = excluded.unread_count,
                     updated_at = excluded.updated_at",
                rusqlite::params![conversation_id, location_id, unread_count, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(
    db: &Database,
    conversation_id: &str,
    location_id: &str,
) -> Result<Option<ConversationRecord>, HooklineError> {
    let conversation_id = conversation_id.to_string();
    let location_id = location_id.to_string();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT external_id, location_id, contact_id, unread_count,
                        last_message_body, last_message_at, deleted
                 FROM conversations WHERE external_id = ?1 AND location_id = ?2",
            )?;
            Ok(stmt
                .query_row(rusqlite::params![conversation_id, location_id], |row| {
                    Ok(ConversationRecord {
                        external_id: row.get(0)?,
                        location_id: row.get(1)?,
                        contact_id: row.get(2)?,
                        unread_count: row.get(3)?,
                        last_message_body: row.get(4)?,
                        last_message_at: row.get(5)?,
                        deleted: row.get::<_, i64>(6)? != 0,
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
        let path = dir.path().join("conversations.db");
        Database::open(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn inbound_message_creates_conversation_and_bumps_unread() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        let new = record_message(
            &db,
            "m-1",
            "conv-1",
            "loc-1",
            Some("c-1".into()),
            DIRECTION_INBOUND,
            Some("hello".into()),
        )
        .await
        .unwrap();
        assert!(new);

        let conv = get(&db, "conv-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(conv.unread_count, 1);
        assert_eq!(conv.last_message_body.as_deref(), Some("hello"));
        assert_eq!(conv.contact_id.as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn redelivered_message_does_not_double_count() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        for _ in 0..3 {
            record_message(&db, "m-1", "conv-1", "loc-1", None, DIRECTION_INBOUND, None)
                .await
                .unwrap();
        }

        let conv = get(&db, "conv-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(conv.unread_count, 1);
    }

    #[tokio::test]
    async fn outbound_messages_never_increment_unread() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        record_message(&db, "m-1", "conv-1", "loc-1", None, DIRECTION_INBOUND, None)
            .await
            .unwrap();
        record_message(
            &db,
            "m-2",
            "conv-1",
            "loc-1",
            None,
            DIRECTION_OUTBOUND,
            Some("reply".into()),
        )
        .await
        .unwrap();

        let conv = get(&db, "conv-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(conv.unread_count, 1);
        // The outbound message still advances the preview.
        assert_eq!(conv.last_message_body.as_deref(), Some("reply"));
    }

    #[tokio::test]
    async fn unread_update_is_authoritative() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        for id in ["m-1", "m-2", "m-3"] {
            record_message(&db, id, "conv-1", "loc-1", None, DIRECTION_INBOUND, None)
                .await
                .unwrap();
        }
        assert_eq!(get(&db, "conv-1", "loc-1").await.unwrap().unwrap().unread_count, 3);

        set_unread(&db, "conv-1", "loc-1", 0).await.unwrap();
        assert_eq!(get(&db, "conv-1", "loc-1").await.unwrap().unwrap().unread_count, 0);
    }

    #[tokio::test]
    async fn unread_update_before_any_message_creates_the_row() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        set_unread(&db, "conv-9", "loc-1", 5).await.unwrap();
        assert_eq!(get(&db, "conv-9", "loc-1").await.unwrap().unwrap().unread_count, 5);
    }
}
