// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact records, keyed by `(external_id, location_id)`.
//!
//! The upstream platform is the system of record. Create and update are the
//! same upsert (at-least-once delivery means either can arrive first or
//! twice), and delete is a soft flag that an upsert clears on resurrection.

use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, Database};
use crate::models::ContactRecord;

pub async fn upsert(
    db: &Database,
    external_id: &str,
    location_id: &str,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<(), HooklineError> {
    let external_id = external_id.to_string();
    let location_id = location_id.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO contacts
                     (external_id, location_id, name, email, phone, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
                 ON CONFLICT (external_id, location_id) DO UPDATE SET
                     name = excluded.name,
                     email = excluded.email,
                     phone = excluded.phone,
                     deleted = 0,
                     updated_at = excluded.updated_at",
                rusqlite::params![external_id, location_id, name, email, phone, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete. Deleting a contact that never arrived is a no-op.
pub async fn soft_delete(
    db: &Database,
    external_id: &str,
    location_id: &str,
) -> Result<(), HooklineError> {
    let external_id = external_id.to_string();
    let location_id = location_id.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE contacts SET deleted = 1, updated_at = ?1
                 WHERE external_id = ?2 AND location_id = ?3",
                rusqlite::params![now, external_id, location_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(
    db: &Database,
    external_id: &str,
    location_id: &str,
) -> Result<Option<ContactRecord>, HooklineError> {
    let external_id = external_id.to_string();
    let location_id = location_id.to_string();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT external_id, location_id, name, email, phone, deleted,
                        created_at, updated_at
                 FROM contacts WHERE external_id = ?1 AND location_id = ?2",
            )?;
            Ok(stmt
                .query_row(rusqlite::params![external_id, location_id], |row| {
                    Ok(ContactRecord {
                        external_id: row.get(0)?,
                        location_id: row.get(1)?,
                        name: row.get(2)?,
                        email: row.get(3)?,
                        phone: row.get(4)?,
                        deleted: row.get::<_, i64>(5)? != 0,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
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
        let path = dir.path().join("contacts.db");
        Database::open(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn upsert_is_create_or_update() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        upsert(&db, "c-1", "loc-1", Some("Ada".into()), None, None).await.unwrap();
        upsert(&db, "c-1", "loc-1", Some("Ada L".into()), Some("ada@example.com".into()), None)
            .await
            .unwrap();

        let c = get(&db, "c-1", "loc-1").await.unwrap().unwrap();
        assert_eq!(c.name.as_deref(), Some("Ada L"));
        assert_eq!(c.email.as_deref(), Some("ada@example.com"));
        assert!(!c.deleted);
    }

    #[tokio::test]
    async fn same_external_id_in_two_locations_is_two_rows() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        upsert(&db, "c-1", "loc-1", Some("A".into()), None, None).await.unwrap();
        upsert(&db, "c-1", "loc-2", Some("B".into()), None, None).await.unwrap();

        assert_eq!(get(&db, "c-1", "loc-1").await.unwrap().unwrap().name.as_deref(), Some("A"));
        assert_eq!(get(&db, "c-1", "loc-2").await.unwrap().unwrap().name.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn delete_flags_and_update_resurrects() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        upsert(&db, "c-1", "loc-1", Some("Ada".into()), None, None).await.unwrap();
        soft_delete(&db, "c-1", "loc-1").await.unwrap();
        assert!(get(&db, "c-1", "loc-1").await.unwrap().unwrap().deleted);

        upsert(&db, "c-1", "loc-1", Some("Ada".into()), None, None).await.unwrap();
        assert!(!get(&db, "c-1", "loc-1").await.unwrap().unwrap().deleted);
    }

    #[tokio::test]
    async fn delete_of_unknown_contact_is_a_no_op() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        soft_delete(&db, "ghost", "loc-1").await.unwrap();
        assert!(get(&db, "ghost", "loc-1").await.unwrap().is_none());
    }
}
