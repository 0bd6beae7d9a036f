// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment records, keyed by `(external_id, location_id)`. Same
//! upsert/soft-delete discipline as contacts.

use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, Database};
use crate::models::AppointmentRecord;

#[allow(clippy::too_many_arguments)]
pub async fn upsert(
    db: &Database,
    external_id: &str,
    location_id: &str,
    contact_id: Option<String>,
    title: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    appointment_status: Option<String>,
) -> Result<(), HooklineError> {
    let external_id = external_id.to_string();
    let location_id = location_id.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO appointments
                     (external_id, location_id, contact_id, title, start_time, end_time,
                      appointment_status, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
                 ON CONFLICT (external_id, location_id) DO UPDATE SET
                     contact_id = excluded.contact_id,
                     title = excluded.title,
                     start_time = excluded.start_time,
                     end_time = excluded.end_time,
                     appointment_status = excluded.appointment_status,
                     deleted = 0,
                     updated_at = excluded.updated_at",
                rusqlite::params![
                    external_id,
                    location_id,
                    contact_id,
                    title,
                    start_time,
                    end_time,
                    appointment_status,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

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
                "UPDATE appointments SET deleted = 1, updated_at = ?1
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
) -> Result<Option<AppointmentRecord>, HooklineError> {
    let external_id = external_id.to_string();
    let location_id = location_id.to_string();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT external_id, location_id, contact_id, title, start_time, end_time,
                        appointment_status, deleted, created_at, updated_at
                 FROM appointments WHERE external_id = ?1 AND location_id = ?2",
            )?;
            Ok(stmt
                .query_row(rusqlite::params![external_id, location_id], |row| {
                    Ok(AppointmentRecord {
                        external_id: row.get(0)?,
                        location_id: row.get(1)?,
                        contact_id: row.get(2)?,
                        title: row.get(3)?,
                        start_time: row.get(4)?,
                        end_time: row.get(5)?,
                        appointment_status: row.get(6)?,
                        deleted: row.get::<_, i64>(7)? != 0,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
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
