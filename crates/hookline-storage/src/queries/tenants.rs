// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant install-state records.
//!
//! `tenant_id` is the location id for location-scoped installs, otherwise
//! the company id. UNINSTALL soft-clears a record; rows are never deleted,
//! so a reinstall finds its history.

use hookline_core::types::TenantKey;
use hookline_core::HooklineError;

use crate::database::{map_tr_err, now_ts, Database};
use crate::models::TenantRecord;

/// The canonical tenant id for a key: location-scoped when possible.
pub fn tenant_id_for(key: &TenantKey) -> String {
    key.location_id
        .clone()
        .or_else(|| key.company_id.clone())
        .unwrap_or_default()
}

/// Record that install setup has started for this tenant.
pub async fn begin_install(db: &Database, key: &TenantKey) -> Result<(), HooklineError> {
    let tenant_id = tenant_id_for(key);
    let company_id = key.company_id.clone();
    let location_id = key.location_id.clone();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenants
                     (tenant_id, company_id, location_id, install_state, last_webhook_update)
                 VALUES (?1, ?2, ?3, 'in_progress', ?4)
                 ON CONFLICT (tenant_id) DO UPDATE SET
                     company_id = excluded.company_id,
                     location_id = excluded.location_id,
                     install_state = 'in_progress',
                     setup_error = NULL,
                     last_webhook_update = excluded.last_webhook_update",
                rusqlite::params![tenant_id, company_id, location_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a completed install: setup finished and the app is live.
pub async fn complete_install(db: &Database, key: &TenantKey) -> Result<(), HooklineError> {
    let tenant_id = tenant_id_for(key);
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE tenants SET
                     app_installed = 1,
                     install_state = 'complete',
                     setup_error = NULL,
                     installed_at = ?1,
                     uninstalled_at = NULL,
                     last_webhook_update = ?1
                 WHERE tenant_id = ?2",
                rusqlite::params![now, tenant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed install setup. The tenant stays visible with the error so
/// a later retry (or operator) can see what went wrong.
pub async fn fail_install(db: &Database, key: &TenantKey, error: &str) -> Result<(), HooklineError> {
    let tenant_id = tenant_id_for(key);
    let error = error.to_string();
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE tenants SET
                     install_state = 'setup_failed',
                     setup_error = ?1,
                     last_webhook_update = ?2
                 WHERE tenant_id = ?3",
                rusqlite::params![error, now, tenant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-clear a tenant on UNINSTALL: drop the installed flag and tokens but
/// keep the row.
pub async fn mark_uninstalled(db: &Database, key: &TenantKey) -> Result<(), HooklineError> {
    let tenant_id = tenant_id_for(key);
    let now = now_ts();

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE tenants SET
                     app_installed = 0,
                     install_state = 'uninstalled',
                     access_token = NULL,
                     refresh_token = NULL,
                     token_expires_at = NULL,
                     token_needs_refresh = 0,
                     uninstalled_at = ?1,
                     last_webhook_update = ?1
                 WHERE tenant_id = ?2",
                rusqlite::params![now, tenant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Flag a tenant's tokens for refresh. Returns `false` when no such tenant
/// exists.
pub async fn flag_token_refresh(db: &Database, tenant_id: &str) -> Result<bool, HooklineError> {
    let tenant_id = tenant_id.to_string();
    let now = now_ts();

    let changed = db
        .connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            Ok(conn.execute(
                "UPDATE tenants SET token_needs_refresh = 1, last_webhook_update = ?1
                 WHERE tenant_id = ?2",
                rusqlite::params![now, tenant_id],
            )?)
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Clear the refresh flag after the downstream refresh succeeded.
pub async fn clear_token_refresh(db: &Database, tenant_id: &str) -> Result<(), HooklineError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE tenants SET token_needs_refresh = 0 WHERE tenant_id = ?1",
                [&tenant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one tenant.
pub async fn get_tenant(db: &Database, tenant_id: &str) -> Result<Option<TenantRecord>, HooklineError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT tenant_id, company_id, location_id, app_installed, install_state,
                        setup_error, token_needs_refresh, installed_at, uninstalled_at,
                        last_webhook_update
                 FROM tenants WHERE tenant_id = ?1",
            )?;
            Ok(stmt
                .query_row([&tenant_id], map_tenant)
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

/// All installed tenants under a company, for cross-location sync.
pub async fn list_installed_for_company(
    db: &Database,
    company_id: &str,
) -> Result<Vec<TenantRecord>, HooklineError> {
    let company_id = company_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT tenant_id, company_id, location_id, app_installed, install_state,
                        setup_error, token_needs_refresh, installed_at, uninstalled_at,
                        last_webhook_update
                 FROM tenants
                 WHERE company_id = ?1 AND app_installed = 1
                 ORDER BY tenant_id",
            )?;
            let rows = stmt
                .query_map([&company_id], map_tenant)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

fn map_tenant(row: &rusqlite::Row<'_>) -> Result<TenantRecord, rusqlite::Error> {
    Ok(TenantRecord {
        tenant_id: row.get(0)?,
        company_id: row.get(1)?,
        location_id: row.get(2)?,
        app_installed: row.get::<_, i64>(3)? != 0,
        install_state: row.get(4)?,
        setup_error: row.get(5)?,
        token_needs_refresh: row.get::<_, i64>(6)? != 0,
        installed_at: row.get(7)?,
        uninstalled_at: row.get(8)?,
        last_webhook_update: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("tenants.db");
        Database::open(path.to_str().unwrap()).await.unwrap()
    }

    fn key(company: Option<&str>, location: Option<&str>) -> TenantKey {
        TenantKey::new(company.map(String::from), location.map(String::from)).unwrap()
    }

    #[tokio::test]
    async fn install_lifecycle_happy_path() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        begin_install(&db, &k).await.unwrap();
        let t = get_tenant(&db, "loc-1").await.unwrap().unwrap();
        assert_eq!(t.install_state.as_deref(), Some("in_progress"));
        assert!(!t.app_installed);

        complete_install(&db, &k).await.unwrap();
        let t = get_tenant(&db, "loc-1").await.unwrap().unwrap();
        assert!(t.app_installed);
        assert_eq!(t.install_state.as_deref(), Some("complete"));
        assert!(t.installed_at.is_some());
    }

    #[tokio::test]
    async fn company_level_install_uses_company_id() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), None);

        assert_eq!(tenant_id_for(&k), "co-1");
        begin_install(&db, &k).await.unwrap();
        assert!(get_tenant(&db, "co-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_setup_keeps_the_error_visible() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(None, Some("loc-2"));

        begin_install(&db, &k).await.unwrap();
        fail_install(&db, &k, "downstream timeout").await.unwrap();

        let t = get_tenant(&db, "loc-2").await.unwrap().unwrap();
        assert_eq!(t.install_state.as_deref(), Some("setup_failed"));
        assert_eq!(t.setup_error.as_deref(), Some("downstream timeout"));
        assert!(!t.app_installed);
    }

    #[tokio::test]
    async fn uninstall_soft_clears_but_keeps_the_row() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        begin_install(&db, &k).await.unwrap();
        complete_install(&db, &k).await.unwrap();
        mark_uninstalled(&db, &k).await.unwrap();

        let t = get_tenant(&db, "loc-1").await.unwrap().unwrap();
        assert!(!t.app_installed);
        assert_eq!(t.install_state.as_deref(), Some("uninstalled"));
        assert!(t.uninstalled_at.is_some());
    }

    #[tokio::test]
    async fn reinstall_after_uninstall_resets_state() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(Some("co-1"), Some("loc-1"));

        begin_install(&db, &k).await.unwrap();
        complete_install(&db, &k).await.unwrap();
        mark_uninstalled(&db, &k).await.unwrap();

        begin_install(&db, &k).await.unwrap();
        complete_install(&db, &k).await.unwrap();
        let t = get_tenant(&db, "loc-1").await.unwrap().unwrap();
        assert!(t.app_installed);
        assert!(t.uninstalled_at.is_none());
    }

    #[tokio::test]
    async fn token_refresh_flag_round_trip() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;
        let k = key(None, Some("loc-3"));
        begin_install(&db, &k).await.unwrap();

        assert!(flag_token_refresh(&db, "loc-3").await.unwrap());
        assert!(get_tenant(&db, "loc-3").await.unwrap().unwrap().token_needs_refresh);

        clear_token_refresh(&db, "loc-3").await.unwrap();
        assert!(!get_tenant(&db, "loc-3").await.unwrap().unwrap().token_needs_refresh);

        // Unknown tenants are reported, not silently created.
        assert!(!flag_token_refresh(&db, "loc-missing").await.unwrap());
    }

    #[tokio::test]
    async fn company_listing_returns_only_installed_locations() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir).await;

        for loc in ["loc-a", "loc-b", "loc-c"] {
            let k = key(Some("co-1"), Some(loc));
            begin_install(&db, &k).await.unwrap();
        }
        complete_install(&db, &key(Some("co-1"), Some("loc-a"))).await.unwrap();
        complete_install(&db, &key(Some("co-1"), Some("loc-b"))).await.unwrap();

        let installed = list_installed_for_company(&db, "co-1").await.unwrap();
        let ids: Vec<&str> = installed.iter().map(|t| t.tenant_id.as_str()).collect();
        assert_eq!(ids, vec!["loc-a", "loc-b"]);
    }
}
