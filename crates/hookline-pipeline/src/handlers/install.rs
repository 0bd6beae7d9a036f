// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Install lifecycle orchestration.
//!
//! Install and uninstall writes must be serialized per tenant: both handlers
//! take the tenant's TTL lock for the duration and report contention to the
//! caller instead of blocking. A downstream setup failure is recorded on the
//! tenant and does NOT fail the enclosing webhook; the install-retry queue
//! exists for redelivered INSTALL events, not for resurrecting setup calls.

use hookline_core::types::QueueName;
use hookline_core::{HandlerOutcome, HooklineError, WebhookEnvelope};
use hookline_storage::queries::{events, locks, queue, tenants};

use crate::PipelineContext;

/// Tenant states written by this module.
const STATE_COMPLETE: &str = "complete";

pub async fn handle_install(
    ctx: &PipelineContext,
    envelope: &WebhookEnvelope,
    holder: &str,
) -> Result<HandlerOutcome, HooklineError> {
    let key = envelope.tenant_key()?;
    let ttl = ctx.locks.ttl_secs as i64;

    if !locks::try_acquire(&ctx.db, &key, holder, ttl).await? {
        tracing::info!(%key, "install lock held, deferring");
        return Ok(HandlerOutcome::Contended);
    }

    // Run the guarded section, then release before surfacing any error so a
    // failure cannot strand the lock for its full TTL.
    let guarded = run_install(ctx, envelope).await;
    locks::release(&ctx.db, &key, holder).await?;
    guarded?;
    Ok(HandlerOutcome::Applied)
}

async fn run_install(ctx: &PipelineContext, envelope: &WebhookEnvelope) -> Result<(), HooklineError> {
    let key = envelope.tenant_key()?;
    let tenant_id = tenants::tenant_id_for(&key);

    if let Some(tenant) = tenants::get_tenant(&ctx.db, &tenant_id).await?
        && tenant.app_installed
        && tenant.install_state.as_deref() == Some(STATE_COMPLETE)
    {
        tracing::info!(%tenant_id, "tenant already installed, setup skipped");
        return Ok(());
    }

    tenants::begin_install(&ctx.db, &key).await?;

    match ctx.downstream.setup_tenant(&key).await {
        Ok(()) => {
            tenants::complete_install(&ctx.db, &key).await?;
            events::record(
                &ctx.db,
                "install_complete",
                key.company_id.clone(),
                key.location_id.clone(),
                None,
                None,
            )
            .await?;
            tracing::info!(%tenant_id, "install complete");

            // A company-level install fans out to every installed location
            // via the sync queue.
            if let Some(ref company) = key.company_id {
                let sync_payload =
                    serde_json::json!({ "type": "agency_sync", "companyId": company });
                queue::enqueue(
                    &ctx.db,
                    QueueName::Sync,
                    None,
                    "agency_sync",
                    &sync_payload.to_string(),
                    Some("install".into()),
                    ctx.queue.max_attempts,
                )
                .await?;
            }
        }
        Err(e) => {
            // The webhook itself still completes; the tenant record carries
            // the failure for operators and later retries.
            tenants::fail_install(&ctx.db, &key, &e.to_string()).await?;
            events::record(
                &ctx.db,
                "install_setup_failed",
                key.company_id.clone(),
                key.location_id.clone(),
                None,
                Some(e.to_string()),
            )
            .await?;
            tracing::warn!(%tenant_id, error = %e, "downstream setup failed");
        }
    }
    Ok(())
}

/// UNINSTALL takes the same tenant lock as INSTALL so the soft-clear cannot
/// interleave with a concurrent install's guarded section.
pub async fn handle_uninstall(
    ctx: &PipelineContext,
    envelope: &WebhookEnvelope,
    holder: &str,
) -> Result<HandlerOutcome, HooklineError> {
    let key = envelope.tenant_key()?;
    let ttl = ctx.locks.ttl_secs as i64;

    if !locks::try_acquire(&ctx.db, &key, holder, ttl).await? {
        tracing::info!(%key, "install lock held, deferring uninstall");
        return Ok(HandlerOutcome::Contended);
    }

    let guarded = run_uninstall(ctx, &key).await;
    locks::release(&ctx.db, &key, holder).await?;
    guarded?;
    Ok(HandlerOutcome::Applied)
}

async fn run_uninstall(
    ctx: &PipelineContext,
    key: &hookline_core::TenantKey,
) -> Result<(), HooklineError> {
    tenants::mark_uninstalled(&ctx.db, key).await?;
    events::record(
        &ctx.db,
        "uninstall",
        key.company_id.clone(),
        key.location_id.clone(),
        None,
        None,
    )
    .await?;
    tracing::info!(%key, "tenant uninstalled");
    Ok(())
}

pub async fn handle_token_refresh(
    ctx: &PipelineContext,
    envelope: &WebhookEnvelope,
) -> Result<(), HooklineError> {
    let location_id = envelope
        .location_id
        .clone()
        .ok_or_else(|| HooklineError::Envelope("token refresh requires a locationId".into()))?;

    let known = tenants::flag_token_refresh(&ctx.db, &location_id).await?;
    if !known {
        tracing::warn!(%location_id, "token refresh for unknown tenant");
    }

    ctx.downstream.refresh_tokens(&location_id).await?;

    if known {
        tenants::clear_token_refresh(&ctx.db, &location_id).await?;
    }
    Ok(())
}

/// Cross-location sync for a company: re-run setup for every installed
/// location. A downstream failure propagates so the sync driver reschedules
/// the whole job; setup is idempotent per location, so the re-run is safe.
pub async fn handle_agency_sync(
    ctx: &PipelineContext,
    envelope: &WebhookEnvelope,
) -> Result<(), HooklineError> {
    let company_id = envelope
        .company_id
        .clone()
        .ok_or_else(|| HooklineError::Envelope("agency sync requires a companyId".into()))?;

    let installed = tenants::list_installed_for_company(&ctx.db, &company_id).await?;
    let count = installed.len();

    for tenant in &installed {
        let key = hookline_core::TenantKey::new(
            tenant.company_id.clone(),
            tenant.location_id.clone(),
        )?;
        ctx.downstream.setup_tenant(&key).await?;
    }

    events::record(
        &ctx.db,
        "agency_sync",
        Some(company_id.clone()),
        None,
        None,
        Some(format!("{count} locations synced")),
    )
    .await?;
    tracing::info!(%company_id, count, "agency sync complete");
    Ok(())
}
