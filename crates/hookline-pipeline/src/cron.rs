// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron drivers: one run drains a bounded batch from one queue.
//!
//! Drivers are stateless and safe to run concurrently; the claim CAS in the
//! store is what prevents double-processing, not any coordination here. The
//! webhook driver also performs housekeeping (expired locks, stale claims,
//! retention purges) at the start of each run so a deployment with only the
//! webhook cron wired up still ages out its garbage.

use hookline_core::types::{QueueItem, QueueName, QueueStatus};
use hookline_core::{ClaimResult, CronSummary, HandlerOutcome, HooklineError};
use hookline_storage::queries::{dedup as dedup_q, events, locks, queue};

use crate::{dedup, router, PipelineContext};

/// Provenance tag on items handed off to the install-retry queue.
const SOURCE_INSTALL_RETRY: &str = "install_retry";

/// Drain one batch from the webhook queue, with housekeeping first.
pub async fn run_webhook_queue(ctx: &PipelineContext) -> Result<CronSummary, HooklineError> {
    let cleaned = run_housekeeping(ctx).await?;
    let mut summary = CronSummary::new(cleaned);
    let holder = run_id();

    let batch = queue::dequeue_batch(&ctx.db, QueueName::Webhooks, ctx.queue.webhook_batch).await?;
    for item in batch {
        if queue::claim(&ctx.db, item.id).await? != ClaimResult::Claimed {
            continue;
        }
        summary.processed += 1;

        // The dedup gate runs here, after the claim, so at-least-once intake
        // can stay dumb: every delivery is enqueued and exactly one copy
        // makes it past this point. Only first attempts are gated; an item's
        // fingerprint was recorded on attempt one and must not block its own
        // retries (the dequeued snapshot still shows the pre-claim count).
        let envelope = match item.envelope() {
            Ok(env) => env,
            Err(e) => {
                // Structurally invalid payloads are the gate's other reject
                // case: retire them as skipped, same as duplicates.
                queue::mark_skipped(&ctx.db, item.id, &e.to_string()).await?;
                summary.skipped += 1;
                continue;
            }
        };
        if item.attempts == 0 && dedup::is_duplicate(&ctx.db, &envelope).await? {
            queue::mark_skipped(&ctx.db, item.id, "duplicate delivery").await?;
            summary.skipped += 1;
            continue;
        }

        match router::route(ctx, &item, &holder).await {
            Ok(HandlerOutcome::Applied) | Ok(HandlerOutcome::Unrecognized(_)) => {
                queue::mark_completed(&ctx.db, item.id).await?;
                summary.success += 1;
            }
            Ok(HandlerOutcome::Contended) => {
                hand_off_to_install_retry(ctx, &item).await?;
                summary.skipped += 1;
            }
            Err(e) => {
                settle_failure(ctx, &item, &e, ctx.queue.webhook_backoff_secs as i64).await?;
                summary.failed += 1;
            }
        }
    }

    summary.timestamp = hookline_storage::now_ts();
    tracing::info!(
        processed = summary.processed,
        success = summary.success,
        failed = summary.failed,
        skipped = summary.skipped,
        cleaned = summary.cleaned,
        "webhook queue run complete"
    );
    Ok(summary)
}

/// Drain one batch from the install-retry queue.
///
/// Items here are INSTALL events that previously lost the lock race. No
/// dedup gate: the original delivery already recorded its fingerprint, and
/// these copies exist precisely to be processed again.
pub async fn run_install_retries(ctx: &PipelineContext) -> Result<CronSummary, HooklineError> {
    let mut summary = CronSummary::new(0);
    let holder = run_id();

    let batch =
        queue::dequeue_batch(&ctx.db, QueueName::InstallRetry, ctx.queue.install_retry_batch)
            .await?;
    for item in batch {
        if queue::claim(&ctx.db, item.id).await? != ClaimResult::Claimed {
            continue;
        }
        summary.processed += 1;

        match router::route(ctx, &item, &holder).await {
            Ok(HandlerOutcome::Applied) | Ok(HandlerOutcome::Unrecognized(_)) => {
                queue::mark_completed(&ctx.db, item.id).await?;
                summary.success += 1;
            }
            Ok(HandlerOutcome::Contended) => {
                // Still locked; try again after a backoff rather than
                // cascading into yet another queue.
                let status = queue::reschedule_with_backoff(
                    &ctx.db,
                    item.id,
                    "install lock contended",
                    ctx.queue.webhook_backoff_secs as i64,
                )
                .await?;
                if status == QueueStatus::Failed {
                    summary.failed += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            Err(e) => {
                settle_failure(ctx, &item, &e, ctx.queue.webhook_backoff_secs as i64).await?;
                summary.failed += 1;
            }
        }
    }

    summary.timestamp = hookline_storage::now_ts();
    tracing::info!(
        processed = summary.processed,
        success = summary.success,
        failed = summary.failed,
        skipped = summary.skipped,
        "install retry run complete"
    );
    Ok(summary)
}

/// Drain one batch from the sync queue. Sync jobs use the slower backoff
/// unit; a failing downstream should not be hammered every minute.
pub async fn run_sync_queue(ctx: &PipelineContext) -> Result<CronSummary, HooklineError> {
    let mut summary = CronSummary::new(0);
    let holder = run_id();

    let batch = queue::dequeue_batch(&ctx.db, QueueName::Sync, ctx.queue.sync_batch).await?;
    for item in batch {
        if queue::claim(&ctx.db, item.id).await? != ClaimResult::Claimed {
            continue;
        }
        summary.processed += 1;

        match router::route(ctx, &item, &holder).await {
            Ok(HandlerOutcome::Applied) | Ok(HandlerOutcome::Unrecognized(_)) => {
                queue::mark_completed(&ctx.db, item.id).await?;
                summary.success += 1;
            }
            Ok(HandlerOutcome::Contended) => {
                let status = queue::reschedule_with_backoff(
                    &ctx.db,
                    item.id,
                    "install lock contended",
                    ctx.queue.sync_backoff_secs as i64,
                )
                .await?;
                if status == QueueStatus::Failed {
                    summary.failed += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            Err(e) => {
                settle_failure(ctx, &item, &e, ctx.queue.sync_backoff_secs as i64).await?;
                summary.failed += 1;
            }
        }
    }

    summary.timestamp = hookline_storage::now_ts();
    tracing::info!(
        processed = summary.processed,
        success = summary.success,
        failed = summary.failed,
        "sync queue run complete"
    );
    Ok(summary)
}

/// Expired locks, stale claims, and retention purges. Returns the total
/// number of rows touched.
pub async fn run_housekeeping(ctx: &PipelineContext) -> Result<u64, HooklineError> {
    let mut cleaned = locks::cleanup_expired(&ctx.db).await?;
    cleaned += queue::reclaim_stale(&ctx.db, ctx.queue.processing_timeout_secs as i64).await?;
    cleaned += queue::purge_aged(
        &ctx.db,
        &[QueueStatus::Completed, QueueStatus::Skipped],
        ctx.queue.completed_retention_hours as i64 * 3600,
    )
    .await?;
    cleaned += dedup_q::purge_history(&ctx.db, ctx.dedup.retention_hours as i64).await?;
    cleaned += events::purge_aged(&ctx.db, ctx.queue.audit_retention_days as i64).await?;
    Ok(cleaned)
}

/// Retryable errors reschedule with linear backoff; anything else is final.
async fn settle_failure(
    ctx: &PipelineContext,
    item: &QueueItem,
    error: &HooklineError,
    backoff_unit: i64,
) -> Result<(), HooklineError> {
    if error.is_retryable() {
        let status =
            queue::reschedule_with_backoff(&ctx.db, item.id, &error.to_string(), backoff_unit)
                .await?;
        tracing::warn!(item_id = item.id, ?status, error = %error, "item rescheduled");
    } else {
        queue::mark_failed(&ctx.db, item.id, &error.to_string()).await?;
        tracing::error!(item_id = item.id, error = %error, "item failed permanently");
    }
    Ok(())
}

/// Copy a lock-contended INSTALL item to the install-retry queue and retire
/// the original. The copy starts with a fresh attempt budget.
async fn hand_off_to_install_retry(
    ctx: &PipelineContext,
    item: &QueueItem,
) -> Result<(), HooklineError> {
    queue::enqueue(
        &ctx.db,
        QueueName::InstallRetry,
        item.webhook_id.clone(),
        &item.event_type,
        &item.payload,
        Some(SOURCE_INSTALL_RETRY.into()),
        ctx.queue.max_attempts,
    )
    .await?;
    queue::mark_skipped(&ctx.db, item.id, "handed off to install retry queue").await?;
    tracing::info!(item_id = item.id, "install handed off to retry queue");
    Ok(())
}

fn run_id() -> String {
    format!("cron-{}", uuid::Uuid::new_v4())
}
