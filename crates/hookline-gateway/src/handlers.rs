// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the gateway.
//!
//! Intake is deliberately thin: validate just enough to store the delivery,
//! answer 202, and let the cron drivers do everything else. Rejecting a
//! delivery here means the upstream platform redelivers it later; accepting
//! and failing in processing gives a much better audit trail.

use axum::{extract::State, http::StatusCode, Json};
use hookline_core::types::{QueueName, QueueStatus};
use hookline_core::{CronSummary, WebhookEnvelope};
use hookline_pipeline::cron;
use hookline_storage::queries::queue;
use serde_json::json;

use crate::server::GatewayState;

/// POST /v1/webhooks: accept a delivery and enqueue it.
///
/// Always enqueues on success; duplicates are filtered at processing time,
/// never here. The only rejections are bodies that cannot be stored as an
/// envelope at all.
pub async fn post_webhooks(
    State(state): State<GatewayState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<serde_json::Value>)> {
    let envelope: WebhookEnvelope = serde_json::from_value(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid webhook body: {e}") })),
        )
    })?;
    if envelope.event_type.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "webhook body is missing the type tag" })),
        ));
    }

    let payload = serde_json::to_string(&envelope).map_err(internal)?;
    let id = queue::enqueue(
        &state.ctx.db,
        QueueName::Webhooks,
        envelope.webhook_id.clone(),
        &envelope.event_type,
        &payload,
        None,
        state.ctx.queue.max_attempts,
    )
    .await
    .map_err(internal)?;

    tracing::debug!(id, event_type = %envelope.event_type, "webhook accepted");
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued", "id": id }))))
}

/// POST /v1/cron/webhooks: one webhook-queue driver run.
pub async fn post_cron_webhooks(
    State(state): State<GatewayState>,
) -> Result<Json<CronSummary>, (StatusCode, Json<serde_json::Value>)> {
    let summary = cron::run_webhook_queue(&state.ctx).await.map_err(internal)?;
    Ok(Json(summary))
}

/// POST /v1/cron/install-retries: one install-retry driver run.
pub async fn post_cron_install_retries(
    State(state): State<GatewayState>,
) -> Result<Json<CronSummary>, (StatusCode, Json<serde_json::Value>)> {
    let summary = cron::run_install_retries(&state.ctx).await.map_err(internal)?;
    Ok(Json(summary))
}

/// POST /v1/cron/sync: one sync-queue driver run.
pub async fn post_cron_sync(
    State(state): State<GatewayState>,
) -> Result<Json<CronSummary>, (StatusCode, Json<serde_json::Value>)> {
    let summary = cron::run_sync_queue(&state.ctx).await.map_err(internal)?;
    Ok(Json(summary))
}

/// GET /health: unauthenticated liveness plus queue depths.
pub async fn get_health(
    State(state): State<GatewayState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let db = &state.ctx.db;
    let mut queues = serde_json::Map::new();
    for queue_name in [QueueName::Webhooks, QueueName::InstallRetry, QueueName::Sync] {
        let pending = queue::count_by_status(db, queue_name, QueueStatus::Pending)
            .await
            .map_err(internal)?;
        let failed = queue::count_by_status(db, queue_name, QueueStatus::Failed)
            .await
            .map_err(internal)?;
        queues.insert(
            queue_name.to_string(),
            json!({ "pending": pending, "failed": failed }),
        );
    }

    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "queues": queues,
    })))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
