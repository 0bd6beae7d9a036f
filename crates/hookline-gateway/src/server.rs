// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Three route groups with different trust levels: unauthenticated health,
//! bearer-guarded webhook intake, and scheduler-guarded cron triggers.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use hookline_config::model::ServerConfig;
use hookline_core::HooklineError;
use hookline_pipeline::PipelineContext;
use tower_http::trace::TraceLayer;

use crate::auth::{cron_auth, webhook_auth, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub ctx: PipelineContext,
    pub auth: AuthConfig,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(ctx: PipelineContext, config: &ServerConfig) -> Self {
        Self {
            ctx,
            auth: AuthConfig {
                bearer_token: config.bearer_token.clone(),
                scheduler_header: config.scheduler_header.clone(),
                scheduler_secret: config.scheduler_secret.clone(),
            },
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the full gateway router. Separated from [`start_server`] so tests
/// can drive it without binding a socket.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let intake_routes = Router::new()
        .route("/v1/webhooks", post(handlers::post_webhooks))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state.clone(),
            webhook_auth,
        ))
        .with_state(state.clone());

    let cron_routes = Router::new()
        .route("/v1/cron/webhooks", post(handlers::post_cron_webhooks))
        .route(
            "/v1/cron/install-retries",
            post(handlers::post_cron_install_retries),
        )
        .route("/v1/cron/sync", post(handlers::post_cron_sync))
        .route_layer(axum_middleware::from_fn_with_state(auth_state, cron_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(intake_routes)
        .merge(cron_routes)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until SIGINT.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), HooklineError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HooklineError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HooklineError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    } else {
        tracing::info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use hookline_config::model::HooklineConfig;
    use hookline_core::types::{QueueName, TenantKey};
    use hookline_core::{DownstreamClient, HooklineError};
    use hookline_storage::queries::queue;
    use hookline_storage::Database;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use super::*;

    struct NoopDownstream;

    #[async_trait]
    impl DownstreamClient for NoopDownstream {
        async fn setup_tenant(&self, _key: &TenantKey) -> Result<(), HooklineError> {
            Ok(())
        }
        async fn refresh_tokens(&self, _location_id: &str) -> Result<(), HooklineError> {
            Ok(())
        }
    }

    async fn test_state(dir: &tempfile::TempDir) -> GatewayState {
        let path = dir.path().join("gateway.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let mut config = HooklineConfig::default();
        config.server.bearer_token = Some("intake-token".into());
        config.server.scheduler_secret = Some("cron-secret".into());

        let ctx = PipelineContext::new(db, Arc::new(NoopDownstream), &config);
        GatewayState::new(ctx, &config.server)
    }

    fn webhook_request(auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/webhooks")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn intake_without_token_is_unauthorized() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let resp = app
            .oneshot(webhook_request(None, r#"{"type":"ContactCreate"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn intake_with_wrong_token_is_unauthorized() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let resp = app
            .oneshot(webhook_request(Some("wrong"), r#"{"type":"ContactCreate"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepted_webhook_lands_in_the_queue() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let db = state.ctx.db.clone();
        let app = build_router(state);

        let body = r#"{"webhookId":"wh-1","type":"ContactCreate","locationId":"loc-1",
            "payload":{"id":"c-1"}}"#;
        let resp = app
            .oneshot(webhook_request(Some("intake-token"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let batch = queue::dequeue_batch(&db, QueueName::Webhooks, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].webhook_id.as_deref(), Some("wh-1"));
        assert_eq!(batch[0].event_type, "ContactCreate");
    }

    #[tokio::test]
    async fn duplicate_deliveries_are_both_accepted_at_intake() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let db = state.ctx.db.clone();
        let app = build_router(state);

        let body = r#"{"webhookId":"wh-1","type":"ContactCreate","locationId":"loc-1",
            "payload":{"id":"c-1"}}"#;
        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(webhook_request(Some("intake-token"), body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
        }

        // Dedup happens at processing time, not intake.
        let batch = queue::dequeue_batch(&db, QueueName::Webhooks, 10).await.unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn body_without_type_tag_is_rejected() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let resp = app
            .oneshot(webhook_request(Some("intake-token"), r#"{"locationId":"loc-1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cron_requires_the_scheduler_header() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let no_header = Request::builder()
            .method("POST")
            .uri("/v1/cron/webhooks")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(no_header).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let with_header = Request::builder()
            .method("POST")
            .uri("/v1/cron/webhooks")
            .header("x-hookline-cron", "cron-secret")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(with_header).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cron_accepts_the_bearer_token_as_an_alternative() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let with_bearer = Request::builder()
            .method("POST")
            .uri("/v1/cron/webhooks")
            .header(header::AUTHORIZATION, "Bearer intake-token")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(with_bearer).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let wrong_bearer = Request::builder()
            .method("POST")
            .uri("/v1/cron/webhooks")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(wrong_bearer).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_is_unauthenticated() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;
        let app = build_router(state);

        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unconfigured_credentials_fail_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gateway.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let config = HooklineConfig::default();
        let ctx = PipelineContext::new(db, Arc::new(NoopDownstream), &config);
        let app = build_router(GatewayState::new(ctx, &config.server));

        let resp = app
            .clone()
            .oneshot(webhook_request(Some("anything"), r#"{"type":"ContactCreate"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let cron = Request::builder()
            .method("POST")
            .uri("/v1/cron/sync")
            .header("x-hookline-cron", "anything")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(cron).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
