// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the gateway.
//!
//! Two independent middlewares guard two surfaces:
//! - webhook intake accepts a bearer token (`Authorization: Bearer <token>`)
//! - cron endpoints accept either the bearer token or a shared secret in
//!   the scheduler header, so both a generic scheduler and the platform's
//!   native cron can trigger runs
//!
//! When no relevant credential is configured, that surface rejects all
//! requests (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Credential configuration shared by both middlewares.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token for webhook intake.
    pub bearer_token: Option<String>,
    /// Header name the external scheduler sends its secret in.
    pub scheduler_header: String,
    /// Expected scheduler secret for cron endpoints.
    pub scheduler_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("scheduler_header", &self.scheduler_header)
            .field(
                "scheduler_secret",
                &self.scheduler_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware guarding webhook intake.
pub async fn webhook_auth(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected) = auth.bearer_token else {
        tracing::error!("webhook intake has no bearer token configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if token == Some(expected.as_str()) {
        return Ok(next.run(request).await);
    }
    Err(StatusCode::UNAUTHORIZED)
}

/// Middleware guarding the cron endpoints.
///
/// Accepts the bearer token or the scheduler-header secret, whichever is
/// configured and matches. With neither credential configured every request
/// is rejected.
pub async fn cron_auth(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.bearer_token.is_none() && auth.scheduler_secret.is_none() {
        tracing::error!("cron endpoints have no credentials configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    if let Some(ref expected) = auth.bearer_token {
        let token = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if token == Some(expected.as_str()) {
            return Ok(next.run(request).await);
        }
    }

    if let Some(ref expected) = auth.scheduler_secret {
        let secret = request
            .headers()
            .get(auth.scheduler_header.as_str())
            .and_then(|v| v.to_str().ok());
        if secret == Some(expected.as_str()) {
            return Ok(next.run(request).await);
        }
    }

    Err(StatusCode::UNAUTHORIZED)
}
