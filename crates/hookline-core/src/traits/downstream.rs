// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound collaborator seam for the external CRM platform.
//!
//! The pipeline only issues two downstream calls, a "setup tenant" call
//! and a token refresh, and only consumes their success/failure signal.
//! Keeping them behind a trait lets tests substitute a counting fake and
//! assert call counts and idempotency without network access.

use async_trait::async_trait;

use crate::error::HooklineError;
use crate::types::TenantKey;

/// Client for the downstream CRM platform.
///
/// Both operations are idempotent on the remote side and safe to retry.
/// Failures are recorded on the tenant record by the install handler, never
/// propagated as the enclosing webhook's failure.
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    /// Trigger post-install setup for a tenant.
    async fn setup_tenant(&self, key: &TenantKey) -> Result<(), HooklineError>;

    /// Ask the platform to refresh OAuth tokens for a location.
    async fn refresh_tokens(&self, location_id: &str) -> Result<(), HooklineError>;
}
