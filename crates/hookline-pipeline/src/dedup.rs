// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deduplication gate for redelivered webhooks.
//!
//! The gate runs at processing time, not intake: intake always enqueues, and
//! the webhook driver asks the gate before routing. Two signals mark a
//! duplicate inside the retention window: the upstream webhook id, and a
//! content fingerprint for redeliveries that arrive under a fresh id.

use hookline_core::{HooklineError, WebhookEnvelope};
use hookline_storage::{queries::dedup, Database};
use sha2::{Digest, Sha256};

/// Content fingerprint: what happened, to which entity, when.
///
/// Deliberately excludes the webhook id so a redelivery with a new id still
/// collides, and excludes volatile payload fields (delivery metadata) that
/// differ between otherwise identical deliveries.
pub fn fingerprint(envelope: &WebhookEnvelope) -> String {
    let mut hasher = Sha256::new();
    hasher.update(envelope.event_type.as_bytes());
    hasher.update(b":");
    hasher.update(envelope.external_id().unwrap_or("-").as_bytes());
    hasher.update(b":");
    hasher.update(envelope.timestamp.as_deref().unwrap_or("-").as_bytes());
    hex::encode(hasher.finalize())
}

/// Check-and-record in one storage call. Returns `true` for duplicates.
pub async fn is_duplicate(db: &Database, envelope: &WebhookEnvelope) -> Result<bool, HooklineError> {
    let fp = fingerprint(envelope);
    dedup::check_and_record(db, envelope.webhook_id.clone(), &fp, &envelope.event_type).await
}
