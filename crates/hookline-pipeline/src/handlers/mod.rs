// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event-type handlers. Each one is idempotent under redelivery; the
//! router dispatches to them after the dedup gate and claim have run.

pub mod appointments;
pub mod contacts;
pub mod conversations;
pub mod install;

use hookline_core::{HooklineError, WebhookEnvelope};

/// A string field from the envelope payload, owned.
pub(crate) fn payload_str(envelope: &WebhookEnvelope, key: &str) -> Option<String> {
    envelope
        .payload
        .get(key)
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// The entity id, required for all entity events.
pub(crate) fn require_external_id(envelope: &WebhookEnvelope) -> Result<String, HooklineError> {
    envelope
        .external_id()
        .map(String::from)
        .ok_or_else(|| HooklineError::Envelope("payload is missing the entity id".into()))
}

/// The location id, required for location-scoped events.
pub(crate) fn require_location(envelope: &WebhookEnvelope) -> Result<String, HooklineError> {
    envelope
        .location_id
        .clone()
        .ok_or_else(|| HooklineError::Envelope("event requires a locationId".into()))
}
