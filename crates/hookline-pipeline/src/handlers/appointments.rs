// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment event handlers.

use hookline_core::{HooklineError, WebhookEnvelope};
use hookline_storage::{queries::appointments, Database};

use super::{payload_str, require_external_id, require_location};

pub async fn apply_upsert(db: &Database, envelope: &WebhookEnvelope) -> Result<(), HooklineError> {
    let external_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    appointments::upsert(
        db,
        &external_id,
        &location_id,
        payload_str(envelope, "contactId"),
        payload_str(envelope, "title"),
        payload_str(envelope, "startTime"),
        payload_str(envelope, "endTime"),
        payload_str(envelope, "appointmentStatus"),
    )
    .await
}

pub async fn apply_delete(db: &Database, envelope: &WebhookEnvelope) -> Result<(), HooklineError> {
    let external_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    appointments::soft_delete(db, &external_id, &location_id).await
}
