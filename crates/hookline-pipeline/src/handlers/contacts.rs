// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact event handlers. Create and update share an upsert so out-of-order
//! and duplicated deliveries converge on the same row.

use hookline_core::{HooklineError, WebhookEnvelope};
use hookline_storage::{queries::contacts, Database};

use super::{payload_str, require_external_id, require_location};

pub async fn apply_upsert(db: &Database, envelope: &WebhookEnvelope) -> Result<(), HooklineError> {
    let external_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    contacts::upsert(
        db,
        &external_id,
        &location_id,
        payload_str(envelope, "name"),
        payload_str(envelope, "email"),
        payload_str(envelope, "phone"),
    )
    .await
}

pub async fn apply_delete(db: &Database, envelope: &WebhookEnvelope) -> Result<(), HooklineError> {
    let external_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    contacts::soft_delete(db, &external_id, &location_id).await
}
