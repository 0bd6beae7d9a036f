// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and message event handlers.
//!
//! The unread counter has two writers with different authority: message
//! events move it incrementally (exactly once per message id), and
//! ConversationUnreadUpdate overwrites it with the platform's value.

use hookline_core::{HooklineError, WebhookEnvelope};
use hookline_storage::queries::conversations::{self, DIRECTION_INBOUND, DIRECTION_OUTBOUND};
use hookline_storage::Database;

use super::{payload_str, require_external_id, require_location};

pub async fn apply_message(
    db: &Database,
    envelope: &WebhookEnvelope,
    inbound: bool,
) -> Result<(), HooklineError> {
    let message_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    let conversation_id = payload_str(envelope, "conversationId")
        .ok_or_else(|| HooklineError::Envelope("message is missing conversationId".into()))?;

    let direction = if inbound { DIRECTION_INBOUND } else { DIRECTION_OUTBOUND };
    let new = conversations::record_message(
        db,
        &message_id,
        &conversation_id,
        &location_id,
        payload_str(envelope, "contactId"),
        direction,
        payload_str(envelope, "body"),
    )
    .await?;

    if !new {
        tracing::debug!(message_id, "message already recorded, redelivery ignored");
    }
    Ok(())
}

pub async fn apply_unread_update(
    db: &Database,
    envelope: &WebhookEnvelope,
) -> Result<(), HooklineError> {
    let conversation_id = require_external_id(envelope)?;
    let location_id = require_location(envelope)?;
    let unread = envelope
        .payload
        .get("unreadCount")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HooklineError::Envelope("unread update is missing unreadCount".into()))?;

    conversations::set_unread(db, &conversation_id, &location_id, unread.max(0)).await
}
