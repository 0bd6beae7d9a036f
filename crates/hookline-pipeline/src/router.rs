// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event router: one exhaustive dispatch from the closed event catalog to
//! its handler. Adding an [`EventType`] variant fails compilation here until
//! a dispatch decision is made.

use hookline_core::{EventType, HandlerOutcome, HooklineError, QueueItem};

use crate::handlers::{appointments, contacts, conversations, install};
use crate::PipelineContext;

/// Route one claimed queue item to its handler.
///
/// `holder` identifies this driver run for install-lock ownership. Errors
/// returned here are the handler's own failures; the caller decides between
/// reschedule and terminal failure via [`HooklineError::is_retryable`].
pub async fn route(
    ctx: &PipelineContext,
    item: &QueueItem,
    holder: &str,
) -> Result<HandlerOutcome, HooklineError> {
    let envelope = item.envelope()?;
    let event = envelope.event();
    let db = &ctx.db;

    match event {
        EventType::ContactCreate | EventType::ContactUpdate => {
            contacts::apply_upsert(db, &envelope).await?;
        }
        EventType::ContactDelete => {
            contacts::apply_delete(db, &envelope).await?;
        }
        EventType::AppointmentCreate | EventType::AppointmentUpdate => {
            appointments::apply_upsert(db, &envelope).await?;
        }
        EventType::AppointmentDelete => {
            appointments::apply_delete(db, &envelope).await?;
        }
        EventType::InboundMessage => {
            conversations::apply_message(db, &envelope, true).await?;
        }
        EventType::OutboundMessage => {
            conversations::apply_message(db, &envelope, false).await?;
        }
        EventType::ConversationUnreadUpdate => {
            conversations::apply_unread_update(db, &envelope).await?;
        }
        EventType::Install => {
            return install::handle_install(ctx, &envelope, holder).await;
        }
        EventType::Uninstall => {
            return install::handle_uninstall(ctx, &envelope, holder).await;
        }
        EventType::TokenRefresh => {
            install::handle_token_refresh(ctx, &envelope).await?;
        }
        EventType::AgencySync => {
            install::handle_agency_sync(ctx, &envelope).await?;
        }
        EventType::Unknown(tag) => {
            // Catalog drift upstream must never stall the queue: log it and
            // let the item complete.
            tracing::warn!(item_id = item.id, tag, "unrecognized event type");
            return Ok(HandlerOutcome::Unrecognized(tag));
        }
    }
    Ok(HandlerOutcome::Applied)
}
