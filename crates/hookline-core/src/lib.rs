// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hookline webhook pipeline.
//!
//! This crate provides the error type, the shared domain types (webhook
//! envelopes, the closed event catalog, queue item shapes, cron summaries),
//! and the trait seams used throughout the Hookline workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HooklineError;
pub use traits::DownstreamClient;
pub use types::{
    ClaimResult, CronSummary, EventType, HandlerOutcome, QueueItem, QueueName, QueueStatus,
    TenantKey, WebhookEnvelope,
};
