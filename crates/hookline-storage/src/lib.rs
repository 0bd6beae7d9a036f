// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Hookline: durable multi-status queues, TTL install
//! locks, delivery-history dedup, tenant install state, and entity records.
//!
//! All access goes through a single [`Database`] handle whose writes are
//! serialized on one background thread; the claim and lock operations depend
//! on that single-writer property for their atomicity.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::{now_ts, ts_ago, ts_in, Database};
pub use models::{
    AppointmentRecord, ContactRecord, ConversationRecord, InstallLock, TenantRecord,
};
