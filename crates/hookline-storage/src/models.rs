// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! Queue item and status types are defined in `hookline-core::types` for use
//! across crate boundaries and re-exported here; the entity rows below are
//! owned by the storage layer.

pub use hookline_core::types::{ClaimResult, QueueItem, QueueName, QueueStatus};

/// A live or expired install lock row.
#[derive(Debug, Clone)]
pub struct InstallLock {
    pub company_id: Option<String>,
    pub location_id: Option<String>,
    pub holder: String,
    pub acquired_at: String,
    pub expires_at: String,
}

/// A tenant record. `tenant_id` is the location id when the tenant is
/// location-scoped, otherwise the company id.
#[derive(Debug, Clone)]
pub struct TenantRecord {
    pub tenant_id: String,
    pub company_id: Option<String>,
    pub location_id: Option<String>,
    pub app_installed: bool,
    pub install_state: Option<String>,
    pub setup_error: Option<String>,
    pub token_needs_refresh: bool,
    pub installed_at: Option<String>,
    pub uninstalled_at: Option<String>,
    pub last_webhook_update: Option<String>,
}

/// A contact record, soft-deletable.
#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub external_id: String,
    pub location_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An appointment record, soft-deletable.
#[derive(Debug, Clone)]
pub struct AppointmentRecord {
    pub external_id: String,
    pub location_id: String,
    pub contact_id: Option<String>,
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub appointment_status: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A conversation with its derived unread counter.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub external_id: String,
    pub location_id: String,
    pub contact_id: Option<String>,
    pub unread_count: i64,
    pub last_message_body: Option<String>,
    pub last_message_at: Option<String>,
    pub deleted: bool,
}
