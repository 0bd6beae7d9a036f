// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Hookline service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Hookline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HooklineConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP server and trigger-auth settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Durable queue tuning (batch sizes, attempts, backoff, retention).
    #[serde(default)]
    pub queue: QueueConfig,

    /// Install lock settings.
    #[serde(default)]
    pub locks: LockConfig,

    /// Deduplication history settings.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Downstream CRM platform settings.
    #[serde(default)]
    pub downstream: DownstreamConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "hookline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server configuration, including the shared secrets that guard the
/// webhook intake and cron trigger endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared-secret bearer token. `None` disables bearer auth.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Header name carrying the platform scheduler secret.
    #[serde(default = "default_scheduler_header")]
    pub scheduler_header: String,

    /// Expected value of the scheduler header. `None` disables header auth.
    #[serde(default)]
    pub scheduler_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            scheduler_header: default_scheduler_header(),
            scheduler_secret: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8380
}

fn default_scheduler_header() -> String {
    "x-hookline-cron".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("hookline").join("hookline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("hookline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Durable queue tuning.
///
/// Backoff is linear: `process_after = now + attempts * backoff_secs`.
/// The observed unit is one minute for webhook items and five minutes for
/// sync jobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Batch size for the generic webhook queue.
    #[serde(default = "default_webhook_batch")]
    pub webhook_batch: u32,

    /// Batch size for the install-retry queue.
    #[serde(default = "default_install_retry_batch")]
    pub install_retry_batch: u32,

    /// Batch size for the cross-tenant sync queue.
    #[serde(default = "default_sync_batch")]
    pub sync_batch: u32,

    /// Processing attempts before an item lands in terminal `failed`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit for webhook and install-retry items, in seconds.
    #[serde(default = "default_webhook_backoff_secs")]
    pub webhook_backoff_secs: u64,

    /// Linear backoff unit for sync jobs, in seconds.
    #[serde(default = "default_sync_backoff_secs")]
    pub sync_backoff_secs: u64,

    /// Items stuck in `processing` longer than this are reclaimed as
    /// retry-eligible (crashed-worker recovery).
    #[serde(default = "default_processing_timeout_secs")]
    pub processing_timeout_secs: u64,

    /// Retention for terminal completed/skipped items, in hours.
    #[serde(default = "default_completed_retention_hours")]
    pub completed_retention_hours: u64,

    /// Retention for audit rows and terminal failed items, in days.
    #[serde(default = "default_audit_retention_days")]
    pub audit_retention_days: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            webhook_batch: default_webhook_batch(),
            install_retry_batch: default_install_retry_batch(),
            sync_batch: default_sync_batch(),
            max_attempts: default_max_attempts(),
            webhook_backoff_secs: default_webhook_backoff_secs(),
            sync_backoff_secs: default_sync_backoff_secs(),
            processing_timeout_secs: default_processing_timeout_secs(),
            completed_retention_hours: default_completed_retention_hours(),
            audit_retention_days: default_audit_retention_days(),
        }
    }
}

fn default_webhook_batch() -> u32 {
    50
}

fn default_install_retry_batch() -> u32 {
    10
}

fn default_sync_batch() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_webhook_backoff_secs() -> u64 {
    60
}

fn default_sync_backoff_secs() -> u64 {
    300
}

fn default_processing_timeout_secs() -> u64 {
    600
}

fn default_completed_retention_hours() -> u64 {
    24
}

fn default_audit_retention_days() -> u64 {
    7
}

/// Install lock configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Lock TTL in seconds. Expired locks are inert and auto-released.
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_lock_ttl_secs(),
        }
    }
}

fn default_lock_ttl_secs() -> u64 {
    180
}

/// Deduplication history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Hours a fingerprint stays in the recent-history set before purge.
    #[serde(default = "default_dedup_retention_hours")]
    pub retention_hours: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_dedup_retention_hours(),
        }
    }
}

fn default_dedup_retention_hours() -> u64 {
    24
}

/// Downstream CRM platform configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownstreamConfig {
    /// Base URL for the setup and token endpoints.
    #[serde(default = "default_downstream_base_url")]
    pub base_url: String,

    /// API key sent in the `x-api-key` header on downstream calls.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call timeout in seconds. Timeouts are retryable failures.
    #[serde(default = "default_downstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_downstream_base_url(),
            api_key: None,
            timeout_secs: default_downstream_timeout_secs(),
        }
    }
}

fn default_downstream_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_downstream_timeout_secs() -> u64 {
    10
}
