// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hookline.toml` > `~/.config/hookline/hookline.toml`
//! > `/etc/hookline/hookline.toml` with environment variable overrides via
//! `HOOKLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HooklineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hookline/hookline.toml` (system-wide)
/// 3. `~/.config/hookline/hookline.toml` (user XDG config)
/// 4. `./hookline.toml` (local directory)
/// 5. `HOOKLINE_*` environment variables
pub fn load_config() -> Result<HooklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HooklineConfig::default()))
        .merge(Toml::file("/etc/hookline/hookline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hookline/hookline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("hookline.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<HooklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HooklineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HooklineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HooklineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `HOOKLINE_SERVER_BEARER_TOKEN`
/// must map to `server.bearer_token`, not `server.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("HOOKLINE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: HOOKLINE_SERVER_BEARER_TOKEN -> "server_bearer_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("locks_", "locks.", 1)
            .replacen("dedup_", "dedup.", 1)
            .replacen("downstream_", "downstream.", 1);
        mapped.into()
    })
}
