// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, positive
//! batch sizes, and sane retention windows.

use crate::diagnostic::ConfigError;
use crate::model::HooklineConfig;

/// Valid log levels accepted by the tracing EnvFilter we build.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &HooklineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` is not one of: {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    // Validate host is not empty and looks like an IP or hostname
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.scheduler_header.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.scheduler_header must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Batch sizes and the attempt ceiling must be at least 1; a zero here
    // would silently starve a queue.
    for (key, value) in [
        ("queue.webhook_batch", config.queue.webhook_batch),
        ("queue.install_retry_batch", config.queue.install_retry_batch),
        ("queue.sync_batch", config.queue.sync_batch),
        ("queue.max_attempts", config.queue.max_attempts),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1, got 0"),
            });
        }
    }

    for (key, value) in [
        ("queue.processing_timeout_secs", config.queue.processing_timeout_secs),
        ("locks.ttl_secs", config.locks.ttl_secs),
        ("downstream.timeout_secs", config.downstream.timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be positive, got 0"),
            });
        }
    }

    if config.downstream.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "downstream.base_url must not be empty".to_string(),
        });
    } else if !config.downstream.base_url.starts_with("http://")
        && !config.downstream.base_url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "downstream.base_url `{}` must start with http:// or https://",
                config.downstream.base_url
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HooklineConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut config = HooklineConfig::default();
        config.server.host = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("server.host")));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = HooklineConfig::default();
        config.queue.webhook_batch = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("queue.webhook_batch"))
        );
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let mut config = HooklineConfig::default();
        config.queue.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_downstream_url_is_rejected() {
        let mut config = HooklineConfig::default();
        config.downstream.base_url = "not-a-url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("downstream.base_url"))
        );
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = HooklineConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = HooklineConfig::default();
        config.server.host = String::new();
        config.queue.sync_batch = 0;
        config.downstream.base_url = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
