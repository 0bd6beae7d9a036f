// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hookline webhook pipeline.

use thiserror::Error;

/// The primary error type used across all Hookline crates.
#[derive(Debug, Error)]
pub enum HooklineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A webhook envelope that cannot be processed (missing tenant key,
    /// malformed payload, unparseable JSON).
    #[error("invalid envelope: {0}")]
    Envelope(String),

    /// Downstream collaborator errors (setup endpoint, token refresh).
    #[error("downstream error: {message}")]
    Downstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HooklineError {
    /// True for failures worth retrying with backoff (network, timeout,
    /// storage hiccups). Envelope and config errors are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HooklineError::Storage { .. }
                | HooklineError::Downstream { .. }
                | HooklineError::Timeout { .. }
        )
    }
}
