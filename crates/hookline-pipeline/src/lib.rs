// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processing pipeline for Hookline: the dedup gate, the event router and
//! type handlers, install orchestration, and the cron drivers that drain the
//! three durable queues.

use std::sync::Arc;

use hookline_config::model::{DedupConfig, HooklineConfig, LockConfig, QueueConfig};
use hookline_core::DownstreamClient;
use hookline_storage::Database;

pub mod cron;
pub mod dedup;
pub mod downstream;
pub mod handlers;
pub mod router;

pub use downstream::HttpDownstream;

/// Shared state threaded through routing, handlers, and drivers.
#[derive(Clone)]
pub struct PipelineContext {
    pub db: Database,
    pub downstream: Arc<dyn DownstreamClient>,
    pub queue: QueueConfig,
    pub locks: LockConfig,
    pub dedup: DedupConfig,
}

impl PipelineContext {
    pub fn new(
        db: Database,
        downstream: Arc<dyn DownstreamClient>,
        config: &HooklineConfig,
    ) -> Self {
        Self {
            db,
            downstream,
            queue: config.queue.clone(),
            locks: config.locks.clone(),
            dedup: config.dedup.clone(),
        }
    }
}
