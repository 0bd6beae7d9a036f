// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hookline serve` command implementation.
//!
//! Opens the SQLite store, recovers items stranded in `processing` by a
//! previous crash, wires the downstream client into the pipeline, and serves
//! the gateway until shutdown.

use std::sync::Arc;

use hookline_config::model::HooklineConfig;
use hookline_core::HooklineError;
use hookline_gateway::{start_server, GatewayState};
use hookline_pipeline::{HttpDownstream, PipelineContext};
use hookline_storage::{queries::queue, Database};
use tracing::{info, warn};

/// Runs the `hookline serve` command.
pub async fn run_serve(config: HooklineConfig) -> Result<(), HooklineError> {
    init_tracing(&config.service.log_level);

    info!("starting hookline serve");

    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;

    // Crash recovery: a previous process may have died mid-claim. Anything
    // still marked processing at boot is by definition abandoned.
    let reclaimed = queue::reclaim_stale(&db, 0).await?;
    if reclaimed > 0 {
        warn!(reclaimed, "recovered items from interrupted processing");
    }

    let downstream = Arc::new(HttpDownstream::new(&config.downstream)?);
    let ctx = PipelineContext::new(db.clone(), downstream, &config);
    let state = GatewayState::new(ctx, &config.server);

    start_server(&config.server, state).await?;

    db.close().await?;
    info!("hookline stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hookline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
