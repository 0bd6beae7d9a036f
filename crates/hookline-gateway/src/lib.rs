// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for Hookline: bearer-guarded webhook intake, scheduler-
//! triggered cron endpoints, and an unauthenticated health probe.

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
