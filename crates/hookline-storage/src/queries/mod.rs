// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per storage concern.

pub mod appointments;
pub mod contacts;
pub mod conversations;
pub mod dedup;
pub mod events;
pub mod locks;
pub mod queue;
pub mod tenants;
