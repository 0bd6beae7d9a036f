// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline and its external collaborators.

pub mod downstream;

pub use downstream::DownstreamClient;
