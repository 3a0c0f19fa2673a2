// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod classify;
pub mod completions;
pub mod config;
pub mod ingest;
pub mod scan;
