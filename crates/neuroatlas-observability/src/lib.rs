// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas-observability
//!
//! Logging initialization shared by all neuroatlas crates, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files with daily rotation and run-folder retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known neuroatlas crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neuroatlas-config",
    "neuroatlas-structures",
    "neuroatlas-atlas",
    "neuroatlas-features",
];

/// Tracing target of a crate (`neuroatlas-atlas` -> `neuroatlas_atlas`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
