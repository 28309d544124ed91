// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug selection from command line flags and `NEUROATLAS_DEBUG`
//!
//! `--debug-neuroatlas-atlas` raises one crate to debug; `--debug-all` (or
//! `NEUROATLAS_DEBUG=all`) raises every crate in [`KNOWN_CRATES`].

use std::collections::BTreeSet;
use std::env;

use crate::{crate_target, KNOWN_CRATES};

const FLAG_PREFIX: &str = "--debug-";
const ENV_VAR: &str = "NEUROATLAS_DEBUG";

/// Crates whose log level is raised to debug
///
/// ```rust
/// use neuroatlas_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(["--debug-neuroatlas-atlas".to_string()]);
/// assert!(flags.is_enabled("neuroatlas-atlas"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if let Some(name) = arg.strip_prefix(FLAG_PREFIX) {
                flags.enable(name);
            }
        }
        flags
    }

    /// Add the crates named by a comma separated list (`all` selects every crate)
    pub fn extend_from_list(&mut self, list: &str) {
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            self.enable(name);
        }
    }

    fn enable(&mut self, name: &str) {
        if name == "all" {
            self.crates.extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
        } else {
            self.crates.insert(name.to_string());
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.crates.contains(crate_name)
    }

    /// EnvFilter directive such as `neuroatlas_atlas=debug,info`
    pub fn to_filter_string(&self, base_level: &str) -> String {
        self.crates
            .iter()
            .map(|name| format!("{}=debug", crate_target(name)))
            .chain(std::iter::once(base_level.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Debug flags from the process arguments merged with `NEUROATLAS_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(list) = env::var(ENV_VAR) {
        flags.extend_from_list(&list);
    }
    flags
}
