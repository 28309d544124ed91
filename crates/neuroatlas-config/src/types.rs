// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neuroatlas_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub system: SystemConfig,
    pub bootstrap: BootstrapConfig,
    pub selection: SelectionConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// System-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub debug: bool,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

/// Where concept definitions are bootstrapped from
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Revision of the concept definitions (a directory below each mirror)
    pub project_tag: String,
    /// Ordered list of configuration mirrors; the first reachable one wins
    pub mirrors: Vec<MirrorConfig>,
    pub spaces_folder: String,
    pub parcellations_folder: String,
    pub atlases_folder: String,
    /// File suffix of concept definition files
    pub suffix: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            project_tag: format!("neuroatlas-{}", crate::VERSION),
            mirrors: vec![MirrorConfig::default()],
            spaces_folder: "spaces".to_string(),
            parcellations_folder: "parcellations".to_string(),
            atlases_folder: "atlases".to_string(),
            suffix: ".json".to_string(),
        }
    }
}

/// A single configuration mirror
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub name: String,
    /// Root directory of the mirror checkout
    pub location: PathBuf,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            location: PathBuf::from("./atlas-config"),
        }
    }
}

/// Selection preferences applied to every new atlas
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Atlas key or name used when none is requested explicitly
    pub default_atlas: Option<String>,
    /// Prefer thresholded continuous maps as region masks
    pub continuous_map_threshold: Option<f32>,
}

/// Memoization of masks and templates
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of volumes kept per atlas (0 disables memoization)
    pub max_cached_volumes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cached_volumes: 32,
        }
    }
}

/// Logging output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file_logging: bool,
    pub log_dir: PathBuf,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

/// Feature extractor sources
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub ieeg_folder: String,
    pub ieeg_suffix: String,
    /// Knowledge graph dataset the contact points belong to
    pub ieeg_dataset_id: String,
    /// Space the contact point coordinates are given in
    pub ieeg_space: String,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            ieeg_folder: "ieeg_contact_points".to_string(),
            ieeg_suffix: ".pts".to_string(),
            ieeg_dataset_id: "ca952092-3013-4151-abcc-99a156fe7c83".to_string(),
            ieeg_space: "mni152".to_string(),
        }
    }
}
