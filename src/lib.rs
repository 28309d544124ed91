// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas
//!
//! Metadata and selection layer for neuroanatomical brain atlases. An atlas
//! bundles reference spaces and parcellations; a parcellation holds a tree of
//! brain regions. Selecting a parcellation and a region makes masks,
//! templates, region properties and spatially anchored features available.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neuroatlas = "0.1"  # Default: includes the iEEG feature extractors
//! ```
//!
//! ```rust,no_run
//! use neuroatlas::prelude::*;
//! use std::sync::Arc;
//!
//! let config = load_config(None, None)?;
//! let _guard = neuroatlas::init_logging_from_config(&config, &parse_debug_flags())?;
//!
//! let context = neuroatlas::bootstrap(&config, Arc::new(InMemoryVolumeLoader::new()))?;
//! let mut atlas = context.default_atlas()?;
//! atlas.select_region("v1")?;
//! for props in atlas.regionprops("mni152", true)? {
//!     println!("{}", props);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`features-ieeg`** (default): iEEG contact point and electrode extractors
//! - **`file-logging`**: JSON log files per run in addition to console output
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neuroatlas-config, neuroatlas-observability│
//! │  (TOML configuration, logging initialization)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Data model: neuroatlas-structures                      │
//! │  (Concepts, region trees, spaces, parcellations)        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Orchestration: neuroatlas-atlas                        │
//! │  (Selection state, bootstrap, feature dispatch)         │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Extractors: neuroatlas-features                        │
//! │  (iEEG contact points and electrodes)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

use anyhow::{Context, Result};
use std::sync::Arc;

pub use neuroatlas_atlas as atlas;
pub use neuroatlas_config as config;
pub use neuroatlas_observability as observability;
pub use neuroatlas_structures as structures;

#[cfg(feature = "features-ieeg")]
pub use neuroatlas_features as features;

use neuroatlas_atlas::AtlasContext;
use neuroatlas_config::AtlasConfig;
use neuroatlas_observability::{CrateDebugFlags, LogFormat, LoggingConfig, LoggingGuard};
use neuroatlas_structures::VolumeLoader;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::atlas::{
        Atlas, AtlasContext, AtlasError, AtlasResult, ConfigSource, DirectoryConfigSource, Feature,
        FeatureExtractor, FeatureParams, InMemoryConfigSource, RegionMatch, RegionProps, SelectionState,
    };
    pub use crate::config::{load_config, AtlasConfig};
    pub use crate::observability::{parse_debug_flags, CrateDebugFlags};
    pub use crate::structures::{
        Concept, InMemoryVolumeLoader, Parcellation, Region, RegionId, RegionSpec, Space, Volume, VolumeLoader,
    };

    #[cfg(feature = "features-ieeg")]
    pub use crate::features::{ContactPoint, Electrode, CONTACT_POINT_MODALITY, ELECTRODE_MODALITY};
}

/// Logging settings derived from the `[system]` and `[logging]` sections
pub fn logging_config(config: &AtlasConfig) -> LoggingConfig {
    let level = if config.system.debug {
        "debug".to_string()
    } else {
        config.system.log_level.clone()
    };
    LoggingConfig {
        level,
        format: LogFormat::Text,
        log_dir: config.logging.file_logging.then(|| config.logging.log_dir.clone()),
        retention_days: config.logging.retention_days,
        retention_runs: config.logging.retention_runs,
    }
}

/// Initialize logging from the loaded configuration
///
/// # Errors
/// Fails if the level is not a valid filter or a subscriber is already set.
pub fn init_logging_from_config(config: &AtlasConfig, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    neuroatlas_observability::init_logging(debug_flags, &logging_config(config))
}

/// Bootstrap a context from the configured mirrors
///
/// With `features-ieeg`, the iEEG extractors are registered as well, read
/// from the same mirror as the concept definitions. A missing contact point
/// collection only disables those modalities.
///
/// # Errors
/// Fails if no mirror provides the concept definitions or they are invalid.
pub fn bootstrap(config: &AtlasConfig, loader: Arc<dyn VolumeLoader>) -> Result<AtlasContext> {
    let sources = neuroatlas_atlas::mirror_sources(config);
    #[allow(unused_mut)]
    let mut context = AtlasContext::bootstrap(config, &sources, loader)
        .with_context(|| format!("Failed to bootstrap configuration '{}'", config.bootstrap.project_tag))?;

    #[cfg(feature = "features-ieeg")]
    {
        let pinned: Vec<_> = sources
            .into_iter()
            .filter(|source| context.config_source() == Some(source.name()))
            .collect();
        if let Err(e) = neuroatlas_features::load_and_register(&mut context, &pinned, config) {
            tracing::warn!("iEEG features are unavailable: {}", e);
        }
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_logging_config_mapping() {
        let mut config = AtlasConfig::default();
        config.system.log_level = "warn".to_string();
        let logging = logging_config(&config);
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.log_dir, None);

        config.system.debug = true;
        config.logging.file_logging = true;
        config.logging.log_dir = PathBuf::from("/tmp/atlas-logs");
        let logging = logging_config(&config);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.log_dir, Some(PathBuf::from("/tmp/atlas-logs")));
        assert_eq!(logging.retention_runs, config.logging.retention_runs);
    }
}
