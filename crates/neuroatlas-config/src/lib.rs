// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas Configuration System
//!
//! Type-safe configuration loader for neuroatlas with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neuroatlas_config::{load_config, AtlasConfig};
//!
//! // Load configuration with automatic file discovery and overrides
//! let config = load_config(None, None).expect("Failed to load config");
//!
//! println!("Config tag: {}", config.bootstrap.project_tag);
//! for mirror in &config.bootstrap.mirrors {
//!     println!("Mirror: {} ({})", mirror.name, mirror.location.display());
//! }
//! ```
//!
//! The configuration tag selects which revision of the concept definitions
//! (spaces, parcellations, atlases) is bootstrapped. Mirrors are tried in the
//! order they are listed.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Re-export for convenience
pub use serde;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AtlasConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_default_project_tag_carries_version() {
        let config = AtlasConfig::default();
        assert_eq!(config.bootstrap.project_tag, format!("neuroatlas-{}", VERSION));
    }
}
