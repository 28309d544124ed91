// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are consistent and within valid ranges
//! before the concept registries are bootstrapped.

use crate::{AtlasConfig, ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    DuplicateMirror { name: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::DuplicateMirror { name } => {
                write!(f, "Mirror '{}' is listed more than once", name)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - At least one configuration mirror, with unique names
/// - Non-empty project tag and folder names
/// - Suffixes starting with a dot
/// - Threshold within [0, 1]
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &AtlasConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_bootstrap(config, &mut errors);
    validate_selection(config, &mut errors);
    validate_features(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_bootstrap(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    let bootstrap = &config.bootstrap;

    if bootstrap.project_tag.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "bootstrap.project_tag".to_string(),
        });
    }

    if bootstrap.mirrors.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "bootstrap.mirrors".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for mirror in &bootstrap.mirrors {
        if !seen.insert(mirror.name.as_str()) {
            errors.push(ConfigValidationError::DuplicateMirror {
                name: mirror.name.clone(),
            });
        }
    }

    for (field, value) in [
        ("bootstrap.spaces_folder", &bootstrap.spaces_folder),
        ("bootstrap.parcellations_folder", &bootstrap.parcellations_folder),
        ("bootstrap.atlases_folder", &bootstrap.atlases_folder),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }

    validate_suffix("bootstrap.suffix", &bootstrap.suffix, errors);
}

fn validate_selection(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    if let Some(threshold) = config.selection.continuous_map_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            errors.push(ConfigValidationError::InvalidValue {
                field: "selection.continuous_map_threshold".to_string(),
                reason: format!("{} is outside [0, 1]", threshold),
            });
        }
    }
}

fn validate_features(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    validate_suffix("features.ieeg_suffix", &config.features.ieeg_suffix, errors);
}

fn validate_suffix(field: &str, suffix: &str, errors: &mut Vec<ConfigValidationError>) {
    if !suffix.starts_with('.') || suffix.len() < 2 {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' must look like '.ext'", suffix),
        });
    }
}
