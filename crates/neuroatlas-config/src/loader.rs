// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AtlasConfig, ConfigError, ConfigResult, MirrorConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "neuroatlas_configuration.toml";

/// Find the neuroatlas configuration file
///
/// Search order:
/// 1. `NEUROATLAS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neuroatlas_configuration.toml`
/// 3. Parent directories (searches up to 5 levels)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROATLAS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by NEUROATLAS_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "neuroatlas configuration file '{}' not found in any of these locations:\n{}\n\nSet NEUROATLAS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AtlasConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AtlasConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROATLAS_LOG_LEVEL` -> `system.log_level`
/// - `NEUROATLAS_CONFIG_PROJECT_TAG` -> `bootstrap.project_tag`
/// - `NEUROATLAS_CONFIG_DIR` -> prepended to `bootstrap.mirrors`
/// - `NEUROATLAS_DEFAULT_ATLAS` -> `selection.default_atlas`
/// - `NEUROATLAS_CONTINUOUS_MAP_THRESHOLD` -> `selection.continuous_map_threshold`
pub fn apply_environment_overrides(config: &mut AtlasConfig) {
    if let Ok(value) = env::var("NEUROATLAS_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("NEUROATLAS_CONFIG_PROJECT_TAG") {
        config.bootstrap.project_tag = value;
    }
    if let Ok(value) = env::var("NEUROATLAS_CONFIG_DIR") {
        prepend_mirror(config, "env", value);
    }
    if let Ok(value) = env::var("NEUROATLAS_DEFAULT_ATLAS") {
        config.selection.default_atlas = Some(value);
    }
    if let Ok(value) = env::var("NEUROATLAS_CONTINUOUS_MAP_THRESHOLD") {
        if let Ok(threshold) = value.parse::<f32>() {
            config.selection.continuous_map_threshold = Some(threshold);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"project_tag": "v1.2", "log_level": "debug"}`)
pub fn apply_cli_overrides(config: &mut AtlasConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("debug") {
        config.system.debug = value.to_lowercase() == "true" || value == "1";
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("project_tag") {
        config.bootstrap.project_tag = value.clone();
    }
    if let Some(value) = cli_args.get("config_dir") {
        prepend_mirror(config, "cli", value.clone());
    }
    if let Some(value) = cli_args.get("default_atlas") {
        config.selection.default_atlas = Some(value.clone());
    }
    if let Some(value) = cli_args.get("threshold") {
        if let Ok(threshold) = value.parse::<f32>() {
            config.selection.continuous_map_threshold = Some(threshold);
        }
    }
}

fn prepend_mirror(config: &mut AtlasConfig, name: &str, location: String) {
    config.bootstrap.mirrors.insert(
        0,
        MirrorConfig {
            name: name.to_string(),
            location: PathBuf::from(location),
        },
    );
}
