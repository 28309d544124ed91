// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for atlas operations.

use neuroatlas_structures::AtlasDataError;

/// Result type for atlas operations
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Errors that can occur while selecting, querying or bootstrapping atlases
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("Parcellation '{parcellation}' is not supported by atlas '{atlas}'")]
    InvalidParcellation { parcellation: String, atlas: String },

    #[error("Cannot select region. The spec '{spec}' does not match any known region")]
    RegionNotFound { spec: String },

    #[error("Cannot select region. The spec '{spec}' is not unique. It matches: {}", candidates.join(", "))]
    AmbiguousRegionSpec { spec: String, candidates: Vec<String> },

    #[error("Atlas '{atlas}' does not support the requested reference space '{space}'")]
    UnsupportedSpace { space: String, atlas: String },

    #[error("No feature extractor known for modality '{modality}'. Known modalities: {}", known.join(", "))]
    UnknownModality { modality: String, known: Vec<String> },

    #[error("Modality '{modality}' is not global; select a region before querying features")]
    MissingRegionSelection { modality: String },

    #[error("Atlas '{atlas}' has no parcellation selected")]
    NoParcellationSelected { atlas: String },

    #[error("Cannot bootstrap configuration '{tag}'. Tried: {}", tried.join(", "))]
    ConfigBootstrapFailure { tag: String, tried: Vec<String> },

    #[error("Cannot construct object from '{source_name}': {reason}")]
    Construction { source_name: String, reason: String },

    #[error(transparent)]
    Data(#[from] AtlasDataError),
}

/// Failure of a single configuration source
#[derive(Debug, thiserror::Error)]
pub enum ConfigSourceError {
    #[error("Configuration source '{source_name}' is unreachable: {reason}")]
    Unreachable { source_name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
