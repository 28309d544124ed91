// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for feature loading.

use neuroatlas_atlas::AtlasError;

/// Result type for feature loading
pub type FeatureResult<T> = Result<T, FeatureError>;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Malformed points file '{file}' at line {line}: {reason}")]
    MalformedPoints { file: String, line: usize, reason: String },

    #[error("Contact point '{contact}' is already registered to electrode '{electrode}' of subject '{subject}'")]
    DuplicateContactPoint {
        subject: String,
        electrode: String,
        contact: String,
    },

    #[error(transparent)]
    Atlas(#[from] AtlasError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message() {
        let err = FeatureError::DuplicateContactPoint {
            subject: "sub01".to_string(),
            electrode: "A".to_string(),
            contact: "3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Contact point '3' is already registered to electrode 'A' of subject 'sub01'"
        );
    }
}
