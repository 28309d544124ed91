// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Pluggable feature extraction.

Extractors are registered per modality. A query for a modality fans out to
every extractor registered for it, and each one picks the features matching
the current selection of an [`Atlas`].
*/

use ahash::AHashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::atlas::Atlas;
use crate::types::AtlasResult;

/// Extra query parameters passed through to extractors
pub type FeatureParams = serde_json::Map<String, serde_json::Value>;

/// A data feature anchored to the atlas
pub trait Feature: fmt::Debug + fmt::Display + Send + Sync {
    fn modality(&self) -> &str;

    /// Access the concrete feature type
    fn as_any(&self) -> &dyn Any;
}

/// Picks features matching an atlas selection
pub trait FeatureExtractor: Send + Sync {
    /// Modality name the extractor is registered under
    fn modality(&self) -> &str;

    /// Global features do not depend on a region selection
    fn is_global(&self) -> bool {
        false
    }

    /// # Errors
    /// Fails if the selection cannot be evaluated, e.g. because no mask is
    /// available in the extractor's space.
    fn pick_selection(&self, atlas: &Atlas, params: &FeatureParams) -> AtlasResult<Vec<Arc<dyn Feature>>>;
}

/// Extractors grouped by modality, in registration order
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    by_modality: AHashMap<String, Vec<Arc<dyn FeatureExtractor>>>,
    order: Vec<String>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Arc<dyn FeatureExtractor>) {
        let modality = extractor.modality().to_string();
        if !self.by_modality.contains_key(&modality) {
            self.order.push(modality.clone());
        }
        self.by_modality.entry(modality).or_default().push(extractor);
    }

    pub fn extractors(&self, modality: &str) -> Option<&[Arc<dyn FeatureExtractor>]> {
        self.by_modality.get(modality).map(Vec::as_slice)
    }

    /// Registered modalities, in order of first registration
    pub fn modalities(&self) -> &[String] {
        &self.order
    }

    /// A modality is global only if all of its extractors are
    pub fn is_global(&self, modality: &str) -> bool {
        self.extractors(modality)
            .is_some_and(|extractors| extractors.iter().all(|e| e.is_global()))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("modalities", &self.order)
            .finish()
    }
}
