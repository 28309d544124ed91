// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reference spaces.

use serde_json::Value;
use std::fmt;

use crate::concept::{Concept, ConceptCore};
use crate::datasets::MapType;
use crate::error::AtlasDataResult;
use crate::loader::VolumeLoader;
use crate::volume::Volume;

/// A coordinate reference frame with its template images
#[derive(Debug, Clone)]
pub struct Space {
    core: ConceptCore,
}

impl Space {
    pub fn new(core: ConceptCore) -> Self {
        Self { core }
    }

    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        Ok(Self::new(ConceptCore::from_json(spec)?))
    }

    /// Template image of this space
    ///
    /// Returns `Ok(None)` if the space does not define a template volume.
    ///
    /// # Errors
    /// Fails if the dataset specifications are invalid or the loader fails.
    pub fn get_template(
        &self,
        loader: &dyn VolumeLoader,
        resolution: Option<f64>,
        force: bool,
    ) -> AtlasDataResult<Option<Volume>> {
        let sources = self.get_volume_src(self.id())?;
        match sources.into_iter().find(|s| s.map_type == MapType::Template) {
            Some(source) => Ok(Some(loader.load(source, resolution, force)?)),
            None => Ok(None),
        }
    }
}

impl Concept for Space {
    fn core(&self) -> &ConceptCore {
        &self.core
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
