// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Parcellations: region hierarchies with their maps.

A parcellation owns one [`RegionTree`] whose root stands for the parcellation
itself, plus the labelled maps that assign voxels to label indices in each
supported space.
*/

use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::concept::{Concept, ConceptCore};
use crate::datasets::MapType;
use crate::error::{AtlasDataError, AtlasDataResult};
use crate::loader::VolumeLoader;
use crate::regions::{Region, RegionId, RegionSpec, RegionTree};
use crate::space::Space;
use crate::volume::Volume;

/// A named collection of regions plus map retrieval
#[derive(Debug, Clone)]
pub struct Parcellation {
    core: ConceptCore,
    version: Option<String>,
    tree: RegionTree,
}

impl Parcellation {
    pub fn new(core: ConceptCore, version: Option<String>, tree: RegionTree) -> Self {
        Self {
            core,
            version,
            tree,
        }
    }

    /// Read a parcellation with its nested `regions` from JSON
    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        let core = ConceptCore::from_json(spec)?;
        let root = ConceptCore::new(core.id(), core.name(), Vec::new());
        let regions = spec
            .get("regions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let tree = RegionTree::from_json(root, regions)?;
        let version = spec.get("version").and_then(Value::as_str).map(str::to_string);
        Ok(Self::new(core, version, tree))
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn regions(&self) -> &RegionTree {
        &self.tree
    }

    pub fn root(&self) -> RegionId {
        self.tree.root()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.tree.try_get(id)
    }

    /// Keys of all regions of this parcellation, in pre-order
    pub fn region_names(&self) -> Vec<&str> {
        self.tree.region_names()
    }

    /// Search the whole hierarchy, reporting every matching node
    ///
    /// Node specs of other parcellations never match.
    pub fn find(&self, spec: &RegionSpec) -> Vec<RegionId> {
        if !self.owns(spec) {
            return Vec::new();
        }
        self.tree.find(self.tree.root(), spec, false)
    }

    /// Node spec for a region of this parcellation
    pub fn node(&self, region: RegionId) -> RegionSpec {
        RegionSpec::node(self.id(), region)
    }

    /// False only for node specs qualified with another parcellation's id
    pub fn owns(&self, spec: &RegionSpec) -> bool {
        match spec {
            RegionSpec::Node { parcellation, .. } => parcellation == self.id(),
            _ => true,
        }
    }

    /// True if this parcellation has at least one labelled map in `space`
    pub fn supports_space(&self, space: &Space) -> AtlasDataResult<bool> {
        Ok(self
            .get_volume_src(space.id())?
            .iter()
            .any(|s| s.map_type == MapType::Labelled))
    }

    /// Labelled maps of this parcellation in `space`
    ///
    /// # Errors
    /// `NotAvailable` if no map exists for the space, or loader errors.
    pub fn get_maps(
        &self,
        space: &Space,
        loader: &dyn VolumeLoader,
        resolution: Option<f64>,
        force: bool,
    ) -> AtlasDataResult<Vec<Volume>> {
        let sources: Vec<_> = self
            .get_volume_src(space.id())?
            .into_iter()
            .filter(|s| s.map_type == MapType::Labelled)
            .collect();
        if sources.is_empty() {
            return Err(AtlasDataError::NotAvailable(format!(
                "parcellation '{}' provides no maps in space '{}'",
                self.name(),
                space.name()
            )));
        }
        sources
            .into_iter()
            .map(|source| loader.load(source, resolution, force))
            .collect()
    }

    /// Binary mask of `region` (including its subtree) in `space`
    ///
    /// With `try_threshold`, a continuous map attached to the region itself is
    /// thresholded if available. Otherwise the labelled maps are restricted to
    /// the label indices found in the subtree. A subtree without label
    /// indices yields an empty mask on the labelled map grid.
    ///
    /// # Errors
    /// `NotFound` for regions outside this tree, `NotAvailable` if the
    /// parcellation has no labelled map in the space.
    pub fn get_regionmask(
        &self,
        space: &Space,
        region: RegionId,
        try_threshold: Option<f32>,
        loader: &dyn VolumeLoader,
        resolution: Option<f64>,
        force: bool,
    ) -> AtlasDataResult<Volume> {
        let node = self.tree.try_get(region).ok_or_else(|| AtlasDataError::NotFound {
            kind: "region",
            spec: region.to_string(),
        })?;

        if let Some(threshold) = try_threshold {
            let continuous = node
                .get_volume_src(space.id())?
                .into_iter()
                .find(|s| s.map_type == MapType::Continuous);
            if let Some(source) = continuous {
                debug!(
                    region = %node.name(),
                    "Thresholding continuous map '{}' at {}",
                    source.name,
                    threshold
                );
                return Ok(loader.load(source, resolution, force)?.threshold(threshold));
            }
            debug!(
                region = %node.name(),
                "No continuous map in space '{}'; falling back to labelled maps",
                space.name()
            );
        }

        let labels = self.tree.label_indices(region);
        if labels.is_empty() {
            debug!(region = %node.name(), "No label indices below region; mask is empty");
        }

        let mut mask: Option<Volume> = None;
        for map in self.get_maps(space, loader, resolution, force)? {
            let selected = map.select_labels(&labels);
            mask = Some(match mask {
                Some(previous) => previous.union(&selected)?,
                None => selected,
            });
        }
        mask.ok_or_else(|| {
            AtlasDataError::InternalError("labelled maps disappeared while masking".to_string())
        })
    }
}

impl Concept for Parcellation {
    fn core(&self) -> &ConceptCore {
        &self.core
    }
}

impl fmt::Display for Parcellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} ({})", self.name(), version),
            None => write!(f, "{}", self.name()),
        }
    }
}
