// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
RegionTree - arena holding the region hierarchy of one parcellation.

The root node represents the parcellation as a whole. Every other node has
exactly one parent; children keep the order of their definition.
*/

use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use tracing::debug;

use super::{Region, RegionId, RegionSpec};
use crate::concept::{create_key, dataset_specs, Concept, ConceptCore};
use crate::error::{AtlasDataError, AtlasDataResult};
use crate::volume::BoundingBox;

/// Arena of regions with index links
#[derive(Debug, Clone)]
pub struct RegionTree {
    nodes: Vec<Region>,
    /// Region key -> node, first definition wins
    by_key: AHashMap<String, RegionId>,
}

impl RegionTree {
    /// Create a tree with only a root node
    pub fn new(root: Region) -> Self {
        let mut by_key = AHashMap::new();
        by_key.insert(root.key().to_string(), RegionId(0));
        Self {
            nodes: vec![root],
            by_key,
        }
    }

    /// Build a tree from nested region specifications
    ///
    /// Each specification needs a `name` and may carry `@id`, `labelIndex`,
    /// `boundingBox` (two opposite corners), `datasets` and nested
    /// `children`. Regions without `@id` are identified by their key.
    ///
    /// # Errors
    /// Returns `DeserializationError` for malformed specifications.
    pub fn from_json(root: ConceptCore, regions: &[Value]) -> AtlasDataResult<Self> {
        let mut tree = Self::new(Region::new(root, None, None));
        let root_id = tree.root();
        for spec in regions {
            tree.add_from_json(root_id, spec)?;
        }
        debug!(
            parcellation = %tree.get(root_id).name(),
            "Built region tree with {} regions",
            tree.len()
        );
        Ok(tree)
    }

    fn add_from_json(&mut self, parent: RegionId, spec: &Value) -> AtlasDataResult<RegionId> {
        let name = spec.get("name").and_then(Value::as_str).ok_or_else(|| {
            AtlasDataError::DeserializationError(format!(
                "region specification without name: {}",
                spec
            ))
        })?;
        let id = spec
            .get("@id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| create_key(name));

        let region = Region::new(
            ConceptCore::new(id, name, dataset_specs(spec)),
            parse_label_index(spec)?,
            parse_bounding_box(spec)?,
        );
        let node = self.add_child(parent, region)?;

        if let Some(children) = spec.get("children").and_then(Value::as_array) {
            for child in children {
                self.add_from_json(node, child)?;
            }
        }
        Ok(node)
    }

    /// Append `region` as last child of `parent`
    ///
    /// # Errors
    /// Returns `NotFound` if `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: RegionId, mut region: Region) -> AtlasDataResult<RegionId> {
        if !self.contains(parent) {
            return Err(AtlasDataError::NotFound {
                kind: "region",
                spec: parent.to_string(),
            });
        }
        let id = RegionId(self.nodes.len());
        region.parent = Some(parent);
        region.children.clear();
        self.by_key.entry(region.key().to_string()).or_insert(id);
        self.nodes.push(region);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn root(&self) -> RegionId {
        RegionId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, id: RegionId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Region at `id`
    ///
    /// # Panics
    /// If `id` does not belong to this tree. Use [`RegionTree::try_get`] for
    /// ids of unknown origin.
    pub fn get(&self, id: RegionId) -> &Region {
        &self.nodes[id.0]
    }

    pub fn try_get(&self, id: RegionId) -> Option<&Region> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: RegionId) -> Option<RegionId> {
        self.try_get(id).and_then(Region::parent)
    }

    pub fn children(&self, id: RegionId) -> &[RegionId] {
        self.try_get(id).map(Region::children).unwrap_or_default()
    }

    /// Node registered under a region key
    pub fn by_key(&self, key: &str) -> Option<RegionId> {
        self.by_key.get(key).copied()
    }

    /// Keys of all regions, in pre-order
    pub fn region_names(&self) -> Vec<&str> {
        self.subtree(self.root())
            .map(|id| self.get(id).key())
            .collect()
    }

    /// Pre-order traversal of `id` and everything below it
    ///
    /// Each call starts a fresh traversal.
    pub fn subtree(&self, id: RegionId) -> Descendants<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// Pre-order traversal of everything strictly below `id`
    pub fn descendants(&self, id: RegionId) -> Descendants<'_> {
        let stack = self.children(id).iter().rev().copied().collect();
        Descendants { tree: self, stack }
    }

    /// Nodes from `id` up to the root, `id` first
    pub fn ancestors(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), |&current| {
            self.parent(current)
        })
    }

    /// True iff `other` is `region` itself or one of its descendants
    pub fn includes(&self, region: RegionId, other: RegionId) -> bool {
        self.ancestors(other).any(|id| id == region)
    }

    /// Label indices of `id` and all of its descendants
    pub fn label_indices(&self, id: RegionId) -> AHashSet<u32> {
        self.subtree(id)
            .filter_map(|node| self.get(node).label_index())
            .collect()
    }

    // parcellation ownership of node specs is checked by the caller
    fn matches(&self, id: RegionId, spec: &RegionSpec) -> bool {
        match spec {
            RegionSpec::Node { region, .. } => *region == id,
            _ => self.get(id).matches_spec(spec),
        }
    }

    /// Search the subtree below `start` (inclusive) in pre-order
    ///
    /// With `select_uppermost`, a matching node whose descendants all match
    /// as well is reported alone.
    pub fn find(&self, start: RegionId, spec: &RegionSpec, select_uppermost: bool) -> Vec<RegionId> {
        let mut result = Vec::new();
        if self.contains(start) {
            self.collect_matches(start, spec, select_uppermost, &mut result);
        }
        result
    }

    /// Returns whether the whole subtree of `id` matches
    fn collect_matches(
        &self,
        id: RegionId,
        spec: &RegionSpec,
        select_uppermost: bool,
        result: &mut Vec<RegionId>,
    ) -> bool {
        let start = result.len();
        let node_matches = self.matches(id, spec);
        if node_matches {
            result.push(id);
        }

        let mut all_children_match = true;
        for &child in self.children(id) {
            all_children_match &= self.collect_matches(child, spec, select_uppermost, result);
        }

        let subtree_matches = node_matches && all_children_match;
        if select_uppermost && subtree_matches {
            result.truncate(start + 1);
        }
        subtree_matches
    }
}

/// Lazy pre-order walk over a region subtree
pub struct Descendants<'a> {
    tree: &'a RegionTree,
    stack: Vec<RegionId>,
}

impl Iterator for Descendants<'_> {
    type Item = RegionId;

    fn next(&mut self) -> Option<RegionId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

fn parse_label_index(spec: &Value) -> AtlasDataResult<Option<u32>> {
    let label = match spec.get("labelIndex") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    label
        .and_then(|l| u32::try_from(l).ok())
        .map(Some)
        .ok_or_else(|| {
            AtlasDataError::DeserializationError(format!(
                "invalid labelIndex in region specification {}",
                spec
            ))
        })
}

fn parse_bounding_box(spec: &Value) -> AtlasDataResult<Option<BoundingBox>> {
    match spec.get("boundingBox") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let corners: [[f64; 3]; 2] = serde_json::from_value(value.clone())?;
            Ok(Some(BoundingBox::from_corners(corners[0], corners[1])))
        }
    }
}
