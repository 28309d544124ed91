// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Brain regions and their hierarchy.

Regions of a parcellation live in a [`RegionTree`] arena. Parent and child
links are [`RegionId`] indices into that arena, so a tree is a plain owned
value without reference cycles.
*/

mod tree;

pub use tree::{Descendants, RegionTree};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::concept::{Concept, ConceptCore};
use crate::volume::BoundingBox;

/// Index of a region inside its [`RegionTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub usize);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ways of referring to a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSpec {
    /// Key, id or loose name, e.g. `"v1 left"`
    Text(String),
    /// Value of the region in a labelled map
    LabelIndex(u32),
    /// A concrete node, qualified by the id of the parcellation owning its tree
    Node { parcellation: String, region: RegionId },
}

impl RegionSpec {
    pub fn node(parcellation: impl Into<String>, region: RegionId) -> Self {
        RegionSpec::Node {
            parcellation: parcellation.into(),
            region,
        }
    }
}

impl From<&str> for RegionSpec {
    fn from(spec: &str) -> Self {
        RegionSpec::Text(spec.to_string())
    }
}

impl From<String> for RegionSpec {
    fn from(spec: String) -> Self {
        RegionSpec::Text(spec)
    }
}

impl From<&String> for RegionSpec {
    fn from(spec: &String) -> Self {
        RegionSpec::Text(spec.clone())
    }
}

impl From<u32> for RegionSpec {
    fn from(label: u32) -> Self {
        RegionSpec::LabelIndex(label)
    }
}

impl fmt::Display for RegionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionSpec::Text(text) => write!(f, "{}", text),
            RegionSpec::LabelIndex(label) => write!(f, "label {}", label),
            RegionSpec::Node { parcellation, region } => write!(f, "region {} of {}", region, parcellation),
        }
    }
}

/// A node of the region hierarchy
#[derive(Debug, Clone)]
pub struct Region {
    core: ConceptCore,
    label_index: Option<u32>,
    bounding_box: Option<BoundingBox>,
    parent: Option<RegionId>,
    children: Vec<RegionId>,
}

impl Region {
    pub fn new(core: ConceptCore, label_index: Option<u32>, bounding_box: Option<BoundingBox>) -> Self {
        Self {
            core,
            label_index,
            bounding_box,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn label_index(&self) -> Option<u32> {
        self.label_index
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    pub fn parent(&self) -> Option<RegionId> {
        self.parent
    }

    pub fn children(&self) -> &[RegionId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Test a textual or label spec against this region.
    ///
    /// Node specs are resolved by the tree, never by the region itself.
    pub fn matches_spec(&self, spec: &RegionSpec) -> bool {
        match spec {
            RegionSpec::Text(text) => self.matches(text),
            RegionSpec::LabelIndex(label) => self.label_index == Some(*label),
            RegionSpec::Node { .. } => false,
        }
    }
}

impl Concept for Region {
    fn core(&self) -> &ConceptCore {
        &self.core
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
