// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Datasets linked to concepts.

Dataset specifications are JSON objects tagged by `@type` (or, if absent, by
the prefix of their `@id`). They are turned into [`Dataset`] values through an
explicit builder table that maps each known type tag to a constructor.
*/

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::concept::required_str;
use crate::error::{AtlasDataError, AtlasDataResult};

/// Type tag of image volume specifications
pub const VOLUME_SOURCE_TYPE: &str = "fzj/tmp/volume_type/v0.0.1";

/// Type tag of knowledge graph dataset specifications
pub const KG_DATASET_TYPE: &str = "minds/core/dataset/v1.0.0";

/// Kind of values stored in an image volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    /// Integer label indices, one per region
    Labelled,
    /// Probabilities or other continuous values for a single region
    Continuous,
    /// Reference template of a space
    Template,
}

/// An image volume available from some url
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSource {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
    pub url: String,
    /// Storage format, e.g. `nii` or `neuroglancer/precomputed`
    pub volume_type: String,
    #[serde(default = "default_map_type")]
    pub map_type: MapType,
    /// Id of the space the volume is defined in
    pub space_id: String,
}

fn default_map_type() -> MapType {
    MapType::Labelled
}

impl VolumeSource {
    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        Ok(serde_json::from_value(spec.clone())?)
    }
}

/// Metadata-only dataset from the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraphDataset {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl KnowledgeGraphDataset {
    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        let id = required_str(spec, "@id")?;
        Ok(Self {
            id: id.rsplit('/').next().unwrap_or(id).to_string(),
            name: required_str(spec, "name")?.to_string(),
            description: spec
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// A dataset linked to a concept
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    VolumeSource(VolumeSource),
    KnowledgeGraph(KnowledgeGraphDataset),
}

impl Dataset {
    pub fn is_image_volume(&self) -> bool {
        matches!(self, Dataset::VolumeSource(_))
    }

    pub fn as_volume_source(&self) -> Option<&VolumeSource> {
        match self {
            Dataset::VolumeSource(v) => Some(v),
            Dataset::KnowledgeGraph(_) => None,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::VolumeSource(v) => write!(f, "{} ({}, {:?})", v.name, v.volume_type, v.map_type),
            Dataset::KnowledgeGraph(d) => write!(f, "{}", d.name),
        }
    }
}

type DatasetBuilder = fn(&Value) -> AtlasDataResult<Dataset>;

/// Type tag -> constructor, populated once before any dataset is built
static DATASET_BUILDERS: Lazy<AHashMap<&'static str, DatasetBuilder>> = Lazy::new(|| {
    let mut builders: AHashMap<&'static str, DatasetBuilder> = AHashMap::new();
    builders.insert(VOLUME_SOURCE_TYPE, |spec| {
        VolumeSource::from_json(spec).map(Dataset::VolumeSource)
    });
    builders.insert(KG_DATASET_TYPE, |spec| {
        KnowledgeGraphDataset::from_json(spec).map(Dataset::KnowledgeGraph)
    });
    builders
});

/// Extract the type tag of a specification
///
/// `@type` wins; otherwise the `@id` up to its last `/` is used, so
/// `minds/core/dataset/v1.0.0/3f8e` yields `minds/core/dataset/v1.0.0`.
pub fn extract_type_id(spec: &Value) -> Option<&str> {
    if let Some(type_id) = spec.get("@type").and_then(Value::as_str) {
        return Some(type_id);
    }
    spec.get("@id")
        .and_then(Value::as_str)
        .and_then(|id| id.rsplit_once('/'))
        .map(|(prefix, _)| prefix)
}

/// Build a dataset from its specification using the builder table
///
/// # Errors
/// `UnknownType` if the type tag has no builder, `DeserializationError` if the
/// specification does not fit the builder.
pub fn build_dataset(spec: &Value) -> AtlasDataResult<Dataset> {
    let type_id = extract_type_id(spec).unwrap_or_default();
    match DATASET_BUILDERS.get(type_id) {
        Some(builder) => builder(spec),
        None => {
            let mut candidates: Vec<String> =
                DATASET_BUILDERS.keys().map(|k| k.to_string()).collect();
            candidates.sort();
            Err(AtlasDataError::UnknownType {
                type_id: format!("{} (specification: {})", type_id, spec),
                candidates,
            })
        }
    }
}
