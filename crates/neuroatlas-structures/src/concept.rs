// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Shared identity and matching behavior of atlas concepts.

Atlases, parcellations, spaces and regions all carry an id, a human-readable
name and an uppercase key derived from the name. They are matched against
loose user input ("v1 left", "julich brain 2.5") by [`Concept::matches`].
*/

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use crate::datasets::{build_dataset, Dataset, VolumeSource};
use crate::error::{AtlasDataError, AtlasDataResult};

/// Create an uppercase identifier from a natural language name.
///
/// Every non-alphanumeric character becomes a separator, runs of separators
/// collapse into a single underscore, and leading/trailing separators are
/// dropped.
///
/// ```
/// use neuroatlas_structures::create_key;
///
/// assert_eq!(create_key("Area hOc1 (V1, 17, CalcS)"), "AREA_HOC1_V1_17_CALCS");
/// assert_eq!(create_key(" area  hOc1 / v1 17 calcs "), "AREA_HOC1_V1_17_CALCS");
/// ```
pub fn create_key(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Loose, case- and whitespace-insensitive name matching.
///
/// Succeeds if every space/hyphen separated token of `spec` occurs in the
/// squeezed name, or if the squeezed spec occurs in it as a whole.
pub fn match_name(name: &str, spec: &str) -> bool {
    let squeezed_name = name.to_lowercase().replace(' ', "");
    let spec = spec.to_lowercase();

    let mut tokens = spec.split([' ', '-']).filter(|w| !w.is_empty()).peekable();
    let all_tokens = tokens.peek().is_some() && tokens.all(|w| squeezed_name.contains(w));

    all_tokens || squeezed_name.contains(&spec.replace(' ', ""))
}

/// Identity, name and dataset specifications shared by all concepts.
///
/// Datasets are built lazily on first access and cached afterwards.
#[derive(Debug, Clone)]
pub struct ConceptCore {
    id: String,
    name: String,
    key: String,
    dataset_specs: Vec<Value>,
    datasets: OnceCell<Vec<Dataset>>,
}

impl ConceptCore {
    pub fn new(id: impl Into<String>, name: impl Into<String>, dataset_specs: Vec<Value>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            key: create_key(&name),
            name,
            dataset_specs,
            datasets: OnceCell::new(),
        }
    }

    /// Read `@id`, `name` and `datasets` from a JSON specification
    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        let id = required_str(spec, "@id")?;
        let name = required_str(spec, "name")?;
        Ok(Self::new(id, name, dataset_specs(spec)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn dataset_specs(&self) -> &[Value] {
        &self.dataset_specs
    }

    /// Exact key or id match first, then loose name matching
    pub fn matches(&self, spec: &str) -> bool {
        spec == self.key || spec == self.id || match_name(&self.name, spec)
    }

    fn datasets(&self) -> AtlasDataResult<&[Dataset]> {
        self.datasets
            .get_or_try_init(|| {
                self.dataset_specs
                    .iter()
                    .map(|spec| -> AtlasDataResult<Dataset> {
                        let dataset = build_dataset(spec)?;
                        debug!(concept = %self.name, "Built dataset '{}' from specification", dataset);
                        Ok(dataset)
                    })
                    .collect()
            })
            .map(Vec::as_slice)
    }
}

/// Common behavior of atlases, parcellations, spaces and regions
pub trait Concept {
    fn core(&self) -> &ConceptCore;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn key(&self) -> &str {
        self.core().key()
    }

    /// Test if `spec` matches the key, id or name of this concept
    fn matches(&self, spec: &str) -> bool {
        self.core().matches(spec)
    }

    /// Two concepts of the same kind are the same if their ids agree
    fn is_same(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.id() == other.id()
    }

    /// Datasets linked to this concept, built on first access
    ///
    /// # Errors
    /// Fails if any dataset specification has an unknown type tag or is malformed.
    fn datasets(&self) -> AtlasDataResult<&[Dataset]> {
        self.core().datasets()
    }

    /// Datasets representing image volumes
    fn volume_src(&self) -> AtlasDataResult<Vec<&VolumeSource>> {
        Ok(self
            .datasets()?
            .iter()
            .filter_map(Dataset::as_volume_source)
            .collect())
    }

    /// Image volumes defined in the space with the given id
    fn get_volume_src(&self, space_id: &str) -> AtlasDataResult<Vec<&VolumeSource>> {
        Ok(self
            .volume_src()?
            .into_iter()
            .filter(|v| v.space_id == space_id)
            .collect())
    }
}

pub(crate) fn required_str<'a>(spec: &'a Value, field: &str) -> AtlasDataResult<&'a str> {
    spec.get(field).and_then(Value::as_str).ok_or_else(|| {
        AtlasDataError::DeserializationError(format!(
            "missing string field '{}' in specification {}",
            field, spec
        ))
    })
}

pub(crate) fn dataset_specs(spec: &Value) -> Vec<Value> {
    spec.get("datasets")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
