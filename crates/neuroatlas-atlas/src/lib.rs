// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# neuroatlas-atlas

Selection of parcellations and regions on top of the neuroatlas data model.

## Architecture

- [`AtlasContext`] holds the registries of spaces, parcellations and atlases,
  bootstrapped from configuration mirrors.
- [`Atlas`] carries the mutable selection and answers mask, template, map,
  region property and feature queries for it.
- [`FeatureExtractor`] implementations are registered per modality.
*/

pub mod atlas;
pub mod bootstrap;
mod cache;
pub mod context;
pub mod features;
pub mod regionprops;
pub mod types;

pub use atlas::{Atlas, AtlasDefinition, RegionMatch, SelectionState, DEFAULT_CACHE_CAPACITY};
pub use bootstrap::{
    build_concept, build_folder, fetch_with_failover, select_source, AtlasDescriptor, ConceptObject, ConfigFile,
    ConfigSource, DirectoryConfigSource, InMemoryConfigSource,
};
pub use context::{mirror_sources, AtlasContext, AtlasDefaults};
pub use features::{ExtractorRegistry, Feature, FeatureExtractor, FeatureParams};
pub use regionprops::RegionProps;
pub use types::{AtlasError, AtlasResult, ConfigSourceError};
