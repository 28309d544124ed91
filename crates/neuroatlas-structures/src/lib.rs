//! Core data model of neuroatlas: concepts and their matching, registries,
//! region hierarchies, parcellations, reference spaces, datasets and volumes.

pub mod concept;
pub mod datasets;
mod error;
pub mod loader;
pub mod parcellation;
pub mod regions;
pub mod registry;
pub mod space;
pub mod volume;

pub use concept::{create_key, match_name, Concept, ConceptCore};
pub use datasets::{build_dataset, Dataset, KnowledgeGraphDataset, MapType, VolumeSource};
pub use error::{AtlasDataError, AtlasDataResult};
pub use loader::{InMemoryVolumeLoader, VolumeLoader};
pub use parcellation::Parcellation;
pub use regions::{Region, RegionId, RegionSpec, RegionTree};
pub use registry::Registry;
pub use space::Space;
pub use volume::{Affine, BoundingBox, Volume};
