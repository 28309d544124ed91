// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
AtlasContext - registries of all bootstrapped concepts.

The context is built once at startup, either programmatically or from
configuration mirrors, and is read-only afterwards. Atlases handed out by the
context share its spaces, parcellations, volume loader and extractors.
*/

use neuroatlas_config::AtlasConfig;
use neuroatlas_structures::{Concept, Parcellation, Registry, Space, VolumeLoader};
use std::sync::Arc;
use tracing::{info, warn};

use crate::atlas::{Atlas, AtlasDefinition, DEFAULT_CACHE_CAPACITY};
use crate::bootstrap::{
    build_folder, load_folder, select_source, AtlasDescriptor, ConceptObject, ConfigSource, DirectoryConfigSource,
};
use crate::features::{ExtractorRegistry, FeatureExtractor};
use crate::types::{AtlasError, AtlasResult};

/// Preferences applied to atlases created by a context
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasDefaults {
    pub default_atlas: Option<String>,
    pub continuous_map_threshold: Option<f32>,
    pub cache_capacity: usize,
}

impl Default for AtlasDefaults {
    fn default() -> Self {
        Self {
            default_atlas: None,
            continuous_map_threshold: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl From<&AtlasConfig> for AtlasDefaults {
    fn from(config: &AtlasConfig) -> Self {
        Self {
            default_atlas: config.selection.default_atlas.clone(),
            continuous_map_threshold: config.selection.continuous_map_threshold,
            cache_capacity: config.cache.max_cached_volumes,
        }
    }
}

/// All registries plus the shared collaborators
pub struct AtlasContext {
    spaces: Registry<Space>,
    parcellations: Arc<Registry<Parcellation>>,
    atlases: Registry<AtlasDefinition>,
    loader: Arc<dyn VolumeLoader>,
    extractors: Arc<ExtractorRegistry>,
    defaults: AtlasDefaults,
    config_source: Option<String>,
}

impl AtlasContext {
    /// Empty context
    pub fn new(loader: Arc<dyn VolumeLoader>) -> Self {
        Self {
            spaces: Registry::new("space"),
            parcellations: Arc::new(Registry::new("parcellation")),
            atlases: Registry::new("atlas"),
            loader,
            extractors: Arc::new(ExtractorRegistry::new()),
            defaults: AtlasDefaults::default(),
            config_source: None,
        }
    }

    pub fn with_defaults(mut self, defaults: AtlasDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Bootstrap from the mirrors listed in the configuration, in order
    pub fn from_config(config: &AtlasConfig, loader: Arc<dyn VolumeLoader>) -> AtlasResult<Self> {
        let sources = mirror_sources(config);
        Self::bootstrap(config, &sources, loader)
    }

    /// Bootstrap spaces, then parcellations, then atlases from `sources`
    ///
    /// The first source serving the spaces folder is pinned; the remaining
    /// folders are only read from it.
    ///
    /// # Errors
    /// `ConfigBootstrapFailure` if no source is reachable or the pinned
    /// source lacks a folder, `Construction` for
    /// malformed definitions, definitions in the wrong folder and atlases
    /// referring to unknown ids.
    pub fn bootstrap(
        config: &AtlasConfig,
        sources: &[Box<dyn ConfigSource>],
        loader: Arc<dyn VolumeLoader>,
    ) -> AtlasResult<Self> {
        let bootstrap = &config.bootstrap;
        let tag = bootstrap.project_tag.as_str();
        let suffix = bootstrap.suffix.as_str();
        let mut context = Self::new(loader).with_defaults(AtlasDefaults::from(config));

        let (index, space_files) = select_source(sources, &bootstrap.spaces_folder, suffix, tag)?;
        let pinned = &sources[index..=index];
        info!(tag = %tag, "Using configuration source '{}'", pinned[0].name());
        context.config_source = Some(pinned[0].name().to_string());

        for object in build_folder(&bootstrap.spaces_folder, &space_files)? {
            match object {
                ConceptObject::Space(space) => {
                    context.add_space(space);
                }
                other => return Err(misplaced(&bootstrap.spaces_folder, &other)),
            }
        }

        for object in load_folder(pinned, &bootstrap.parcellations_folder, suffix, tag)? {
            match object {
                ConceptObject::Parcellation(parcellation) => {
                    context.add_parcellation(parcellation);
                }
                other => return Err(misplaced(&bootstrap.parcellations_folder, &other)),
            }
        }

        for object in load_folder(pinned, &bootstrap.atlases_folder, suffix, tag)? {
            match object {
                ConceptObject::Atlas(descriptor) => {
                    context.add_atlas(descriptor)?;
                }
                other => return Err(misplaced(&bootstrap.atlases_folder, &other)),
            }
        }

        info!(
            tag = %tag,
            "Bootstrapped {} spaces, {} parcellations and {} atlases",
            context.spaces.len(),
            context.parcellations.len(),
            context.atlases.len()
        );
        Ok(context)
    }

    pub fn add_space(&mut self, space: Space) -> Arc<Space> {
        self.spaces.add(space)
    }

    pub fn add_parcellation(&mut self, parcellation: Parcellation) -> Arc<Parcellation> {
        Arc::make_mut(&mut self.parcellations).add(parcellation)
    }

    /// Register an atlas, resolving its space and parcellation ids
    ///
    /// # Errors
    /// `Construction` if an id is unknown to this context.
    pub fn add_atlas(&mut self, descriptor: AtlasDescriptor) -> AtlasResult<Arc<AtlasDefinition>> {
        let name = descriptor.core.name().to_string();
        let spaces = descriptor
            .space_ids
            .iter()
            .map(|id| resolve_id(&self.spaces, id, &name))
            .collect::<AtlasResult<Vec<_>>>()?;
        let parcellations = descriptor
            .parcellation_ids
            .iter()
            .map(|id| resolve_id(&*self.parcellations, id, &name))
            .collect::<AtlasResult<Vec<_>>>()?;
        Ok(self
            .atlases
            .add(AtlasDefinition::new(descriptor.core, spaces, parcellations)))
    }

    /// Add an extractor; atlases created afterwards can query its modality
    pub fn register_extractor(&mut self, extractor: Arc<dyn FeatureExtractor>) {
        Arc::make_mut(&mut self.extractors).register(extractor);
    }

    pub fn spaces(&self) -> &Registry<Space> {
        &self.spaces
    }

    pub fn parcellations(&self) -> &Registry<Parcellation> {
        &self.parcellations
    }

    pub fn atlases(&self) -> &Registry<AtlasDefinition> {
        &self.atlases
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    pub fn loader(&self) -> &Arc<dyn VolumeLoader> {
        &self.loader
    }

    pub fn defaults(&self) -> &AtlasDefaults {
        &self.defaults
    }

    /// Name of the source the concept definitions were read from
    pub fn config_source(&self) -> Option<&str> {
        self.config_source.as_deref()
    }

    /// Create an atlas with its first parcellation selected
    ///
    /// # Errors
    /// Registry lookup errors if `spec` matches no or several atlases.
    pub fn atlas(&self, spec: &str) -> AtlasResult<Atlas> {
        let definition = self.atlases.get(spec)?;
        let first_parcellation = definition.parcellations().iter().next().map(|p| p.id().to_string());

        let mut atlas = Atlas::new(
            definition,
            Arc::clone(&self.loader),
            Arc::clone(&self.extractors),
            self.defaults.cache_capacity,
        )
        .with_known_parcellations(Arc::clone(&self.parcellations));
        if let Some(threshold) = self.defaults.continuous_map_threshold {
            atlas.enable_continuous_map_thresholding(threshold);
        }
        match first_parcellation {
            Some(id) => atlas.select_parcellation(&id)?,
            None => warn!("Atlas '{}' has no parcellations", atlas.name()),
        }
        Ok(atlas)
    }

    /// The configured default atlas, or the first one registered
    pub fn default_atlas(&self) -> AtlasResult<Atlas> {
        match &self.defaults.default_atlas {
            Some(spec) => self.atlas(spec),
            None => {
                let key = self
                    .atlases
                    .keys()
                    .next()
                    .map(str::to_string)
                    .ok_or_else(|| AtlasError::Construction {
                        source_name: "atlases".to_string(),
                        reason: "no atlas has been registered".to_string(),
                    })?;
                self.atlas(&key)
            }
        }
    }
}

/// One directory source per configured mirror, in order
pub fn mirror_sources(config: &AtlasConfig) -> Vec<Box<dyn ConfigSource>> {
    config
        .bootstrap
        .mirrors
        .iter()
        .map(|mirror| {
            Box::new(DirectoryConfigSource::new(
                mirror.name.clone(),
                mirror.location.clone(),
                config.bootstrap.project_tag.clone(),
            )) as Box<dyn ConfigSource>
        })
        .collect()
}

fn resolve_id<T: Concept>(registry: &Registry<T>, id: &str, atlas: &str) -> AtlasResult<Arc<T>> {
    registry
        .iter()
        .find(|item| item.id() == id)
        .cloned()
        .ok_or_else(|| AtlasError::Construction {
            source_name: atlas.to_string(),
            reason: format!("unknown {} id '{}'", registry.kind(), id),
        })
}

fn misplaced(folder: &str, object: &ConceptObject) -> AtlasError {
    AtlasError::Construction {
        source_name: folder.to_string(),
        reason: format!("found a {} definition in folder '{}'", object.kind(), folder),
    }
}
