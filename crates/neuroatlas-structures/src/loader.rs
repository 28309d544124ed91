// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Access to image data behind volume sources.

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::datasets::VolumeSource;
use crate::error::{AtlasDataError, AtlasDataResult};
use crate::volume::Volume;

/// Fetches and decodes the image behind a [`VolumeSource`]
///
/// Implementations decide how `resolution` (in physical units per voxel) is
/// honored and whether `force` bypasses any local caching.
pub trait VolumeLoader: Send + Sync {
    /// # Errors
    /// `VolumeLoadError` if the image cannot be provided.
    fn load(&self, source: &VolumeSource, resolution: Option<f64>, force: bool) -> AtlasDataResult<Volume>;
}

/// Loader serving pre-decoded volumes by url
#[derive(Debug, Default)]
pub struct InMemoryVolumeLoader {
    volumes: RwLock<AHashMap<String, Volume>>,
}

impl InMemoryVolumeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the volume served for `url`
    pub fn insert(&self, url: impl Into<String>, volume: Volume) {
        self.volumes.write().insert(url.into(), volume);
    }

    pub fn with_volume(self, url: impl Into<String>, volume: Volume) -> Self {
        self.insert(url, volume);
        self
    }

    pub fn len(&self) -> usize {
        self.volumes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.read().is_empty()
    }
}

impl VolumeLoader for InMemoryVolumeLoader {
    fn load(&self, source: &VolumeSource, resolution: Option<f64>, _force: bool) -> AtlasDataResult<Volume> {
        let volumes = self.volumes.read();
        let volume = volumes.get(&source.url).ok_or_else(|| {
            AtlasDataError::VolumeLoadError(format!(
                "no volume registered for '{}' ({})",
                source.name, source.url
            ))
        })?;
        if let Some(resolution) = resolution {
            let native = volume.affine().voxel_volume().cbrt();
            if (native - resolution).abs() > 1e-6 {
                debug!(
                    url = %source.url,
                    "Requested resolution {} differs from native {}; serving native volume",
                    resolution,
                    native
                );
            }
        }
        Ok(volume.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::MapType;
    use crate::volume::Affine;
    use ndarray::Array3;

    fn source(url: &str) -> VolumeSource {
        VolumeSource {
            id: "t".to_string(),
            name: "template".to_string(),
            url: url.to_string(),
            volume_type: "nii".to_string(),
            map_type: MapType::Template,
            space_id: "mni152".to_string(),
        }
    }

    #[test]
    fn test_load_registered_volume() {
        let volume = Volume::new(Array3::ones((2, 2, 2)), Affine::identity());
        let loader = InMemoryVolumeLoader::new().with_volume("mem://t", volume.clone());
        assert_eq!(loader.load(&source("mem://t"), Some(1.0), false).unwrap(), volume);
    }

    #[test]
    fn test_missing_volume_is_load_error() {
        let loader = InMemoryVolumeLoader::new();
        let err = loader.load(&source("mem://missing"), None, true).unwrap_err();
        assert!(matches!(err, AtlasDataError::VolumeLoadError(_)));
    }
}
