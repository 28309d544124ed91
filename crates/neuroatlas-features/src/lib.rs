// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# neuroatlas-features

Reference feature extractors for intracranial EEG recordings.

- [`parse_points`] reads `.pts` contact point files.
- [`Electrode`] and [`ContactPoint`] are the features handed out by atlases.
- [`IeegContactPointExtractor`] and [`IeegElectrodeExtractor`] select them
  spatially for the current region of an atlas.

```no_run
use neuroatlas_atlas::{mirror_sources, AtlasContext};
use neuroatlas_config::AtlasConfig;
use neuroatlas_features::load_and_register;
use neuroatlas_structures::InMemoryVolumeLoader;
use std::sync::Arc;

let config = AtlasConfig::default();
let mut context = AtlasContext::from_config(&config, Arc::new(InMemoryVolumeLoader::new())).unwrap();
load_and_register(&mut context, &mirror_sources(&config), &config).unwrap();
```
*/

pub mod electrode;
pub mod error;
pub mod extractor;
pub mod pts;

pub use electrode::{ContactPoint, ContactPoints, Electrode, CONTACT_POINT_MODALITY, ELECTRODE_MODALITY};
pub use error::{FeatureError, FeatureResult};
pub use extractor::{register_ieeg_extractors, IeegContactPointExtractor, IeegDataset, IeegElectrodeExtractor};
pub use pts::{parse_points, subject_id, ElectrodePoints, PointsFile};

use neuroatlas_atlas::{AtlasContext, ConfigSource};
use neuroatlas_config::AtlasConfig;
use std::sync::Arc;

/// Load the iEEG dataset from `sources` and register both extractors
pub fn load_and_register(
    context: &mut AtlasContext,
    sources: &[Box<dyn ConfigSource>],
    config: &AtlasConfig,
) -> FeatureResult<Arc<IeegDataset>> {
    let dataset = Arc::new(IeegDataset::load(
        sources,
        &config.features,
        &config.bootstrap.project_tag,
    )?);
    register_ieeg_extractors(context, Arc::clone(&dataset));
    Ok(dataset)
}
