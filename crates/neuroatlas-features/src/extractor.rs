// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
iEEG feature extractors.

Contact point files are fetched once into an [`IeegDataset`] that both
extractors share. Selection is spatial: a contact point matches when its
coordinate falls inside the mask of the atlas' current region, and an
electrode matches when at least one of its contact points does.
*/

use ahash::AHashMap;
use neuroatlas_atlas::{
    fetch_with_failover, Atlas, AtlasContext, AtlasResult, ConfigSource, Feature, FeatureExtractor, FeatureParams,
};
use neuroatlas_config::FeaturesConfig;
use std::sync::Arc;
use tracing::{debug, info};

use crate::electrode::{ContactPoint, Electrode, CONTACT_POINT_MODALITY, ELECTRODE_MODALITY};
use crate::error::FeatureResult;
use crate::pts::{parse_points, PointsFile};

/// All electrodes of an iEEG contact point collection
#[derive(Debug, Clone, Default)]
pub struct IeegDataset {
    electrodes: Vec<Arc<Electrode>>,
}

impl IeegDataset {
    /// Fetch and parse the contact point files of `config.ieeg_folder`
    ///
    /// # Errors
    /// `Atlas(ConfigBootstrapFailure)` if no source is reachable, parse errors
    /// for malformed files and `DuplicateContactPoint` if two files of a
    /// subject define the same contact.
    pub fn load(sources: &[Box<dyn ConfigSource>], config: &FeaturesConfig, project_tag: &str) -> FeatureResult<Self> {
        let files = fetch_with_failover(sources, &config.ieeg_folder, &config.ieeg_suffix, project_tag)?;
        let parsed = files
            .iter()
            .map(|file| -> FeatureResult<PointsFile> {
                let points = parse_points(&file.name, &file.bytes)?;
                debug!(
                    "Parsed {} contact points of subject '{}' from '{}'",
                    points.point_count(),
                    points.subject_id,
                    file.name
                );
                Ok(points)
            })
            .collect::<FeatureResult<Vec<_>>>()?;

        let dataset = Self::from_points(parsed, &config.ieeg_dataset_id, &config.ieeg_space)?;
        info!(
            "Loaded {} iEEG electrodes with {} contact points from '{}'",
            dataset.electrodes.len(),
            dataset.contact_point_count(),
            config.ieeg_folder
        );
        Ok(dataset)
    }

    /// Group parsed files into electrodes, keyed by subject and electrode id
    pub fn from_points(files: Vec<PointsFile>, dataset_id: &str, space: &str) -> FeatureResult<Self> {
        let mut electrodes: Vec<Electrode> = Vec::new();
        let mut index: AHashMap<(String, String), usize> = AHashMap::new();

        for file in files {
            for points in file.electrodes {
                let key = (file.subject_id.clone(), points.electrode_id.clone());
                let slot = *index.entry(key).or_insert_with(|| {
                    electrodes.push(Electrode::new(
                        points.electrode_id.clone(),
                        file.subject_id.clone(),
                        dataset_id,
                        space,
                    ));
                    electrodes.len() - 1
                });
                for (contact_id, coord) in points.contacts {
                    electrodes[slot].add_contact_point(contact_id, coord)?;
                }
            }
        }

        Ok(Self {
            electrodes: electrodes.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn electrodes(&self) -> &[Arc<Electrode>] {
        &self.electrodes
    }

    pub fn contact_point_count(&self) -> usize {
        self.electrodes.iter().map(|e| e.len()).sum()
    }

    fn selected_contacts<'a>(
        &'a self,
        atlas: &'a Atlas,
    ) -> impl Iterator<Item = AtlasResult<ContactPoint>> + 'a {
        self.electrodes.iter().flat_map(move |electrode| {
            electrode.contact_points().filter_map(move |contact| {
                match atlas.coordinate_selected(electrode.space(), contact.coord()) {
                    Ok(true) => Some(Ok(contact)),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                }
            })
        })
    }
}

/// Contact points inside the selected region
#[derive(Debug, Clone)]
pub struct IeegContactPointExtractor {
    dataset: Arc<IeegDataset>,
}

impl IeegContactPointExtractor {
    pub fn new(dataset: Arc<IeegDataset>) -> Self {
        Self { dataset }
    }
}

impl FeatureExtractor for IeegContactPointExtractor {
    fn modality(&self) -> &str {
        CONTACT_POINT_MODALITY
    }

    fn pick_selection(&self, atlas: &Atlas, _params: &FeatureParams) -> AtlasResult<Vec<Arc<dyn Feature>>> {
        self.dataset
            .selected_contacts(atlas)
            .map(|hit| hit.map(|contact| Arc::new(contact) as Arc<dyn Feature>))
            .collect()
    }
}

/// Electrodes with at least one contact point inside the selected region
#[derive(Debug, Clone)]
pub struct IeegElectrodeExtractor {
    dataset: Arc<IeegDataset>,
}

impl IeegElectrodeExtractor {
    pub fn new(dataset: Arc<IeegDataset>) -> Self {
        Self { dataset }
    }
}

impl FeatureExtractor for IeegElectrodeExtractor {
    fn modality(&self) -> &str {
        ELECTRODE_MODALITY
    }

    fn pick_selection(&self, atlas: &Atlas, _params: &FeatureParams) -> AtlasResult<Vec<Arc<dyn Feature>>> {
        let mut hits: Vec<Arc<dyn Feature>> = Vec::new();
        for electrode in self.dataset.electrodes() {
            let mut selected = false;
            for contact in electrode.contact_points() {
                if atlas.coordinate_selected(electrode.space(), contact.coord())? {
                    selected = true;
                    break;
                }
            }
            if selected {
                hits.push(Arc::clone(electrode) as Arc<dyn Feature>);
            }
        }
        Ok(hits)
    }
}

/// Register both iEEG extractors on `context`, sharing `dataset`
pub fn register_ieeg_extractors(context: &mut AtlasContext, dataset: Arc<IeegDataset>) {
    context.register_extractor(Arc::new(IeegContactPointExtractor::new(Arc::clone(&dataset))));
    context.register_extractor(Arc::new(IeegElectrodeExtractor::new(dataset)));
}
