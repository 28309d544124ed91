// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Atlas - selection state over a set of parcellations and spaces.

An atlas moves through three states:

- `Unselected`: no parcellation chosen yet
- `ParcellationSelected`: a parcellation is chosen, the region is its root
- `RegionSelected`: a specific region below the root is chosen

Selecting a parcellation always resets the region to the new root. Failed
selections are logged and leave the state untouched. Queries (masks,
templates, maps, features) are read-only projections of the current state.
*/

use neuroatlas_structures::{
    AtlasDataError, Concept, ConceptCore, Parcellation, Region, RegionId, RegionSpec, Registry, Space, Volume,
    VolumeLoader,
};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::{CacheKey, VolumeCache, VolumeKind};
use crate::features::{ExtractorRegistry, Feature, FeatureParams};
use crate::regionprops::RegionProps;
use crate::types::{AtlasError, AtlasResult};

/// Default number of masks and templates memoized per atlas
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Immutable description of an atlas: its identity plus the spaces and
/// parcellations it supports
#[derive(Debug)]
pub struct AtlasDefinition {
    core: ConceptCore,
    spaces: Registry<Space>,
    parcellations: Registry<Parcellation>,
}

impl AtlasDefinition {
    pub fn new(core: ConceptCore, spaces: Vec<Arc<Space>>, parcellations: Vec<Arc<Parcellation>>) -> Self {
        let mut space_registry = Registry::new("space");
        for space in spaces {
            space_registry.add_shared(space);
        }
        let mut parcellation_registry = Registry::new("parcellation");
        for parcellation in parcellations {
            parcellation_registry.add_shared(parcellation);
        }
        Self {
            core,
            spaces: space_registry,
            parcellations: parcellation_registry,
        }
    }

    pub fn spaces(&self) -> &Registry<Space> {
        &self.spaces
    }

    pub fn parcellations(&self) -> &Registry<Parcellation> {
        &self.parcellations
    }
}

impl Concept for AtlasDefinition {
    fn core(&self) -> &ConceptCore {
        &self.core
    }
}

/// Coarse state of the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Unselected,
    ParcellationSelected,
    RegionSelected,
}

#[derive(Debug, Clone)]
struct Selection {
    parcellation: Arc<Parcellation>,
    region: RegionId,
}

/// A region found in one of the atlas' parcellations
#[derive(Debug, Clone)]
pub struct RegionMatch {
    pub parcellation: Arc<Parcellation>,
    pub region: RegionId,
}

impl RegionMatch {
    pub fn region(&self) -> &Region {
        self.parcellation.regions().get(self.region)
    }

    /// Spec selecting exactly this region of its parcellation
    pub fn spec(&self) -> RegionSpec {
        self.parcellation.node(self.region)
    }
}

impl From<&RegionMatch> for RegionSpec {
    fn from(found: &RegionMatch) -> Self {
        found.spec()
    }
}

impl From<RegionMatch> for RegionSpec {
    fn from(found: RegionMatch) -> Self {
        found.spec()
    }
}

impl fmt::Display for RegionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.region(), self.parcellation.name())
    }
}

/// An atlas with mutable selection state
pub struct Atlas {
    definition: Arc<AtlasDefinition>,
    loader: Arc<dyn VolumeLoader>,
    extractors: Arc<ExtractorRegistry>,
    selection: Option<Selection>,
    known_parcellations: Option<Arc<Registry<Parcellation>>>,
    threshold: Option<f32>,
    cache: VolumeCache,
}

impl Atlas {
    /// Create an atlas with nothing selected
    pub fn new(
        definition: Arc<AtlasDefinition>,
        loader: Arc<dyn VolumeLoader>,
        extractors: Arc<ExtractorRegistry>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            definition,
            loader,
            extractors,
            selection: None,
            known_parcellations: None,
            threshold: None,
            cache: VolumeCache::new(cache_capacity),
        }
    }

    /// Parcellations known beyond this atlas, consulted for exact matches
    /// before the atlas' own parcellations are searched loosely
    pub fn with_known_parcellations(mut self, parcellations: Arc<Registry<Parcellation>>) -> Self {
        self.known_parcellations = Some(parcellations);
        self
    }

    pub fn definition(&self) -> &Arc<AtlasDefinition> {
        &self.definition
    }

    pub fn spaces(&self) -> impl Iterator<Item = &Arc<Space>> {
        self.definition.spaces.iter()
    }

    pub fn parcellations(&self) -> impl Iterator<Item = &Arc<Parcellation>> {
        self.definition.parcellations.iter()
    }

    pub fn state(&self) -> SelectionState {
        match &self.selection {
            None => SelectionState::Unselected,
            Some(s) if s.region == s.parcellation.root() => SelectionState::ParcellationSelected,
            Some(_) => SelectionState::RegionSelected,
        }
    }

    pub fn selected_parcellation(&self) -> Option<&Arc<Parcellation>> {
        self.selection.as_ref().map(|s| &s.parcellation)
    }

    pub fn selected_region_id(&self) -> Option<RegionId> {
        self.selection.as_ref().map(|s| s.region)
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selection
            .as_ref()
            .map(|s| s.parcellation.regions().get(s.region))
    }

    /// Threshold applied to continuous maps when building masks, if enabled
    pub fn continuous_map_threshold(&self) -> Option<f32> {
        self.threshold
    }

    /// Number of masks and templates currently memoized
    pub fn cached_volume_count(&self) -> usize {
        self.cache.len()
    }

    fn current(&self) -> AtlasResult<&Selection> {
        self.selection
            .as_ref()
            .ok_or_else(|| AtlasError::NoParcellationSelected {
                atlas: self.name().to_string(),
            })
    }

    fn set_region(&mut self, region: RegionId) {
        if let Some(selection) = self.selection.as_mut() {
            if selection.region != region {
                selection.region = region;
                self.cache.clear();
            }
        }
    }

    /// Select one of the atlas' parcellations by key, id or name
    ///
    /// A spec naming exactly one of the known parcellations refers to that
    /// parcellation only, even if it loosely matches one of the atlas' own.
    /// The region selection is reset to the root of the new parcellation.
    ///
    /// # Errors
    /// `InvalidParcellation` if the spec names a parcellation this atlas does
    /// not own, or none matches.
    pub fn select_parcellation(&mut self, spec: &str) -> AtlasResult<()> {
        let parcellation = match self.resolve_parcellation(spec) {
            Ok(parcellation) => parcellation,
            Err(err) => {
                error!("Cannot select parcellation: {}", err);
                return Err(err);
            }
        };

        let root = parcellation.root();
        info!(atlas = %self.name(), "Selected parcellation \"{}\"", parcellation);
        self.selection = Some(Selection {
            parcellation,
            region: root,
        });
        self.cache.clear();
        Ok(())
    }

    fn resolve_parcellation(&self, spec: &str) -> AtlasResult<Arc<Parcellation>> {
        let invalid = || AtlasError::InvalidParcellation {
            parcellation: spec.to_string(),
            atlas: self.name().to_string(),
        };
        let owned = &self.definition.parcellations;

        let exact = self
            .known_parcellations
            .as_ref()
            .and_then(|known| known.get_exact(spec))
            .or_else(|| owned.get_exact(spec));
        if let Some(named) = exact {
            return owned
                .iter()
                .find(|p| p.id() == named.id())
                .cloned()
                .ok_or_else(invalid);
        }

        match owned.get(spec) {
            Ok(parcellation) => Ok(parcellation),
            Err(AtlasDataError::NotFound { .. }) => Err(invalid()),
            Err(e) => Err(e.into()),
        }
    }

    /// Select a region of the selected parcellation
    ///
    /// Text and label specs are searched with uppermost selection. A single
    /// match is selected. Several matches that are exactly all children of
    /// one parent select that parent instead.
    ///
    /// # Errors
    /// `RegionNotFound` for zero matches, `AmbiguousRegionSpec` for several
    /// matches without a common complete parent or node specs of another
    /// parcellation, `NoParcellationSelected` before any parcellation was
    /// selected. The selection is unchanged on error.
    pub fn select_region(&mut self, spec: impl Into<RegionSpec>) -> AtlasResult<RegionId> {
        let spec = spec.into();
        let result = self
            .current()
            .and_then(|selection| resolve_region(&selection.parcellation, &spec));
        let target = match result {
            Ok(target) => target,
            Err(err) => {
                error!("{}", err);
                return Err(err);
            }
        };

        if self.selected_region_id() != Some(target) {
            self.set_region(target);
            if let Some(region) = self.selected_region() {
                info!(atlas = %self.name(), "Selected region {}", region);
            }
        }
        Ok(target)
    }

    /// Reset the region selection to the root of the selected parcellation
    pub fn clear_selection(&mut self) -> AtlasResult<()> {
        let root = self.current()?.parcellation.root();
        self.set_region(root);
        info!(atlas = %self.name(), "Cleared region selection");
        Ok(())
    }

    /// Search regions in the selected parcellation, or in all parcellations
    ///
    /// Node specs only match in the parcellation they name.
    pub fn find(&self, spec: impl Into<RegionSpec>, all_parcellations: bool) -> AtlasResult<Vec<RegionMatch>> {
        let spec = spec.into();
        let parcellations: Vec<&Arc<Parcellation>> = if all_parcellations {
            self.parcellations().collect()
        } else {
            vec![&self.current()?.parcellation]
        };

        let mut result = Vec::new();
        for parcellation in parcellations {
            for region in parcellation.find(&spec) {
                result.push(RegionMatch {
                    parcellation: Arc::clone(parcellation),
                    region,
                });
            }
        }
        Ok(result)
    }

    /// True if `region` is the selected region or one of its descendants
    pub fn region_selected(&self, region: RegionId) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|s| s.parcellation.regions().includes(s.region, region))
    }

    /// Keys of all regions of the selected parcellation
    pub fn region_names(&self) -> Vec<&str> {
        self.selection
            .as_ref()
            .map(|s| s.parcellation.region_names())
            .unwrap_or_default()
    }

    /// Prefer thresholded continuous maps over labelled maps for masks
    pub fn enable_continuous_map_thresholding(&mut self, threshold: f32) {
        self.threshold = Some(threshold);
        self.cache.clear();
    }

    pub fn disable_continuous_map_thresholding(&mut self) {
        self.threshold = None;
        self.cache.clear();
    }

    /// Resolve a space supported by this atlas
    ///
    /// # Errors
    /// `UnsupportedSpace` if no space of the atlas matches.
    pub fn space(&self, spec: &str) -> AtlasResult<Arc<Space>> {
        match self.definition.spaces.get(spec) {
            Ok(space) => Ok(space),
            Err(AtlasDataError::NotFound { .. }) => {
                let err = AtlasError::UnsupportedSpace {
                    space: spec.to_string(),
                    atlas: self.name().to_string(),
                };
                error!("{}", err);
                Err(err)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Binary mask of the current selection in `space`
    ///
    /// Results are memoized until the selection or threshold changes; `force`
    /// bypasses the memo and the loader's caches.
    pub fn get_mask(&self, space: &str, resolution: Option<f64>, force: bool) -> AtlasResult<Arc<Volume>> {
        let space = self.space(space)?;
        let selection = self.current()?;
        let key = CacheKey::new(
            VolumeKind::Mask,
            space.id(),
            Some(selection.parcellation.id()),
            Some(selection.region),
            resolution,
            self.threshold,
        );
        self.cache.get_or_try_insert(key, force, || {
            Ok(selection.parcellation.get_regionmask(
                &space,
                selection.region,
                self.threshold,
                self.loader.as_ref(),
                resolution,
                force,
            )?)
        })
    }

    /// Reference template of `space`, or `None` if the space has none
    pub fn get_template(&self, space: &str, resolution: Option<f64>, force: bool) -> AtlasResult<Option<Arc<Volume>>> {
        let space = self.space(space)?;
        let key = CacheKey::new(VolumeKind::Template, space.id(), None, None, resolution, None);
        if !force {
            if let Some(template) = self.cache.get(&key) {
                return Ok(Some(template));
            }
        }
        Ok(space
            .get_template(self.loader.as_ref(), resolution, force)?
            .map(|template| self.cache.insert(key, template)))
    }

    /// Labelled maps of the selected parcellation in `space`
    pub fn get_maps(&self, space: &str, resolution: Option<f64>, force: bool) -> AtlasResult<Vec<Volume>> {
        let space = self.space(space)?;
        let selection = self.current()?;
        Ok(selection
            .parcellation
            .get_maps(&space, self.loader.as_ref(), resolution, force)?)
    }

    /// Test whether a physical coordinate of `space` lies inside the
    /// selection mask
    ///
    /// Coordinates with NaN or infinite components are never inside.
    pub fn coordinate_selected(&self, space: &str, coordinate: [f64; 3]) -> AtlasResult<bool> {
        let mask = self.get_mask(space, None, false)?;
        if !coordinate.iter().all(|c| c.is_finite()) {
            debug!(atlas = %self.name(), "Coordinate {:?} is not finite", coordinate);
            return Ok(false);
        }
        let voxel = mask.physical_to_voxel(coordinate)?;
        Ok(mask.value_at(voxel).is_some_and(|value| value != 0.0))
    }

    /// Spatial properties of the selected region, optionally followed by
    /// those of every descendant in pre-order
    ///
    /// The selection is restored afterwards, also when a descendant fails.
    pub fn regionprops(&mut self, space: &str, include_children: bool) -> AtlasResult<Vec<RegionProps>> {
        let mut result = vec![self.current_regionprops(space)?];
        if include_children {
            let Selection { parcellation, region } = self.current()?.clone();
            let mut scope = SelectionScope::new(self, region);
            for child in parcellation.regions().descendants(region) {
                scope.set_region(child);
                result.push(scope.current_regionprops(space)?);
            }
        }
        Ok(result)
    }

    fn current_regionprops(&self, space: &str) -> AtlasResult<RegionProps> {
        let mask = self.get_mask(space, None, false)?;
        let region = self
            .selected_region()
            .map(|r| r.name().to_string())
            .unwrap_or_default();
        let space_name = self.space(space)?.name().to_string();
        Ok(RegionProps::from_mask(region, space_name, &mask))
    }

    /// Features of `modality` for the current selection
    ///
    /// Unknown modalities and missing selections are logged and yield no
    /// features. See [`Atlas::try_get_features`] for the failing variant.
    pub fn get_features(&self, modality: &str, params: &FeatureParams) -> Vec<Arc<dyn Feature>> {
        match self.try_get_features(modality, params) {
            Ok(features) => features,
            Err(err) => {
                error!("Cannot query features: {}", err);
                Vec::new()
            }
        }
    }

    /// Features of `modality`, concatenated over all extractors registered
    /// for it
    ///
    /// # Errors
    /// `UnknownModality`, `MissingRegionSelection` for non-global modalities
    /// without a selection, or the first extractor error.
    pub fn try_get_features(&self, modality: &str, params: &FeatureParams) -> AtlasResult<Vec<Arc<dyn Feature>>> {
        let extractors = self
            .extractors
            .extractors(modality)
            .ok_or_else(|| AtlasError::UnknownModality {
                modality: modality.to_string(),
                known: self.extractors.modalities().to_vec(),
            })?;

        if !self.extractors.is_global(modality) && self.selection.is_none() {
            return Err(AtlasError::MissingRegionSelection {
                modality: modality.to_string(),
            });
        }

        let mut hits = Vec::new();
        for extractor in extractors {
            hits.extend(extractor.pick_selection(self, params)?);
        }
        Ok(hits)
    }
}

impl Concept for Atlas {
    fn core(&self) -> &ConceptCore {
        self.definition.core()
    }
}

impl fmt::Display for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atlas")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("region", &self.selected_region().map(|r| r.name()))
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Find the single region of `parcellation` a spec refers to
fn resolve_region(parcellation: &Parcellation, spec: &RegionSpec) -> AtlasResult<RegionId> {
    let tree = parcellation.regions();
    if let RegionSpec::Node { region, .. } = spec {
        return if parcellation.owns(spec) && tree.contains(*region) {
            Ok(*region)
        } else {
            Err(AtlasError::RegionNotFound {
                spec: spec.to_string(),
            })
        };
    }

    let found = tree.find(tree.root(), spec, true);
    match found.as_slice() {
        [] => Err(AtlasError::RegionNotFound {
            spec: spec.to_string(),
        }),
        [single] => Ok(*single),
        [first, ..] => {
            // complete sibling set collapses to the parent
            if let Some(parent) = tree.parent(*first) {
                let same_parent = found.iter().all(|&r| tree.parent(r) == Some(parent));
                if same_parent && tree.children(parent).len() == found.len() {
                    return Ok(parent);
                }
            }
            Err(AtlasError::AmbiguousRegionSpec {
                spec: spec.to_string(),
                candidates: found
                    .iter()
                    .map(|&r| tree.get(r).name().to_string())
                    .collect(),
            })
        }
    }
}

/// Restores the region selection when dropped
struct SelectionScope<'a> {
    atlas: &'a mut Atlas,
    region: RegionId,
}

impl<'a> SelectionScope<'a> {
    fn new(atlas: &'a mut Atlas, region: RegionId) -> Self {
        Self { atlas, region }
    }
}

impl Deref for SelectionScope<'_> {
    type Target = Atlas;

    fn deref(&self) -> &Atlas {
        self.atlas
    }
}

impl DerefMut for SelectionScope<'_> {
    fn deref_mut(&mut self) -> &mut Atlas {
        self.atlas
    }
}

impl Drop for SelectionScope<'_> {
    fn drop(&mut self) {
        self.atlas.set_region(self.region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroatlas_structures::InMemoryVolumeLoader;
    use serde_json::json;

    fn parcellation() -> Arc<Parcellation> {
        Arc::new(
            Parcellation::from_json(&json!({
                "@id": "p",
                "name": "Test parcellation",
                "regions": [
                    {"name": "Lobe", "children": [
                        {"name": "Area a", "children": [
                            {"name": "Area a left part", "labelIndex": 1},
                            {"name": "Area a right part", "labelIndex": 2}
                        ]},
                        {"name": "Area b", "labelIndex": 3},
                        {"name": "Gyrus left", "labelIndex": 4}
                    ]},
                    {"name": "Other left", "labelIndex": 5}
                ]
            }))
            .unwrap(),
        )
    }

    fn atlas() -> Atlas {
        let definition = AtlasDefinition::new(
            ConceptCore::new("atlas", "Test atlas", vec![]),
            vec![],
            vec![parcellation()],
        );
        let mut atlas = Atlas::new(
            Arc::new(definition),
            Arc::new(InMemoryVolumeLoader::new()),
            Arc::new(ExtractorRegistry::new()),
            DEFAULT_CACHE_CAPACITY,
        );
        atlas.select_parcellation("p").unwrap();
        atlas
    }

    fn selected_name(atlas: &Atlas) -> String {
        atlas.selected_region().unwrap().name().to_string()
    }

    #[test]
    fn test_state_transitions() {
        let mut atlas = atlas();
        assert_eq!(atlas.state(), SelectionState::ParcellationSelected);
        atlas.select_region("area b").unwrap();
        assert_eq!(atlas.state(), SelectionState::RegionSelected);
        atlas.clear_selection().unwrap();
        assert_eq!(atlas.state(), SelectionState::ParcellationSelected);
        assert_eq!(selected_name(&atlas), "Test parcellation");
    }

    #[test]
    fn test_select_before_parcellation_fails() {
        let definition = AtlasDefinition::new(ConceptCore::new("a", "A", vec![]), vec![], vec![parcellation()]);
        let mut atlas = Atlas::new(
            Arc::new(definition),
            Arc::new(InMemoryVolumeLoader::new()),
            Arc::new(ExtractorRegistry::new()),
            4,
        );
        assert_eq!(atlas.state(), SelectionState::Unselected);
        assert!(matches!(
            atlas.select_region("area"),
            Err(AtlasError::NoParcellationSelected { .. })
        ));
    }

    #[test]
    fn test_complete_sibling_set_collapses() {
        let mut atlas = atlas();
        // both children of "Area a" match, the parent itself does not
        atlas.select_region("part").unwrap();
        assert_eq!(selected_name(&atlas), "Area a");
    }

    #[test]
    fn test_uppermost_match_wins() {
        let mut atlas = atlas();
        atlas.select_region("areaa").unwrap();
        assert_eq!(selected_name(&atlas), "Area a");
    }

    #[test]
    fn test_partial_sibling_set_is_ambiguous() {
        let mut atlas = atlas();
        atlas.select_region("area b").unwrap();
        let err = atlas.select_region("left").unwrap_err();
        match err {
            AtlasError::AmbiguousRegionSpec { candidates, .. } => {
                assert_eq!(candidates, vec!["Area a left part", "Gyrus left", "Other left"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(selected_name(&atlas), "Area b");
    }

    #[test]
    fn test_single_match_by_text_and_label() {
        let mut atlas = atlas();
        atlas.select_region("a left").unwrap();
        assert_eq!(selected_name(&atlas), "Area a left part");
        atlas.select_region(RegionSpec::LabelIndex(2)).unwrap();
        assert_eq!(selected_name(&atlas), "Area a right part");
    }

    #[test]
    fn test_node_spec_validated_against_tree() {
        let mut atlas = atlas();
        assert!(matches!(
            atlas.select_region(RegionSpec::node("p", RegionId(1000))),
            Err(AtlasError::RegionNotFound { .. })
        ));
        let id = atlas.select_region(RegionSpec::node("p", RegionId(1))).unwrap();
        assert_eq!(atlas.selected_region_id(), Some(id));
    }

    #[test]
    fn test_match_from_other_parcellation_is_rejected() {
        let other = Arc::new(
            Parcellation::from_json(&json!({
                "@id": "q",
                "name": "Other parcellation",
                "regions": [{"name": "Lobe q"}, {"name": "Area q"}]
            }))
            .unwrap(),
        );
        let definition = AtlasDefinition::new(
            ConceptCore::new("atlas", "Test atlas", vec![]),
            vec![],
            vec![parcellation(), other],
        );
        let mut atlas = Atlas::new(
            Arc::new(definition),
            Arc::new(InMemoryVolumeLoader::new()),
            Arc::new(ExtractorRegistry::new()),
            DEFAULT_CACHE_CAPACITY,
        );
        atlas.select_parcellation("p").unwrap();
        atlas.select_region("area b").unwrap();

        // "Area q" shares its node index with a region of "p"
        let found = atlas.find("area q", true).unwrap();
        assert_eq!(found.len(), 1);
        assert!(atlas.selected_parcellation().unwrap().region(found[0].region).is_some());

        let err = atlas.select_region(&found[0]).unwrap_err();
        assert!(matches!(err, AtlasError::RegionNotFound { .. }));
        assert_eq!(selected_name(&atlas), "Area b");
        assert!(atlas.find(&found[0], false).unwrap().is_empty());

        atlas.select_parcellation("q").unwrap();
        atlas.select_region(&found[0]).unwrap();
        assert_eq!(selected_name(&atlas), "Area q");
    }

    #[test]
    fn test_region_selected_and_find() {
        let mut atlas = atlas();
        let lobe = atlas.select_region("lobe").unwrap();
        let left = atlas.find("area a left", false).unwrap();
        assert_eq!(left.len(), 1);
        assert!(atlas.region_selected(left[0].region));
        assert!(atlas.region_selected(lobe));
        let other = atlas.find("other", true).unwrap();
        assert!(!atlas.region_selected(other[0].region));
        assert_eq!(atlas.region_names().len(), 8);
    }

    #[test]
    fn test_unknown_space_is_unsupported() {
        let atlas = atlas();
        assert!(matches!(
            atlas.get_mask("waxholm", None, false),
            Err(AtlasError::UnsupportedSpace { .. })
        ));
        assert!(matches!(
            atlas.get_template("waxholm", None, false),
            Err(AtlasError::UnsupportedSpace { .. })
        ));
    }

    #[test]
    fn test_features_of_unknown_modality_are_empty() {
        let atlas = atlas();
        assert!(atlas.get_features("GeneExpression", &FeatureParams::new()).is_empty());
        assert!(matches!(
            atlas.try_get_features("GeneExpression", &FeatureParams::new()),
            Err(AtlasError::UnknownModality { .. })
        ));
    }
}
