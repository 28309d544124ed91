// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Atlas Selection Tests
//!
//! End-to-end behavior of an atlas bootstrapped from an in-memory mirror:
//! - Region selection by name, with parent collapse and failures
//! - Parcellation ownership
//! - Masks, templates and coordinate membership
//! - Region properties with restored selection
//! - Feature dispatch by modality
//! - Mirror pinning during bootstrap

use ndarray::Array3;
use neuroatlas_atlas::bootstrap::{ATLAS_TYPE, PARCELLATION_TYPE, SPACE_TYPE};
use neuroatlas_atlas::{
    Atlas, AtlasContext, AtlasError, AtlasResult, ConfigSource, Feature, FeatureExtractor, FeatureParams,
    InMemoryConfigSource, SelectionState,
};
use neuroatlas_config::AtlasConfig;
use neuroatlas_structures::{Affine, Concept, InMemoryVolumeLoader, RegionSpec, Volume};
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

const VOLUME_TYPE: &str = "fzj/tmp/volume_type/v0.0.1";

fn space_id() -> String {
    format!("{}/mni152", SPACE_TYPE)
}

fn volume(url: &str, map_type: &str) -> Value {
    json!({
        "@type": VOLUME_TYPE,
        "@id": url,
        "name": url,
        "url": url,
        "volume_type": "nii",
        "map_type": map_type,
        "space_id": space_id()
    })
}

fn source() -> InMemoryConfigSource {
    InMemoryConfigSource::new("memory")
        .with_json(
            "spaces",
            "mni152.json",
            &json!({
                "@id": space_id(),
                "name": "MNI 152 ICBM 2009c Nonlinear Asymmetric",
                "datasets": [volume("mem://template", "template")]
            }),
        )
        .with_json(
            "parcellations",
            "julich.json",
            &json!({
                "@id": format!("{}/julich", PARCELLATION_TYPE),
                "name": "Julich-Brain Cytoarchitectonic Maps",
                "version": "2.5",
                "datasets": [volume("mem://labels", "labelled")],
                "regions": [
                    {"name": "Occipital cortex", "children": [
                        {"name": "V1", "children": [
                            {"name": "V1-left", "labelIndex": 1},
                            {"name": "V1-right", "labelIndex": 2}
                        ]},
                        {"name": "Unmapped area",
                         "datasets": [volume("mem://unmapped-pmap", "continuous")]}
                    ]},
                    {"name": "Frontal pole", "labelIndex": 3}
                ]
            }),
        )
        .with_json(
            "parcellations",
            "layers.json",
            &json!({
                "@id": format!("{}/layers", PARCELLATION_TYPE),
                "name": "Cortical layers",
                "regions": [{"name": "Layer 1"}]
            }),
        )
        .with_json(
            "parcellations",
            "fibres.json",
            &json!({
                "@id": format!("{}/fibres", PARCELLATION_TYPE),
                "name": "Fibre bundles",
                "regions": [{"name": "Arcuate fasciculus"}]
            }),
        )
        .with_json(
            "parcellations",
            "fibres_long.json",
            &json!({
                "@id": format!("{}/fibres-long", PARCELLATION_TYPE),
                "name": "Fibre bundles long",
                "regions": [{"name": "Cingulum"}]
            }),
        )
        .with_json(
            "atlases",
            "human.json",
            &json!({
                "@id": format!("{}/human", ATLAS_TYPE),
                "name": "Multilevel Human Atlas",
                "spaces": [space_id()],
                "parcellations": [
                    format!("{}/julich", PARCELLATION_TYPE),
                    format!("{}/fibres-long", PARCELLATION_TYPE)
                ]
            }),
        )
}

fn loader() -> InMemoryVolumeLoader {
    let affine = Affine::from_scale_and_origin(2.0, [-4.0, -4.0, -4.0]);
    let mut labels = Array3::zeros((4, 4, 4));
    labels[[0, 0, 0]] = 1.0;
    labels[[1, 0, 0]] = 2.0;
    labels[[3, 3, 3]] = 3.0;
    InMemoryVolumeLoader::new()
        .with_volume("mem://labels", Volume::new(labels, affine))
        .with_volume("mem://template", Volume::new(Array3::ones((4, 4, 4)), affine))
}

fn context() -> AtlasContext {
    let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(source())];
    AtlasContext::bootstrap(&AtlasConfig::default(), &sources, Arc::new(loader())).expect("bootstrap")
}

fn atlas() -> Atlas {
    context().atlas("human").expect("atlas")
}

fn selected_name(atlas: &Atlas) -> String {
    atlas.selected_region().expect("selection").name().to_string()
}

// ═══════════════════════════════════════════════════════════
// Region selection
// ═══════════════════════════════════════════════════════════

#[test]
fn test_new_atlas_selects_first_parcellation() {
    let atlas = atlas();
    assert_eq!(atlas.state(), SelectionState::ParcellationSelected);
    assert_eq!(
        atlas.selected_parcellation().unwrap().name(),
        "Julich-Brain Cytoarchitectonic Maps"
    );
    assert_eq!(selected_name(&atlas), "Julich-Brain Cytoarchitectonic Maps");
}

#[test]
fn test_v1_scenario() {
    let mut atlas = atlas();

    atlas.select_region("v1").unwrap();
    assert_eq!(selected_name(&atlas), "V1");

    atlas.select_region("v1 left").unwrap();
    assert_eq!(selected_name(&atlas), "V1-left");
    assert!(atlas.selected_region().unwrap().children().is_empty());

    let err = atlas.select_region("nonexistent-region").unwrap_err();
    assert!(matches!(err, AtlasError::RegionNotFound { .. }));
    assert_eq!(selected_name(&atlas), "V1-left");
}

#[test]
fn test_clear_and_reselect_round_trip() {
    let mut atlas = atlas();
    atlas.clear_selection().unwrap();
    let root = atlas.selected_region_id().unwrap();
    let parcellation = Arc::clone(atlas.selected_parcellation().unwrap());

    let leaves: Vec<_> = parcellation
        .regions()
        .descendants(root)
        .filter(|&id| parcellation.regions().get(id).is_leaf())
        .collect();
    assert_eq!(leaves.len(), 4);

    for leaf in leaves {
        atlas.select_region(parcellation.node(leaf)).unwrap();
        assert_eq!(atlas.selected_region_id(), Some(leaf));
        atlas.clear_selection().unwrap();
        assert_eq!(atlas.selected_region_id(), Some(root));
    }
}

#[test]
fn test_select_by_label_and_key() {
    let mut atlas = atlas();
    atlas.select_region(RegionSpec::LabelIndex(3)).unwrap();
    assert_eq!(selected_name(&atlas), "Frontal pole");
    atlas.select_region("V1_RIGHT").unwrap();
    assert_eq!(selected_name(&atlas), "V1-right");
}

#[test]
fn test_find_across_parcellations() {
    let atlas = atlas();
    assert_eq!(atlas.find("layer", true).unwrap().len(), 0);
    let hits = atlas.find("v1", false).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].to_string(), "V1 (Julich-Brain Cytoarchitectonic Maps)");
}

// ═══════════════════════════════════════════════════════════
// Parcellation ownership
// ═══════════════════════════════════════════════════════════

#[test]
fn test_select_unowned_parcellation_fails() {
    let context = context();
    let layers = context.parcellations().get("cortical layers").unwrap();
    let mut atlas = context.atlas("human").unwrap();
    atlas.select_region("frontal pole").unwrap();

    let err = atlas.select_parcellation(layers.id()).unwrap_err();
    assert!(matches!(err, AtlasError::InvalidParcellation { .. }));
    assert_eq!(selected_name(&atlas), "Frontal pole");
}

#[test]
fn test_exact_name_of_unowned_parcellation_is_not_resolved_loosely() {
    let mut atlas = atlas();
    atlas.select_region("v1").unwrap();

    // "Fibre bundles" loosely matches the owned "Fibre bundles long"
    let err = atlas.select_parcellation("Fibre bundles").unwrap_err();
    assert!(matches!(err, AtlasError::InvalidParcellation { .. }));
    assert_eq!(selected_name(&atlas), "V1");

    atlas.select_parcellation("fibre bundles long").unwrap();
    assert_eq!(atlas.selected_parcellation().unwrap().name(), "Fibre bundles long");
    atlas.select_parcellation("julich").unwrap();
    atlas.select_parcellation("long").unwrap();
    assert_eq!(atlas.selected_parcellation().unwrap().name(), "Fibre bundles long");
}

#[test]
fn test_select_parcellation_resets_region() {
    let mut atlas = atlas();
    atlas.select_region("v1").unwrap();
    atlas.select_parcellation("julich").unwrap();
    assert_eq!(atlas.state(), SelectionState::ParcellationSelected);
}

// ═══════════════════════════════════════════════════════════
// Masks, templates and coordinates
// ═══════════════════════════════════════════════════════════

#[test]
fn test_coordinate_inside_and_outside() {
    let mut atlas = atlas();
    atlas.select_region("v1").unwrap();

    // voxel (0, 0, 0) carries label 1
    assert!(atlas.coordinate_selected("mni152", [-4.0, -4.0, -4.0]).unwrap());
    // voxel (1, 0, 0) carries label 2
    assert!(atlas.coordinate_selected("mni152", [-2.0, -4.0, -4.0]).unwrap());
    // voxel (3, 3, 3) is frontal pole
    assert!(!atlas.coordinate_selected("mni152", [2.0, 2.0, 2.0]).unwrap());
    // outside the grid on either side
    assert!(!atlas.coordinate_selected("mni152", [100.0, 0.0, 0.0]).unwrap());
    assert!(!atlas.coordinate_selected("mni152", [-10.0, -4.0, -4.0]).unwrap());
}

#[test]
fn test_non_finite_coordinate_is_not_selected() {
    let mut atlas = atlas();
    atlas.select_region("v1").unwrap();
    assert!(!atlas.coordinate_selected("mni152", [f64::NAN, -4.0, -4.0]).unwrap());
    assert!(!atlas.coordinate_selected("mni152", [-4.0, f64::INFINITY, -4.0]).unwrap());
    assert!(!atlas.coordinate_selected("mni152", [-4.0, -4.0, f64::NEG_INFINITY]).unwrap());
}

#[test]
fn test_mask_is_memoized_until_selection_changes() {
    let mut atlas = atlas();
    atlas.select_region("v1").unwrap();
    let first = atlas.get_mask("mni152", None, false).unwrap();
    let second = atlas.get_mask("mni152", None, false).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(atlas.cached_volume_count(), 1);

    atlas.select_region("frontal pole").unwrap();
    assert_eq!(atlas.cached_volume_count(), 0);
    let frontal = atlas.get_mask("mni152", None, false).unwrap();
    assert_eq!(frontal.nonzero_voxels().collect::<Vec<_>>(), vec![[3, 3, 3]]);
}

#[test]
fn test_template_and_maps() {
    let atlas = atlas();
    let template = atlas.get_template("MNI 152", None, false).unwrap();
    assert_eq!(template.unwrap().shape(), [4, 4, 4]);
    assert_eq!(atlas.get_maps("mni152", None, false).unwrap().len(), 1);
    assert!(matches!(
        atlas.get_mask("colin", None, false),
        Err(AtlasError::UnsupportedSpace { .. })
    ));
}

// ═══════════════════════════════════════════════════════════
// Region properties
// ═══════════════════════════════════════════════════════════

#[test]
fn test_regionprops_with_children_restores_selection() {
    let mut atlas = atlas();
    let v1 = atlas.select_region("v1").unwrap();

    let props = atlas.regionprops("mni152", true).unwrap();
    let names: Vec<_> = props.iter().map(|p| p.region.as_str()).collect();
    assert_eq!(names, vec!["V1", "V1-left", "V1-right"]);
    assert_eq!(props[0].voxel_count, 2);
    assert!((props[0].volume - 16.0).abs() < 1e-9);
    assert_eq!(atlas.selected_region_id(), Some(v1));
}

#[test]
fn test_regionprops_reports_unlabelled_descendants_as_empty() {
    let mut atlas = atlas();
    let occipital = atlas.select_region("occipital").unwrap();

    let props = atlas.regionprops("mni152", true).unwrap();
    let names: Vec<_> = props.iter().map(|p| p.region.as_str()).collect();
    assert_eq!(
        names,
        vec!["Occipital cortex", "V1", "V1-left", "V1-right", "Unmapped area"]
    );
    assert_eq!(props[0].voxel_count, 2);
    assert_eq!(props[4].voxel_count, 0);
    assert_eq!(atlas.selected_region_id(), Some(occipital));
}

#[test]
fn test_regionprops_restores_selection_on_failure() {
    let mut atlas = atlas();
    let occipital = atlas.select_region("occipital").unwrap();

    // the continuous map of "Unmapped area" is not served by the loader
    atlas.enable_continuous_map_thresholding(0.5);
    let err = atlas.regionprops("mni152", true).unwrap_err();
    assert!(matches!(err, AtlasError::Data(_)));
    assert_eq!(atlas.selected_region_id(), Some(occipital));
    assert_eq!(atlas.state(), SelectionState::RegionSelected);
}

// ═══════════════════════════════════════════════════════════
// Features
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct RegionNote(String);

impl fmt::Display for RegionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note on {}", self.0)
    }
}

impl Feature for RegionNote {
    fn modality(&self) -> &str {
        "Notes"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct NoteExtractor;

impl FeatureExtractor for NoteExtractor {
    fn modality(&self) -> &str {
        "Notes"
    }

    fn pick_selection(&self, atlas: &Atlas, _params: &FeatureParams) -> AtlasResult<Vec<Arc<dyn Feature>>> {
        let region = atlas.selected_region().map(|r| r.name().to_string()).unwrap_or_default();
        Ok(vec![Arc::new(RegionNote(region))])
    }
}

#[test]
fn test_features_dispatch_to_all_extractors() {
    let mut context = context();
    context.register_extractor(Arc::new(NoteExtractor));
    context.register_extractor(Arc::new(NoteExtractor));
    let mut atlas = context.atlas("human").unwrap();
    atlas.select_region("v1 right").unwrap();

    let features = atlas.get_features("Notes", &FeatureParams::new());
    assert_eq!(features.len(), 2);
    let note = features[0].as_any().downcast_ref::<RegionNote>().unwrap();
    assert_eq!(note.0, "V1-right");

    assert!(atlas.get_features("GeneExpression", &FeatureParams::new()).is_empty());
}

// ═══════════════════════════════════════════════════════════
// Mirror pinning
// ═══════════════════════════════════════════════════════════

fn spaces_only_mirror(name: &str) -> InMemoryConfigSource {
    InMemoryConfigSource::new(name).with_json(
        "spaces",
        "mni152.json",
        &json!({"@id": space_id(), "name": "MNI 152 ICBM 2009c Nonlinear Asymmetric"}),
    )
}

#[test]
fn test_bootstrap_reads_all_folders_from_one_mirror() {
    let sources: Vec<Box<dyn ConfigSource>> = vec![
        Box::new(InMemoryConfigSource::unreachable("offline")),
        Box::new(source()),
        Box::new(spaces_only_mirror("partial")),
    ];
    let context = AtlasContext::bootstrap(&AtlasConfig::default(), &sources, Arc::new(loader())).unwrap();
    assert_eq!(context.config_source(), Some("memory"));
    assert_eq!(context.parcellations().len(), 4);
}

#[test]
fn test_partial_mirror_is_not_completed_from_later_mirrors() {
    let sources: Vec<Box<dyn ConfigSource>> = vec![
        Box::new(spaces_only_mirror("partial")),
        Box::new(source()),
    ];
    match AtlasContext::bootstrap(&AtlasConfig::default(), &sources, Arc::new(loader())) {
        Err(AtlasError::ConfigBootstrapFailure { tried, .. }) => assert_eq!(tried, vec!["partial"]),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("bootstrap mixed folders from several mirrors"),
    }
}
