// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Fetching concept definitions from configuration mirrors.

A configuration source serves the files of one folder (`spaces`,
`parcellations`, `atlases`, ...) for one project tag. Mirrors are tried in
order; the first reachable one serves every folder of a bootstrap. Definitions are turned into objects by a
builder table keyed by type tag.
*/

use ahash::AHashMap;
use neuroatlas_structures::datasets::extract_type_id;
use neuroatlas_structures::{AtlasDataError, AtlasDataResult, ConceptCore, Parcellation, Space};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{AtlasError, AtlasResult, ConfigSourceError};

/// Type tag of reference space definitions
pub const SPACE_TYPE: &str = "minds/core/referencespace/v1.0.0";

/// Type tag of parcellation definitions
pub const PARCELLATION_TYPE: &str = "minds/core/parcellationatlas/v1.0.0";

/// Type tag of atlas definitions
pub const ATLAS_TYPE: &str = "juelich/iav/atlas/v1.0.0";

/// A raw file fetched from a configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ConfigFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Something that serves configuration files
pub trait ConfigSource: Send + Sync {
    /// Name used in logs and bootstrap errors
    fn name(&self) -> &str;

    /// All files of `folder` whose names end with `suffix`, sorted by name
    ///
    /// # Errors
    /// `Unreachable` if the source cannot be contacted or lacks the folder.
    fn fetch(&self, folder: &str, suffix: &str) -> Result<Vec<ConfigFile>, ConfigSourceError>;
}

/// Local checkout of a configuration repository
///
/// Files are read from `<root>/<project_tag>/<folder>/*<suffix>`.
#[derive(Debug, Clone)]
pub struct DirectoryConfigSource {
    name: String,
    root: PathBuf,
    project_tag: String,
}

impl DirectoryConfigSource {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, project_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            project_tag: project_tag.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ConfigSource for DirectoryConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, folder: &str, suffix: &str) -> Result<Vec<ConfigFile>, ConfigSourceError> {
        let dir = self.root.join(&self.project_tag).join(folder);
        if !dir.is_dir() {
            return Err(ConfigSourceError::Unreachable {
                source_name: self.name.clone(),
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && name.ends_with(suffix) {
                files.push(ConfigFile::new(name, std::fs::read(&path)?));
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Configuration files held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigSource {
    name: String,
    folders: AHashMap<String, Vec<ConfigFile>>,
    reachable: bool,
}

impl InMemoryConfigSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folders: AHashMap::new(),
            reachable: true,
        }
    }

    /// A source that fails every fetch
    pub fn unreachable(name: impl Into<String>) -> Self {
        Self {
            reachable: false,
            ..Self::new(name)
        }
    }

    pub fn with_file(mut self, folder: &str, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.add_file(folder, name, bytes);
        self
    }

    pub fn with_json(self, folder: &str, name: impl Into<String>, value: &Value) -> Self {
        self.with_file(folder, name, value.to_string())
    }

    pub fn add_file(&mut self, folder: &str, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.folders
            .entry(folder.to_string())
            .or_default()
            .push(ConfigFile::new(name, bytes));
    }
}

impl ConfigSource for InMemoryConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, folder: &str, suffix: &str) -> Result<Vec<ConfigFile>, ConfigSourceError> {
        if !self.reachable {
            return Err(ConfigSourceError::Unreachable {
                source_name: self.name.clone(),
                reason: "source is offline".to_string(),
            });
        }
        let Some(files) = self.folders.get(folder) else {
            return Err(ConfigSourceError::Unreachable {
                source_name: self.name.clone(),
                reason: format!("no folder '{}'", folder),
            });
        };
        let mut files: Vec<ConfigFile> = files.iter().filter(|f| f.name.ends_with(suffix)).cloned().collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

/// Fetch a folder from the first reachable source, returning the index of
/// that source along with the files
///
/// Bootstrap pins the returned source so that all concept folders come from
/// the same mirror.
///
/// # Errors
/// `ConfigBootstrapFailure` naming every source tried if all fail.
pub fn select_source(
    sources: &[Box<dyn ConfigSource>],
    folder: &str,
    suffix: &str,
    project_tag: &str,
) -> AtlasResult<(usize, Vec<ConfigFile>)> {
    let mut tried = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        match source.fetch(folder, suffix) {
            Ok(files) => {
                debug!(
                    source = %source.name(),
                    "Fetched {} files from folder '{}'",
                    files.len(),
                    folder
                );
                return Ok((index, files));
            }
            Err(e) => {
                warn!("Configuration source '{}' failed: {}", source.name(), e);
                tried.push(source.name().to_string());
            }
        }
    }
    Err(AtlasError::ConfigBootstrapFailure {
        tag: project_tag.to_string(),
        tried,
    })
}

/// Fetch a folder from the first reachable source
///
/// # Errors
/// `ConfigBootstrapFailure` naming every source tried if all fail.
pub fn fetch_with_failover(
    sources: &[Box<dyn ConfigSource>],
    folder: &str,
    suffix: &str,
    project_tag: &str,
) -> AtlasResult<Vec<ConfigFile>> {
    select_source(sources, folder, suffix, project_tag).map(|(_, files)| files)
}

/// An atlas definition before its space and parcellation ids are resolved
#[derive(Debug, Clone)]
pub struct AtlasDescriptor {
    pub core: ConceptCore,
    pub space_ids: Vec<String>,
    pub parcellation_ids: Vec<String>,
}

impl AtlasDescriptor {
    pub fn from_json(spec: &Value) -> AtlasDataResult<Self> {
        Ok(Self {
            core: ConceptCore::from_json(spec)?,
            space_ids: string_list(spec, "spaces")?,
            parcellation_ids: string_list(spec, "parcellations")?,
        })
    }
}

fn string_list(spec: &Value, field: &str) -> AtlasDataResult<Vec<String>> {
    let values = spec.get(field).and_then(Value::as_array).ok_or_else(|| {
        AtlasDataError::DeserializationError(format!("missing list '{}' in {}", field, spec))
    })?;
    values
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                AtlasDataError::DeserializationError(format!("non-string entry in '{}': {}", field, v))
            })
        })
        .collect()
}

/// Object built from a concept definition
#[derive(Debug, Clone)]
pub enum ConceptObject {
    Space(Space),
    Parcellation(Parcellation),
    Atlas(AtlasDescriptor),
}

impl ConceptObject {
    pub fn kind(&self) -> &'static str {
        match self {
            ConceptObject::Space(_) => "space",
            ConceptObject::Parcellation(_) => "parcellation",
            ConceptObject::Atlas(_) => "atlas",
        }
    }
}

type ConceptBuilder = fn(&Value) -> AtlasDataResult<ConceptObject>;

static CONCEPT_BUILDERS: Lazy<AHashMap<&'static str, ConceptBuilder>> = Lazy::new(|| {
    let mut builders: AHashMap<&'static str, ConceptBuilder> = AHashMap::new();
    builders.insert(SPACE_TYPE, |spec| Space::from_json(spec).map(ConceptObject::Space));
    builders.insert(PARCELLATION_TYPE, |spec| {
        Parcellation::from_json(spec).map(ConceptObject::Parcellation)
    });
    builders.insert(ATLAS_TYPE, |spec| AtlasDescriptor::from_json(spec).map(ConceptObject::Atlas));
    builders
});

/// Build a concept from its definition using the builder table
///
/// # Errors
/// `UnknownType` for type tags without builder, `DeserializationError` for
/// malformed definitions.
pub fn build_concept(spec: &Value) -> AtlasDataResult<ConceptObject> {
    let type_id = extract_type_id(spec).unwrap_or_default();
    match CONCEPT_BUILDERS.get(type_id) {
        Some(builder) => builder(spec),
        None => {
            let mut candidates: Vec<String> = CONCEPT_BUILDERS.keys().map(|k| k.to_string()).collect();
            candidates.sort();
            Err(AtlasDataError::UnknownType {
                type_id: type_id.to_string(),
                candidates,
            })
        }
    }
}

/// Fetch and build every definition of one folder
pub fn load_folder(
    sources: &[Box<dyn ConfigSource>],
    folder: &str,
    suffix: &str,
    project_tag: &str,
) -> AtlasResult<Vec<ConceptObject>> {
    let files = fetch_with_failover(sources, folder, suffix, project_tag)?;
    build_folder(folder, &files)
}

/// Build every definition of an already fetched folder
///
/// # Errors
/// `Construction` naming the first file that is not a valid definition.
pub fn build_folder(folder: &str, files: &[ConfigFile]) -> AtlasResult<Vec<ConceptObject>> {
    let objects = files
        .iter()
        .map(|file| -> AtlasResult<ConceptObject> {
            let construction_error = |reason: String| AtlasError::Construction {
                source_name: format!("{}/{}", folder, file.name),
                reason,
            };
            let spec: Value =
                serde_json::from_slice(&file.bytes).map_err(|e| construction_error(e.to_string()))?;
            build_concept(&spec).map_err(|e| construction_error(e.to_string()))
        })
        .collect::<AtlasResult<Vec<_>>>()?;
    info!("Loaded {} definitions from '{}'", objects.len(), folder);
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn space_json(id: &str, name: &str) -> Value {
        json!({"@id": format!("{}/{}", SPACE_TYPE, id), "name": name})
    }

    #[test]
    fn test_build_concept_by_id_prefix() {
        let object = build_concept(&space_json("mni152", "MNI 152")).unwrap();
        assert_eq!(object.kind(), "space");
    }

    #[test]
    fn test_atlas_descriptor_requires_lists() {
        let err = build_concept(&json!({
            "@id": format!("{}/human", ATLAS_TYPE),
            "name": "Human",
            "spaces": ["a"]
        }))
        .unwrap_err();
        assert!(matches!(err, AtlasDataError::DeserializationError(_)));
    }

    #[test]
    fn test_unknown_concept_type() {
        let err = build_concept(&json!({"@id": "some/other/type/x", "name": "x"})).unwrap_err();
        match err {
            AtlasDataError::UnknownType { type_id, candidates } => {
                assert_eq!(type_id, "some/other/type");
                assert_eq!(candidates.len(), 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_failover_to_second_source() {
        let sources: Vec<Box<dyn ConfigSource>> = vec![
            Box::new(InMemoryConfigSource::unreachable("primary")),
            Box::new(
                InMemoryConfigSource::new("backup")
                    .with_json("spaces", "b.json", &space_json("b", "B"))
                    .with_json("spaces", "a.json", &space_json("a", "A"))
                    .with_file("spaces", "notes.txt", "ignored"),
            ),
        ];
        let files = fetch_with_failover(&sources, "spaces", ".json", "tag").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_select_source_reports_the_serving_source() {
        let sources: Vec<Box<dyn ConfigSource>> = vec![
            Box::new(InMemoryConfigSource::unreachable("primary")),
            Box::new(InMemoryConfigSource::new("backup").with_json("spaces", "a.json", &space_json("a", "A"))),
            Box::new(InMemoryConfigSource::new("archive").with_json("spaces", "z.json", &space_json("z", "Z"))),
        ];
        let (index, files) = select_source(&sources, "spaces", ".json", "tag").unwrap();
        assert_eq!(sources[index].name(), "backup");
        assert_eq!(files.len(), 1);

        // a folder the backup lacks is served by the archive
        assert!(sources[1].fetch("atlases", ".json").is_err());
    }

    #[test]
    fn test_all_sources_unreachable() {
        let sources: Vec<Box<dyn ConfigSource>> = vec![
            Box::new(InMemoryConfigSource::unreachable("primary")),
            Box::new(InMemoryConfigSource::unreachable("backup")),
        ];
        match fetch_with_failover(&sources, "spaces", ".json", "v1") {
            Err(AtlasError::ConfigBootstrapFailure { tag, tried }) => {
                assert_eq!(tag, "v1");
                assert_eq!(tried, vec!["primary", "backup"]);
            }
            other => panic!("unexpected result {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_malformed_file_is_construction_error() {
        let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(
            InMemoryConfigSource::new("local").with_file("spaces", "broken.json", "{not json"),
        )];
        let err = load_folder(&sources, "spaces", ".json", "tag").unwrap_err();
        match err {
            AtlasError::Construction { source_name, .. } => assert_eq!(source_name, "spaces/broken.json"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_directory_source_reads_tagged_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("v1").join("spaces");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("mni.json"), space_json("mni", "MNI").to_string()).unwrap();

        let source = DirectoryConfigSource::new("local", dir.path(), "v1");
        assert_eq!(source.fetch("spaces", ".json").unwrap().len(), 1);
        assert!(matches!(
            source.fetch("parcellations", ".json"),
            Err(ConfigSourceError::Unreachable { .. })
        ));
        let other_tag = DirectoryConfigSource::new("local", dir.path(), "v2");
        assert!(other_tag.fetch("spaces", ".json").is_err());
    }
}
