// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Key-indexed collections of concepts with loose lookup.

use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;

use crate::concept::Concept;
use crate::error::{AtlasDataError, AtlasDataResult};

/// Predicate deciding whether an entry matches a textual spec
pub type MatchFn<T> = fn(&T, &str) -> bool;

fn default_match<T: Concept>(item: &T, spec: &str) -> bool {
    item.matches(spec)
}

/// Registry of concepts of one kind
///
/// Entries are stored in insertion order behind `Arc` so atlases can share
/// them. Adding an entry under an existing key replaces it in place.
pub struct Registry<T> {
    kind: &'static str,
    entries: Vec<Arc<T>>,
    index: AHashMap<String, usize>,
    matchfunc: MatchFn<T>,
}

impl<T: Concept> Registry<T> {
    /// Create an empty registry matching entries with [`Concept::matches`]
    pub fn new(kind: &'static str) -> Self {
        Self::with_matcher(kind, default_match::<T>)
    }

    pub fn with_matcher(kind: &'static str, matchfunc: MatchFn<T>) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: AHashMap::new(),
            matchfunc,
        }
    }

    /// Kind of concepts stored, used in error messages
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Add an entry under its key, replacing a previous entry with that key
    pub fn add(&mut self, item: T) -> Arc<T> {
        self.add_shared(Arc::new(item))
    }

    pub fn add_shared(&mut self, item: Arc<T>) -> Arc<T> {
        let key = item.key().to_string();
        match self.index.get(&key) {
            Some(&position) => self.entries[position] = Arc::clone(&item),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(Arc::clone(&item));
            }
        }
        item
    }

    /// Entry whose key, id or name (ignoring ASCII case) equals `spec`
    pub fn get_exact(&self, spec: &str) -> Option<Arc<T>> {
        if let Some(&position) = self.index.get(spec) {
            return Some(Arc::clone(&self.entries[position]));
        }
        self.entries
            .iter()
            .find(|item| item.id() == spec)
            .or_else(|| self.entries.iter().find(|item| item.name().eq_ignore_ascii_case(spec)))
            .cloned()
    }

    /// Look up a unique entry
    ///
    /// An exact key wins, then an exact id, then an exact name, then the
    /// single entry matching the spec loosely.
    ///
    /// # Errors
    /// `NotFound` if nothing matches, `Ambiguous` with the candidate names if
    /// several entries match loosely.
    pub fn get(&self, spec: &str) -> AtlasDataResult<Arc<T>> {
        if let Some(item) = self.get_exact(spec) {
            return Ok(item);
        }

        let mut matches = self.find(spec);
        match matches.len() {
            0 => Err(AtlasDataError::NotFound {
                kind: self.kind,
                spec: spec.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(AtlasDataError::Ambiguous {
                kind: self.kind,
                spec: spec.to_string(),
                candidates: matches.iter().map(|m| m.name().to_string()).collect(),
            }),
        }
    }

    /// All entries matching `spec`, in insertion order
    pub fn find(&self, spec: &str) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .filter(|item| (self.matchfunc)(item, spec))
            .cloned()
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|item| item.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
            index: self.index.clone(),
            matchfunc: self.matchfunc,
        }
    }
}

impl<T: Concept> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::ConceptCore;

    #[derive(Debug)]
    struct Item(ConceptCore);

    impl Concept for Item {
        fn core(&self) -> &ConceptCore {
            &self.0
        }
    }

    fn item(id: &str, name: &str) -> Item {
        Item(ConceptCore::new(id, name, vec![]))
    }

    fn registry() -> Registry<Item> {
        let mut registry = Registry::new("space");
        registry.add(item("mni152", "MNI 152 ICBM 2009c Nonlinear Asymmetric"));
        registry.add(item("colin27", "MNI Colin 27"));
        registry.add(item("bigbrain", "Big Brain (Histology)"));
        registry
    }

    #[test]
    fn test_get_by_key_id_and_name() {
        let registry = registry();
        assert_eq!(registry.get("MNI_COLIN_27").unwrap().id(), "colin27");
        assert_eq!(registry.get("bigbrain").unwrap().id(), "bigbrain");
        assert_eq!(registry.get("icbm 2009c").unwrap().id(), "mni152");
    }

    #[test]
    fn test_get_ambiguous_lists_candidates() {
        let err = registry().get("mni").unwrap_err();
        match err {
            AtlasDataError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&"MNI Colin 27".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_get_not_found() {
        let err = registry().get("waxholm").unwrap_err();
        assert_eq!(
            err,
            AtlasDataError::NotFound {
                kind: "space",
                spec: "waxholm".to_string()
            }
        );
    }

    #[test]
    fn test_exact_name_wins_over_loose_matches() {
        let mut registry: Registry<Item> = Registry::new("parcellation");
        registry.add(item("fibres", "Fibre bundles"));
        registry.add(item("fibres-long", "Fibre bundles long"));
        assert_eq!(registry.get("fibre bundles").unwrap().id(), "fibres");
        assert!(registry.get_exact("bundles").is_none());
        assert!(matches!(registry.get("bundles"), Err(AtlasDataError::Ambiguous { .. })));
    }

    #[test]
    fn test_add_replaces_same_key_in_place() {
        let mut registry = registry();
        registry.add(item("colin27-v2", "MNI Colin 27"));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("MNI_COLIN_27").unwrap().id(), "colin27-v2");
        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(keys[1], "MNI_COLIN_27");
    }

    #[test]
    fn test_custom_matcher() {
        let mut registry: Registry<Item> =
            Registry::with_matcher("space", |item, spec| item.id().starts_with(spec));
        registry.add(item("mni152", "A"));
        registry.add(item("mni305", "B"));
        assert_eq!(registry.find("mni").len(), 2);
        assert!(registry.get("colin").is_err());
    }
}
