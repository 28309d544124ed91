// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Memoization of masks and templates for the current selection.

use ahash::AHashMap;
use neuroatlas_structures::{RegionId, Volume};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::types::AtlasResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum VolumeKind {
    Mask,
    Template,
}

/// Everything a cached volume depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub kind: VolumeKind,
    pub space_id: String,
    pub parcellation_id: Option<String>,
    pub region: Option<RegionId>,
    resolution_bits: Option<u64>,
    threshold_bits: Option<u32>,
}

impl CacheKey {
    pub fn new(
        kind: VolumeKind,
        space_id: &str,
        parcellation_id: Option<&str>,
        region: Option<RegionId>,
        resolution: Option<f64>,
        threshold: Option<f32>,
    ) -> Self {
        Self {
            kind,
            space_id: space_id.to_string(),
            parcellation_id: parcellation_id.map(str::to_string),
            region,
            resolution_bits: resolution.map(f64::to_bits),
            threshold_bits: threshold.map(f32::to_bits),
        }
    }
}

/// Bounded volume cache; cleared wholesale when full or on selection change
pub(crate) struct VolumeCache {
    entries: Mutex<AHashMap<CacheKey, Arc<Volume>>>,
    capacity: usize,
}

impl VolumeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(AHashMap::new()),
            capacity,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Volume>> {
        let volume = self.entries.lock().get(key).cloned();
        if volume.is_some() {
            debug!(kind = ?key.kind, space = %key.space_id, "Volume cache hit");
        }
        volume
    }

    /// Remember `volume` under `key` and hand out a shared copy
    pub fn insert(&self, key: CacheKey, volume: Volume) -> Arc<Volume> {
        let volume = Arc::new(volume);
        if self.capacity == 0 {
            return volume;
        }
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!("Volume cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        entries.insert(key, Arc::clone(&volume));
        volume
    }

    /// Return the cached volume, or compute and remember it
    ///
    /// With `force` the cached entry is ignored and replaced. The lock is not
    /// held while computing.
    pub fn get_or_try_insert<F>(&self, key: CacheKey, force: bool, compute: F) -> AtlasResult<Arc<Volume>>
    where
        F: FnOnce() -> AtlasResult<Volume>,
    {
        if !force {
            if let Some(volume) = self.get(&key) {
                return Ok(volume);
            }
        }
        Ok(self.insert(key, compute()?))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
