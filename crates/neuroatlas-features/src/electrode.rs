// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! iEEG electrodes and their contact points.

use ahash::AHashMap;
use neuroatlas_atlas::Feature;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{FeatureError, FeatureResult};

/// Modality of [`ContactPoint`] features
pub const CONTACT_POINT_MODALITY: &str = "IEEG_ContactPoint";

/// Modality of [`Electrode`] features
pub const ELECTRODE_MODALITY: &str = "IEEG_Electrode";

#[derive(Debug, Clone, PartialEq)]
struct ContactEntry {
    id: String,
    coord: [f64; 3],
}

/// An implanted electrode with its ordered contact points
#[derive(Debug, Clone)]
pub struct Electrode {
    id: String,
    subject_id: String,
    dataset_id: String,
    space: String,
    contacts: Vec<ContactEntry>,
    index: AHashMap<String, usize>,
}

impl Electrode {
    pub fn new(
        id: impl Into<String>,
        subject_id: impl Into<String>,
        dataset_id: impl Into<String>,
        space: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            dataset_id: dataset_id.into(),
            space: space.into(),
            contacts: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Append a contact point
    ///
    /// # Errors
    /// `DuplicateContactPoint` if `id` is already registered; the electrode
    /// is left unchanged.
    pub fn add_contact_point(&mut self, id: impl Into<String>, coord: [f64; 3]) -> FeatureResult<()> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(FeatureError::DuplicateContactPoint {
                subject: self.subject_id.clone(),
                electrode: self.id.clone(),
                contact: id,
            });
        }
        self.index.insert(id.clone(), self.contacts.len());
        self.contacts.push(ContactEntry { id, coord });
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Knowledge graph dataset the recordings belong to
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    /// Space the contact coordinates are given in
    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contact point ids in insertion order
    pub fn contact_ids(&self) -> impl Iterator<Item = &str> {
        self.contacts.iter().map(|c| c.id.as_str())
    }

    /// Coordinates of all contact points in insertion order
    pub fn locations(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.contacts.iter().map(|c| c.coord)
    }

    pub fn contact_point(self: &Arc<Self>, id: &str) -> Option<ContactPoint> {
        self.index.get(id).map(|&position| ContactPoint {
            electrode: Arc::clone(self),
            position,
        })
    }

    /// Iterate the contact points from the first one. Every call starts over.
    pub fn contact_points(self: &Arc<Self>) -> ContactPoints {
        ContactPoints {
            electrode: Arc::clone(self),
            next: 0,
        }
    }

    fn contact_at(self: &Arc<Self>, position: usize) -> Option<ContactPoint> {
        (position < self.contacts.len()).then(|| ContactPoint {
            electrode: Arc::clone(self),
            position,
        })
    }
}

impl fmt::Display for Electrode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Electrode {} of {} with {} contact points (dataset:{})",
            self.id,
            self.subject_id,
            self.contacts.len(),
            self.dataset_id
        )
    }
}

impl Feature for Electrode {
    fn modality(&self) -> &str {
        ELECTRODE_MODALITY
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Iterator over the contact points of an electrode
#[derive(Debug, Clone)]
pub struct ContactPoints {
    electrode: Arc<Electrode>,
    next: usize,
}

impl Iterator for ContactPoints {
    type Item = ContactPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let contact = self.electrode.contact_at(self.next)?;
        self.next += 1;
        Some(contact)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.electrode.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ContactPoints {}

/// One recording contact of an electrode
#[derive(Debug, Clone)]
pub struct ContactPoint {
    electrode: Arc<Electrode>,
    position: usize,
}

impl ContactPoint {
    fn entry(&self) -> &ContactEntry {
        &self.electrode.contacts[self.position]
    }

    pub fn id(&self) -> &str {
        &self.entry().id
    }

    /// Location in the electrode's space
    pub fn coord(&self) -> [f64; 3] {
        self.entry().coord
    }

    pub fn electrode(&self) -> &Arc<Electrode> {
        &self.electrode
    }

    /// Following contact point of the same electrode
    pub fn next_contact(&self) -> Option<ContactPoint> {
        self.electrode.contact_at(self.position + 1)
    }

    /// Preceding contact point of the same electrode
    pub fn prev_contact(&self) -> Option<ContactPoint> {
        let position = self.position.checked_sub(1)?;
        self.electrode.contact_at(position)
    }
}

impl PartialEq for ContactPoint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.electrode, &other.electrode) && self.position == other.position
    }
}

impl fmt::Display for ContactPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.coord();
        write!(
            f,
            "Contact point {} of electrode {} ({}) at ({:.2}, {:.2}, {:.2})",
            self.id(),
            self.electrode.id,
            self.electrode.subject_id,
            x,
            y,
            z
        )
    }
}

impl Feature for ContactPoint {
    fn modality(&self) -> &str {
        CONTACT_POINT_MODALITY
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn electrode() -> Arc<Electrode> {
        let mut electrode = Electrode::new("A", "sub01", "dataset", "mni152");
        electrode.add_contact_point("1", [0.0, 0.0, 0.0]).unwrap();
        electrode.add_contact_point("2", [1.0, 0.0, 0.0]).unwrap();
        electrode.add_contact_point("3", [2.0, 0.0, 0.0]).unwrap();
        Arc::new(electrode)
    }

    #[test]
    fn test_duplicate_contact_rejected() {
        let mut electrode = Electrode::new("A", "sub01", "dataset", "mni152");
        electrode.add_contact_point("1", [0.0; 3]).unwrap();
        let err = electrode.add_contact_point("1", [1.0; 3]).unwrap_err();
        assert!(matches!(err, FeatureError::DuplicateContactPoint { .. }));
        assert_eq!(electrode.len(), 1);
        assert_eq!(electrode.locations().next(), Some([0.0; 3]));
    }

    #[test]
    fn test_iteration_restarts() {
        let electrode = electrode();
        let first: Vec<String> = electrode.contact_points().map(|c| c.id().to_string()).collect();
        let second: Vec<String> = electrode.contact_points().map(|c| c.id().to_string()).collect();
        assert_eq!(first, vec!["1", "2", "3"]);
        assert_eq!(first, second);
        assert_eq!(electrode.contact_points().len(), 3);
    }

    #[test]
    fn test_neighbours() {
        let electrode = electrode();
        let middle = electrode.contact_point("2").unwrap();
        assert_eq!(middle.next_contact().unwrap().id(), "3");
        assert_eq!(middle.prev_contact().unwrap().id(), "1");

        let first = electrode.contact_point("1").unwrap();
        assert!(first.prev_contact().is_none());
        let last = electrode.contact_point("3").unwrap();
        assert!(last.next_contact().is_none());
        assert_eq!(last.prev_contact().unwrap(), middle);
    }

    #[test]
    fn test_display() {
        let electrode = electrode();
        assert_eq!(
            electrode.to_string(),
            "Electrode A of sub01 with 3 contact points (dataset:dataset)"
        );
        assert_eq!(
            electrode.contact_point("2").unwrap().to_string(),
            "Contact point 2 of electrode A (sub01) at (1.00, 0.00, 0.00)"
        );
        assert_eq!(electrode.modality(), ELECTRODE_MODALITY);
    }
}
