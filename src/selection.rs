//! The set of detections the user has picked.
//!
//! Indices are positions into the detection sequence of one analysis result.
//! They are not stable across re-analysis; a new result gets a new set.

use crate::error::{MooTrackError, Result};
use crate::threshold::ConfidenceFilter;
use crate::types::Detection;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selected detection indices, bounded by the size of the current result.
///
/// Backed by a `BTreeSet` so iteration is always ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionSet {
    selected: BTreeSet<usize>,
    capacity: usize,
}

impl SelectionSet {
    /// An empty selection over a result of `capacity` detections.
    pub fn new(capacity: usize) -> Self {
        Self {
            selected: BTreeSet::new(),
            capacity,
        }
    }

    /// Number of detections in the result this set indexes into.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Flip membership of `index`. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not a position in the current result.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        if index >= self.capacity {
            return Err(MooTrackError::DetectionIndexOutOfRange {
                index,
                len: self.capacity,
            });
        }
        if self.selected.remove(&index) {
            Ok(false)
        } else {
            self.selected.insert(index);
            Ok(true)
        }
    }

    /// Replace the selection with exactly the detections matching `keep`.
    ///
    /// This is a full replace, not a union: anything previously selected that
    /// does not match is dropped.
    pub fn select_all<F>(&mut self, detections: &[Detection], keep: F)
    where
        F: Fn(&Detection) -> bool,
    {
        self.selected = detections
            .iter()
            .take(self.capacity)
            .enumerate()
            .filter(|(_, det)| keep(det))
            .map(|(index, _)| index)
            .collect();
    }

    /// Select the detections currently visible under `filter`.
    pub fn select_all_filtered(&mut self, detections: &[Detection], filter: ConfidenceFilter) {
        self.select_all(detections, |det| filter.passes(det));
    }

    /// Select every index in the result.
    pub fn select_every(&mut self) {
        self.selected = (0..self.capacity).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Drop selected detections whose confidence is below `filter`.
    ///
    /// Afterwards every member satisfies `confidence >= threshold`. Returns the
    /// number of indices removed.
    pub fn prune_to_filter(&mut self, detections: &[Detection], filter: ConfidenceFilter) -> usize {
        let before = self.selected.len();
        self.selected
            .retain(|&index| detections.get(index).is_some_and(|det| filter.passes(det)));
        let removed = before - self.selected.len();
        if removed > 0 {
            debug!(
                "pruned {} selected detection(s) below {}%",
                removed,
                filter.percent()
            );
        }
        removed
    }
}
