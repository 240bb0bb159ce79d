//! Confidence filtering.
//!
//! The filtered views are recomputed from `(detections, filter)` on every
//! call; nothing here caches.

use crate::error::{MooTrackError, Result};
use crate::selection::SelectionSet;
use crate::types::Detection;
use serde::{Deserialize, Serialize};

/// Minimum confidence for a detection to be shown and bulk-selectable.
///
/// Stored as a fraction in `[0, 1]`; the UI slider works in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct ConfidenceFilter(f64);

impl ConfidenceFilter {
    /// A filter that lets every detection through.
    pub const NONE: ConfidenceFilter = ConfidenceFilter(0.0);

    /// Create a filter from a fraction in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold is outside `[0, 1]` or not a number.
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self(threshold))
    }

    /// Create a filter from a slider percentage (0-100).
    ///
    /// # Example
    ///
    /// ```
    /// use mootrack::threshold::ConfidenceFilter;
    ///
    /// let filter = ConfidenceFilter::from_percent(70).unwrap();
    /// assert!((filter.value() - 0.7).abs() < 1e-12);
    /// assert_eq!(filter.percent(), 70);
    /// ```
    pub fn from_percent(percent: u8) -> Result<Self> {
        if percent > 100 {
            return Err(MooTrackError::InvalidThreshold(format!(
                "Percentage must be between 0 and 100, got {}",
                percent,
            )));
        }
        Ok(Self(f64::from(percent) / 100.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// The threshold as a whole percentage for display.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }

    /// Whether a detection meets the threshold (`confidence >= threshold`).
    pub fn passes(&self, detection: &Detection) -> bool {
        detection.confidence >= self.0
    }
}

/// Detections meeting the filter, paired with their index in the full result.
///
/// # Example
///
/// ```
/// use mootrack::threshold::{derive_filtered_detections, ConfidenceFilter};
/// use mootrack::types::{BoundingBox, Detection};
///
/// let detections = vec![
///     Detection::new(BoundingBox::new(10.0, 10.0, 50.0, 50.0), 0.95, "yolo"),
///     Detection::new(BoundingBox::new(60.0, 60.0, 100.0, 100.0), 0.5, "yolo"),
/// ];
/// let visible = derive_filtered_detections(&detections, ConfidenceFilter::from_percent(70).unwrap());
/// assert_eq!(visible.len(), 1);
/// assert_eq!(visible[0].0, 0);
/// ```
pub fn derive_filtered_detections(
    detections: &[Detection],
    filter: ConfidenceFilter,
) -> Vec<(usize, &Detection)> {
    detections
        .iter()
        .enumerate()
        .filter(|(_, det)| filter.passes(det))
        .collect()
}

/// Number of detections meeting the filter.
pub fn filtered_count(detections: &[Detection], filter: ConfidenceFilter) -> usize {
    detections.iter().filter(|det| filter.passes(det)).count()
}

/// Number of selected detections that also meet the filter.
pub fn filtered_selected_count(
    detections: &[Detection],
    selection: &SelectionSet,
    filter: ConfidenceFilter,
) -> usize {
    selection
        .iter()
        .filter(|&index| detections.get(index).is_some_and(|det| filter.passes(det)))
        .count()
}

/// Coarse confidence tier used for badges and legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Above 0.7 is high, above 0.4 medium, anything else low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceLevel::High
        } else if confidence > 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

/// Colour bucket for a detection's confidence chip in the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBadge {
    /// `>= 0.9`
    Confirmed,
    /// `>= 0.8`
    Pending,
    Rejected,
}

impl ConfidenceBadge {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceBadge::Confirmed
        } else if confidence >= 0.8 {
            ConfidenceBadge::Pending
        } else {
            ConfidenceBadge::Rejected
        }
    }

    /// Theme colour token, e.g. `cow-confirmed`.
    pub fn color_token(self) -> &'static str {
        match self {
            ConfidenceBadge::Confirmed => "cow-confirmed",
            ConfidenceBadge::Pending => "cow-pending",
            ConfidenceBadge::Rejected => "cow-rejected",
        }
    }
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MooTrackError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold,
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn sample() -> Vec<Detection> {
        vec![
            Detection::new(BoundingBox::new(10.0, 20.0, 30.0, 40.0), 0.9, "yolo"),
            Detection::new(BoundingBox::new(50.0, 60.0, 70.0, 80.0), 0.3, "yolo"),
            Detection::new(BoundingBox::new(5.0, 5.0, 15.0, 15.0), 0.5, "yolo"),
        ]
    }

    #[test]
    fn test_filter_preserves_original_indices() {
        let detections = sample();
        let filtered = derive_filtered_detections(&detections, ConfidenceFilter::new(0.5).unwrap());
        let indices: Vec<usize> = filtered.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let detections = sample();
        assert_eq!(filtered_count(&detections, ConfidenceFilter::from_percent(50).unwrap()), 2);
        assert_eq!(filtered_count(&detections, ConfidenceFilter::from_percent(51).unwrap()), 1);
        assert_eq!(filtered_count(&detections, ConfidenceFilter::NONE), 3);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(ConfidenceFilter::new(1.5).is_err());
        assert!(ConfidenceFilter::new(-0.1).is_err());
        assert!(ConfidenceFilter::new(f64::NAN).is_err());
        assert!(ConfidenceFilter::from_percent(101).is_err());
    }

    #[test]
    fn test_filtered_selected_count() {
        let detections = sample();
        let mut selection = SelectionSet::new(detections.len());
        selection.select_every();
        let filter = ConfidenceFilter::from_percent(50).unwrap();
        assert_eq!(filtered_selected_count(&detections, &selection, filter), 2);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_confidence(0.94), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.7), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.41), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Medium.as_str(), "medium");
    }

    #[test]
    fn test_confidence_badges() {
        assert_eq!(ConfidenceBadge::from_confidence(0.9), ConfidenceBadge::Confirmed);
        assert_eq!(ConfidenceBadge::from_confidence(0.85), ConfidenceBadge::Pending);
        assert_eq!(ConfidenceBadge::from_confidence(0.79), ConfidenceBadge::Rejected);
        assert_eq!(ConfidenceBadge::Pending.color_token(), "cow-pending");
    }
}
