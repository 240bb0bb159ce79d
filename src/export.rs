//! Verified-results export.
//!
//! The export is a JSON document offered to the user as a download. Counts
//! partition every box the user has seen or drawn:
//!
//! - **confirmed**: selected detections that pass the confidence filter, plus
//!   every manual box
//! - **rejected**: detections that pass the filter but were left unselected
//! - **pending**: detections hidden by the filter, not yet reviewed
//!
//! so `confirmed + rejected + pending == total`.

use crate::error::Result;
use crate::selection::SelectionSet;
use crate::threshold::ConfidenceFilter;
use crate::types::{Detection, DetectionOrigin};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Review counts for the current result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub pending: usize,
    pub manual: usize,
}

impl ReviewSummary {
    /// Every detection has been either confirmed or rejected.
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }
}

/// One confirmed box in the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDetection {
    /// Position in the detector result; `None` for manual boxes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_index: Option<usize>,
    /// `[x1, y1, x2, y2]` in natural image pixels.
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub origin: DetectionOrigin,
    pub source_label: String,
}

impl ExportedDetection {
    fn from_detection(detection: &Detection, detection_index: Option<usize>) -> Self {
        Self {
            detection_index,
            bbox: detection.bbox.to_array(),
            confidence: detection.confidence,
            origin: detection.origin,
            source_label: detection.source_label.clone(),
        }
    }
}

/// The downloadable verified-results document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub image_name: String,
    pub method: String,
    pub confidence_threshold: f64,
    pub total_detections: usize,
    pub confirmed_count: usize,
    pub rejected_count: usize,
    pub pending_count: usize,
    pub manual_count: usize,
    pub verification_complete: bool,
    pub confirmed_detections: Vec<ExportedDetection>,
    pub export_timestamp: DateTime<Utc>,
}

impl ExportDocument {
    /// Serialize as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Suggested download name, dated by the export timestamp.
    pub fn file_name(&self) -> String {
        default_file_name(self.export_timestamp.date_naive())
    }

    /// Write the document to disk, overwriting any existing file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_pretty()?)?;
        info!(
            "exported {} confirmed detection(s) to {}",
            self.confirmed_count,
            path.display()
        );
        Ok(())
    }
}

/// `verified_cow_count_YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("verified_cow_count_{}.json", date.format("%Y-%m-%d"))
}

/// Borrowed view of everything an export needs.
#[derive(Debug, Clone, Copy)]
pub struct ReviewSnapshot<'a> {
    pub image_name: &'a str,
    pub method: &'a str,
    pub detections: &'a [Detection],
    pub selection: &'a SelectionSet,
    pub filter: ConfidenceFilter,
    pub manual: &'a [Detection],
}

impl ReviewSnapshot<'_> {
    fn is_confirmed(&self, index: usize, detection: &Detection) -> bool {
        self.selection.contains(index) && self.filter.passes(detection)
    }

    pub fn summary(&self) -> ReviewSummary {
        let mut summary = ReviewSummary {
            total: self.detections.len() + self.manual.len(),
            manual: self.manual.len(),
            confirmed: self.manual.len(),
            ..ReviewSummary::default()
        };
        for (index, detection) in self.detections.iter().enumerate() {
            if !self.filter.passes(detection) {
                summary.pending += 1;
            } else if self.is_confirmed(index, detection) {
                summary.confirmed += 1;
            } else {
                summary.rejected += 1;
            }
        }
        summary
    }

    /// Build the export document stamped with `timestamp`.
    pub fn export_at(&self, timestamp: DateTime<Utc>) -> ExportDocument {
        let summary = self.summary();
        let confirmed_detections = self
            .detections
            .iter()
            .enumerate()
            .filter(|(index, det)| self.is_confirmed(*index, det))
            .map(|(index, det)| ExportedDetection::from_detection(det, Some(index)))
            .chain(
                self.manual
                    .iter()
                    .map(|det| ExportedDetection::from_detection(det, None)),
            )
            .collect();

        ExportDocument {
            image_name: self.image_name.to_string(),
            method: self.method.to_string(),
            confidence_threshold: self.filter.value(),
            total_detections: summary.total,
            confirmed_count: summary.confirmed,
            rejected_count: summary.rejected,
            pending_count: summary.pending,
            manual_count: summary.manual,
            verification_complete: summary.is_complete(),
            confirmed_detections,
            export_timestamp: timestamp,
        }
    }

    /// Build the export document stamped with the current time.
    pub fn export(&self) -> ExportDocument {
        self.export_at(Utc::now())
    }
}
