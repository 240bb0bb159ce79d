//! Statistics tracking for detector payload ingestion
//!
//! Malformed detection entries are dropped rather than failing the whole
//! response; these counters record what was dropped and why.

use serde::{Deserialize, Serialize};

/// Counters collected while normalizing one detector response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestStats {
    /// Total number of detection entries in the payload
    pub total_entries: usize,

    /// Entries whose bbox was neither a corner array nor a center/size object
    pub skipped_malformed_bbox: usize,

    /// Entries whose bbox had non-finite coordinates or zero area
    pub skipped_degenerate_bbox: usize,

    /// Entries with a missing or out-of-range confidence
    pub skipped_invalid_confidence: usize,

    /// Entries delivered in center/size form and converted to corners
    pub converted_center_size: usize,
}

impl IngestStats {
    /// Create a new `IngestStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self) {
        self.total_entries += 1;
    }

    pub fn skip_malformed_bbox(&mut self) {
        self.skipped_malformed_bbox += 1;
    }

    pub fn skip_degenerate_bbox(&mut self) {
        self.skipped_degenerate_bbox += 1;
    }

    pub fn skip_invalid_confidence(&mut self) {
        self.skipped_invalid_confidence += 1;
    }

    pub fn record_center_size(&mut self) {
        self.converted_center_size += 1;
    }

    /// Number of entries that survived normalization
    pub fn accepted(&self) -> usize {
        self.total_entries.saturating_sub(self.total_skipped())
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_malformed_bbox + self.skipped_degenerate_bbox + self.skipped_invalid_confidence
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "IngestStats {{ total: {}, accepted: {}, skipped: {}, center_size: {} }}",
            self.total_entries,
            self.accepted(),
            self.total_skipped(),
            self.converted_center_size
        )
    }
}
