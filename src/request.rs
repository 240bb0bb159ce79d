//! Detection request parameters.
//!
//! The HTTP transport lives outside this crate; these types describe what it
//! sends so the session can track which method produced the current result.

use crate::error::{MooTrackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest image the service accepts, 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Why a chosen file was not sent for detection. The messages are shown to
/// the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("File size must be less than {}MB. Please choose a smaller image.", mebibytes(.limit))]
    TooLarge { size: u64, limit: u64 },

    #[error("Please select a valid image file (JPG, JPEG, or PNG).")]
    NotAnImage { mime_type: String },
}

fn mebibytes(bytes: &u64) -> u64 {
    bytes / (1024 * 1024)
}

/// Check a file before uploading it. Size is tested before type.
///
/// ```
/// use mootrack::request::{validate_upload, UploadRejection, DEFAULT_MAX_UPLOAD_BYTES};
///
/// assert!(validate_upload(2_000_000, "image/jpeg", DEFAULT_MAX_UPLOAD_BYTES).is_ok());
/// assert!(matches!(
///     validate_upload(1_000, "application/pdf", DEFAULT_MAX_UPLOAD_BYTES),
///     Err(UploadRejection::NotAnImage { .. })
/// ));
/// ```
pub fn validate_upload(
    size_bytes: u64,
    mime_type: &str,
    max_bytes: u64,
) -> std::result::Result<(), UploadRejection> {
    if size_bytes > max_bytes {
        return Err(UploadRejection::TooLarge {
            size: size_bytes,
            limit: max_bytes,
        });
    }
    if !mime_type.starts_with("image/") {
        return Err(UploadRejection::NotAnImage {
            mime_type: mime_type.to_string(),
        });
    }
    Ok(())
}

/// Detector variant selected in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    #[default]
    Enhanced,
    Ultra,
}

impl DetectionMethod {
    /// Value of the `detection_method` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            DetectionMethod::Enhanced => "enhanced",
            DetectionMethod::Ultra => "ultra",
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            DetectionMethod::Enhanced => "Enhanced Detection",
            DetectionMethod::Ultra => "Ultra Precision",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for DetectionMethod {
    type Err = MooTrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enhanced" => Ok(DetectionMethod::Enhanced),
            "ultra" => Ok(DetectionMethod::Ultra),
            other => Err(MooTrackError::InvalidMethod(format!(
                "'{other}'; expected 'enhanced' or 'ultra'"
            ))),
        }
    }
}

/// Path of the upload endpoint, relative to the configured base URL.
pub const DETECT_ENDPOINT: &str = "/cow_counter/detect/file";

/// One request to the detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub filename: String,
    pub method: DetectionMethod,
    /// Optional confidence floor forwarded to the detector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DetectionRequest {
    pub fn new(filename: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            filename: filename.into(),
            method,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Query parameters in the order the service expects them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("filename", self.filename.clone()),
            ("detection_method", self.method.as_query_value().to_string()),
        ];
        if let Some(confidence) = self.confidence {
            pairs.push(("confidence", confidence.to_string()));
        }
        pairs
    }

    /// Endpoint URL without the query string.
    pub fn endpoint(&self, api_base_url: &str) -> String {
        format!("{}{}", api_base_url.trim_end_matches('/'), DETECT_ENDPOINT)
    }
}
