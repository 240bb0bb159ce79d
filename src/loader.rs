//! Parsing of detection service replies.
//!
//! The service delivers boxes either as a corner array `[x1, y1, x2, y2]` or
//! as a center/size object `{x, y, width, height}` where `(x, y)` is the box
//! centre. Both are accepted here and normalized once into corner form; nothing
//! downstream branches on the wire shape again.
//!
//! Individual detection entries that cannot be normalized are dropped with a
//! warning. Only a reply that is not JSON (or not an object) is an error.

use crate::error::Result;
use crate::stats::IngestStats;
use crate::types::{BoundingBox, Detection};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Label used when neither the entry nor the reply names a model.
pub const DEFAULT_SOURCE_LABEL: &str = "detector";

/// Bounding box as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBoundingBox {
    /// `[x1, y1, x2, y2]`
    Corners([f64; 4]),
    /// Centre point plus size.
    CenterSize { x: f64, y: f64, width: f64, height: f64 },
}

impl WireBoundingBox {
    /// Normalize into the canonical corner form.
    pub fn into_bounding_box(self) -> BoundingBox {
        match self {
            WireBoundingBox::Corners(corners) => BoundingBox::from_corners_array(corners),
            WireBoundingBox::CenterSize { x, y, width, height } => {
                BoundingBox::from_center_size(x, y, width, height)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    bbox: Value,
    #[serde(default)]
    confidence: Value,
    #[serde(default)]
    model: Value,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    total_cows: Option<usize>,
    #[serde(default)]
    detections: Option<Vec<Value>>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    processing_time: Option<Value>,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    analysis_complete: Option<bool>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    detail: Option<Value>,
}

/// A successful detection result, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    /// Count reported by the service. May differ from `detections.len()` when
    /// entries were dropped.
    pub total_cows: usize,
    /// Detections in natural image space, in the order the service sent them.
    pub detections: Vec<Detection>,
    pub method: String,
    pub message: Option<String>,
    pub processing_time: Option<String>,
    pub image_path: Option<String>,
    pub analysis_complete: Option<bool>,
    pub model_version: Option<String>,
    pub stats: IngestStats,
}

/// What the detection service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply {
    Success(DetectionResponse),
    /// Error text, surfaced to the user verbatim.
    Failure(String),
}

impl ServiceReply {
    /// A failure raised by the transport rather than the service.
    pub fn failure(message: impl Into<String>) -> Self {
        ServiceReply::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceReply::Success(_))
    }
}

/// Parse a reply body from a JSON string.
///
/// # Errors
///
/// Returns an error if the body is not a JSON object.
///
/// # Example
///
/// ```
/// use mootrack::loader::{parse_response, ServiceReply};
///
/// let json = r#"{
///     "total_cows": 2,
///     "method": "enhanced",
///     "detections": [
///         { "bbox": [10, 10, 50, 50], "confidence": 0.95 },
///         { "bbox": { "x": 80, "y": 80, "width": 40, "height": 40 }, "confidence": 0.5 }
///     ]
/// }"#;
/// let ServiceReply::Success(response) = parse_response(json).unwrap() else {
///     panic!("expected success");
/// };
/// assert_eq!(response.detections[1].bbox.to_array(), [60.0, 60.0, 100.0, 100.0]);
/// ```
pub fn parse_response(json_str: &str) -> Result<ServiceReply> {
    let value: Value = serde_json::from_str(json_str)?;
    parse_response_value(value)
}

/// Parse a reply body that has already been decoded into a JSON value.
pub fn parse_response_value(value: Value) -> Result<ServiceReply> {
    let reply: WireReply = serde_json::from_value(value)?;

    if is_truthy(&reply.error) {
        return Ok(ServiceReply::Failure(detail_text(reply.error)));
    }
    if reply.detections.is_none() {
        if let Some(detail) = reply.detail {
            return Ok(ServiceReply::Failure(detail_text(detail)));
        }
    }

    let method = reply.method.unwrap_or_default();
    let mut stats = IngestStats::new();
    let detections: Vec<Detection> = reply
        .detections
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| normalize_entry(index, entry, &method, &mut stats))
        .collect();

    if stats.total_skipped() > 0 {
        warn!(
            "dropped {} of {} detection(s) from reply: {}",
            stats.total_skipped(),
            stats.total_entries,
            stats.summary_string()
        );
    } else {
        debug!("ingested {}", stats.summary_string());
    }

    Ok(ServiceReply::Success(DetectionResponse {
        total_cows: reply.total_cows.unwrap_or(detections.len()),
        detections,
        method,
        message: reply.message,
        processing_time: reply.processing_time.map(processing_time_text),
        image_path: reply.image_path,
        analysis_complete: reply.analysis_complete,
        model_version: reply.model_version,
        stats,
    }))
}

/// Load a reply body from a JSON file, e.g. saved sample results.
pub fn load_response_from_file<P: AsRef<Path>>(path: P) -> Result<ServiceReply> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value: Value = serde_json::from_reader(reader)?;
    parse_response_value(value)
}

fn normalize_entry(
    index: usize,
    entry: Value,
    method: &str,
    stats: &mut IngestStats,
) -> Option<Detection> {
    stats.add_entry();

    let wire: WireDetection = match serde_json::from_value(entry) {
        Ok(wire) => wire,
        Err(e) => {
            warn!("detection {}: unrecognized entry ({})", index, e);
            stats.skip_malformed_bbox();
            return None;
        }
    };

    let shape: WireBoundingBox = match serde_json::from_value(wire.bbox) {
        Ok(shape) => shape,
        Err(_) => {
            warn!(
                "detection {}: bbox is neither [x1, y1, x2, y2] nor {{x, y, width, height}}",
                index
            );
            stats.skip_malformed_bbox();
            return None;
        }
    };
    if matches!(shape, WireBoundingBox::CenterSize { .. }) {
        stats.record_center_size();
    }

    let bbox = shape.into_bounding_box();
    if !bbox.is_valid() {
        warn!("detection {}: degenerate bbox {:?}", index, bbox.to_array());
        stats.skip_degenerate_bbox();
        return None;
    }

    let confidence = match wire.confidence.as_f64() {
        Some(c) if (0.0..=1.0).contains(&c) => c,
        _ => {
            warn!("detection {}: invalid confidence {}", index, wire.confidence);
            stats.skip_invalid_confidence();
            return None;
        }
    };

    let source_label = wire
        .model
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| (!method.is_empty()).then(|| method.to_string()))
        .unwrap_or_else(|| DEFAULT_SOURCE_LABEL.to_string());

    Some(Detection::new(bbox, confidence, source_label))
}

/// An `error` field only marks a failure when it carries something: `null`,
/// `false`, `0` and `""` do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn detail_text(detail: Value) -> String {
    match detail {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn processing_time_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Number(seconds) => format!("{}s", seconds),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(json: &str) -> DetectionResponse {
        match parse_response(json).unwrap() {
            ServiceReply::Success(response) => response,
            ServiceReply::Failure(msg) => panic!("unexpected failure: {}", msg),
        }
    }

    #[test]
    fn test_corner_and_center_forms() {
        let response = success(
            r#"{
                "total_cows": 2,
                "method": "Enhanced Detection",
                "detections": [
                    { "bbox": [120, 180, 340, 420], "confidence": 0.94, "model": "YOLOv8-Enhanced" },
                    { "bbox": { "x": 50, "y": 50, "width": 20, "height": 10 }, "confidence": 0.5 }
                ]
            }"#,
        );
        assert_eq!(response.detections.len(), 2);
        assert_eq!(response.detections[0].bbox.to_array(), [120.0, 180.0, 340.0, 420.0]);
        assert_eq!(response.detections[0].source_label, "YOLOv8-Enhanced");
        assert_eq!(response.detections[1].bbox.to_array(), [40.0, 45.0, 60.0, 55.0]);
        assert_eq!(response.detections[1].source_label, "Enhanced Detection");
        assert_eq!(response.stats.converted_center_size, 1);
    }

    #[test]
    fn test_malformed_entry_dropped() {
        let response = success(
            r#"{
                "total_cows": 3,
                "detections": [
                    { "bbox": [10, 10, 50, 50], "confidence": 0.9 },
                    { "bbox": [1, 2, 3], "confidence": 0.9 },
                    { "bbox": "oops", "confidence": 0.9 },
                    "not an object"
                ]
            }"#,
        );
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.total_cows, 3);
        assert_eq!(response.stats.skipped_malformed_bbox, 3);
        assert_eq!(response.detections[0].source_label, DEFAULT_SOURCE_LABEL);
    }

    #[test]
    fn test_invalid_confidence_dropped() {
        let response = success(
            r#"{ "detections": [
                { "bbox": [0, 0, 10, 10], "confidence": 1.5 },
                { "bbox": [0, 0, 10, 10] },
                { "bbox": [0, 0, 10, 10], "confidence": 0.0 }
            ] }"#,
        );
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.stats.skipped_invalid_confidence, 2);
        assert_eq!(response.total_cows, 1);
    }

    #[test]
    fn test_error_payloads() {
        assert_eq!(
            parse_response(r#"{ "error": "model not loaded" }"#).unwrap(),
            ServiceReply::Failure("model not loaded".to_string())
        );
        assert_eq!(
            parse_response(r#"{ "detail": "Invalid detection method specified" }"#).unwrap(),
            ServiceReply::Failure("Invalid detection method specified".to_string())
        );
    }

    #[test]
    fn test_empty_error_is_not_failure() {
        let reply = parse_response(
            r#"{ "error": "", "total_cows": 1, "detections": [
                { "bbox": [10, 10, 50, 50], "confidence": 0.9 }
            ] }"#,
        )
        .unwrap();
        assert!(reply.is_success());
        assert!(parse_response(r#"{ "error": null, "detections": [] }"#).unwrap().is_success());
        assert!(parse_response(r#"{ "error": false, "detections": [] }"#).unwrap().is_success());
    }

    #[test]
    fn test_non_numeric_confidence_counted_as_confidence() {
        let response = success(
            r#"{ "detections": [
                { "bbox": [10, 10, 50, 50], "confidence": "0.9" },
                { "bbox": [10, 10, 50, 50], "confidence": null },
                { "bbox": [10, 10, 50, 50], "confidence": 0.9, "model": 7 }
            ] }"#,
        );
        assert_eq!(response.stats.skipped_invalid_confidence, 2);
        assert_eq!(response.stats.skipped_malformed_bbox, 0);
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.detections[0].source_label, DEFAULT_SOURCE_LABEL);
    }

    #[test]
    fn test_processing_time_number() {
        let response = success(r#"{ "detections": [], "processing_time": 2.5 }"#);
        assert_eq!(response.processing_time.as_deref(), Some("2.5s"));
    }

    #[test]
    fn test_not_json() {
        assert!(parse_response("{ invalid json").is_err());
        assert!(parse_response("[1, 2, 3]").is_err());
    }
}
