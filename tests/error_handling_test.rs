//! Error handling and validation tests.

use mootrack::config::{load_config_from_file, load_config_from_str, SessionConfig};
use mootrack::error::MooTrackError;
use mootrack::loader::{load_response_from_file, parse_response, ServiceReply};
use mootrack::selection::SelectionSet;
use mootrack::session::AnnotationSession;
use mootrack::session::StatusKind;
use mootrack::threshold::ConfidenceFilter;
use std::fs;

// ============================================================================
// Reply Parsing Errors
// ============================================================================

#[test]
fn test_invalid_json() {
    let result = parse_response("{ invalid json }");
    assert!(matches!(result, Err(MooTrackError::JsonError(_))));
}

#[test]
fn test_reply_not_an_object() {
    assert!(parse_response("42").is_err());
    assert!(parse_response("\"ok\"").is_err());
    assert!(parse_response("null").is_err());
}

#[test]
fn test_wrong_field_types() {
    // A reply whose top-level fields have the wrong type is rejected as a whole
    let result = parse_response(r#"{ "total_cows": "two", "detections": [] }"#);
    assert!(result.is_err());
}

#[test]
fn test_detections_not_array() {
    let result = parse_response(r#"{ "detections": { "bbox": [0, 0, 1, 1] } }"#);
    assert!(result.is_err());
}

#[test]
fn test_error_field_wins_over_detections() {
    let reply = parse_response(r#"{ "error": "GPU out of memory", "detections": [] }"#).unwrap();
    assert_eq!(reply, ServiceReply::Failure("GPU out of memory".to_string()));
}

#[test]
fn test_structured_detail() {
    let reply = parse_response(r#"{ "detail": [{ "msg": "field required" }] }"#).unwrap();
    match reply {
        ServiceReply::Failure(message) => assert!(message.contains("field required")),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_detail_ignored_when_detections_present() {
    let reply = parse_response(r#"{ "detail": "note", "detections": [] }"#).unwrap();
    assert!(reply.is_success());
}

// ============================================================================
// File I/O Errors
// ============================================================================

#[test]
fn test_missing_response_file() {
    let result = load_response_from_file("/nonexistent/reply.json");
    assert!(matches!(result, Err(MooTrackError::IoError(_))));
}

#[test]
fn test_response_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reply.json");
    fs::write(
        &path,
        r#"{ "total_cows": 1, "detections": [{ "bbox": [1, 2, 30, 40], "confidence": 0.8 }] }"#,
    )
    .unwrap();

    let reply = load_response_from_file(&path).unwrap();
    let ServiceReply::Success(response) = reply else {
        panic!("expected success");
    };
    assert_eq!(response.detections[0].bbox.to_array(), [1.0, 2.0, 30.0, 40.0]);
}

#[test]
fn test_missing_config_file() {
    let result = load_config_from_file("/nonexistent/mootrack.json");
    assert!(matches!(result, Err(MooTrackError::IoError(_))));
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mootrack.json");
    let config = SessionConfig {
        max_zoom: 6.0,
        default_confidence_percent: 55,
        ..SessionConfig::default()
    };
    config.save_to_path(&path).unwrap();
    assert_eq!(load_config_from_file(&path).unwrap(), config);
}

// ============================================================================
// Config Validation
// ============================================================================

#[test]
fn test_config_rejects_inverted_zoom() {
    let result = load_config_from_str(r#"{ "min_zoom": 3.0, "max_zoom": 2.0 }"#);
    assert!(matches!(result, Err(MooTrackError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_bad_values() {
    for json in [
        r#"{ "min_zoom": 0.0 }"#,
        r#"{ "zoom_step": 0.0 }"#,
        r#"{ "wheel_sensitivity": -1.0 }"#,
        r#"{ "min_manual_box_size": -5.0 }"#,
        r#"{ "default_confidence_percent": 150 }"#,
        r#"{ "api_base_url": "  " }"#,
    ] {
        let result = load_config_from_str(json);
        assert!(
            matches!(result, Err(MooTrackError::InvalidConfig(_))),
            "{} should be rejected, got {:?}",
            json,
            result
        );
    }
}

#[test]
fn test_config_unknown_type() {
    let result = load_config_from_str(r#"{ "max_zoom": "big" }"#);
    assert!(matches!(result, Err(MooTrackError::JsonError(_))));
}

#[test]
fn test_session_rejects_invalid_config() {
    let config = SessionConfig {
        zoom_step: -1.0,
        ..SessionConfig::default()
    };
    assert!(AnnotationSession::new(config).is_err());
}

// ============================================================================
// Threshold Validation
// ============================================================================

#[test]
fn test_filter_out_of_range() {
    assert!(matches!(
        ConfidenceFilter::new(1.5),
        Err(MooTrackError::InvalidThreshold(_))
    ));
    assert!(ConfidenceFilter::new(-0.1).is_err());
    assert!(ConfidenceFilter::new(f64::NAN).is_err());
    assert!(ConfidenceFilter::from_percent(101).is_err());
}

#[test]
fn test_threshold_error_messages() {
    let err = ConfidenceFilter::new(1.5).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid threshold: Threshold must be between 0.0 and 1.0, got 1.5"
    );
    let err = ConfidenceFilter::from_percent(101).unwrap_err();
    assert!(err.to_string().ends_with("Percentage must be between 0 and 100, got 101"));
}

#[test]
fn test_filter_boundaries() {
    assert!(ConfidenceFilter::new(0.0).is_ok());
    assert!(ConfidenceFilter::new(1.0).is_ok());
    assert!(ConfidenceFilter::from_percent(100).is_ok());
}

#[test]
fn test_session_rejects_bad_percent() {
    let mut session = AnnotationSession::default();
    assert!(session.set_confidence_percent(120).is_err());
    assert_eq!(session.filter(), ConfidenceFilter::NONE);
}

// ============================================================================
// Upload Validation
// ============================================================================

#[test]
fn test_oversized_upload_refused() {
    let mut session = AnnotationSession::default();
    let pending = session.submit_upload("drone_shot.png", 60 * 1024 * 1024, "image/png");
    assert!(pending.is_none());
    assert!(!session.is_loading());
    assert!(session.state().image_name.is_none());

    let status = session.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(
        status.message,
        "File size must be less than 50MB. Please choose a smaller image."
    );
}

#[test]
fn test_non_image_upload_refused() {
    let mut session = AnnotationSession::default();
    assert!(session.submit_upload("herd.pdf", 1024, "application/pdf").is_none());
    assert!(!session.is_loading());
    assert_eq!(
        session.status().unwrap().message,
        "Please select a valid image file (JPG, JPEG, or PNG)."
    );
}

#[test]
fn test_refused_upload_keeps_current_image() {
    let mut session = AnnotationSession::default();
    let first = session.submit_upload("pasture.jpg", 2_000_000, "image/jpeg").unwrap();

    // A bad file while the first is analysing leaves that request active
    assert!(session.submit_upload("notes.txt", 10, "text/plain").is_none());
    assert!(session.is_loading());
    assert_eq!(session.state().image_name.as_deref(), Some("pasture.jpg"));

    let reply = parse_response(r#"{ "detections": [{ "bbox": [0, 0, 40, 40], "confidence": 0.9 }] }"#)
        .unwrap();
    assert!(reply.is_success());
    assert_eq!(session.apply_reply(first.token, reply), mootrack::ApplyOutcome::Applied);
}

#[test]
fn test_configured_upload_limit() {
    let config = load_config_from_str(r#"{ "max_upload_bytes": 1000 }"#).unwrap();
    let mut session = AnnotationSession::new(config).unwrap();
    assert!(session.submit_upload("a.jpg", 1000, "image/jpeg").is_some());
    assert!(session.submit_upload("b.jpg", 1001, "image/jpeg").is_none());
    assert_eq!(
        session.status().unwrap().message,
        "File size must be less than 0MB. Please choose a smaller image."
    );
}

#[test]
fn test_zero_upload_limit_rejected() {
    let result = load_config_from_str(r#"{ "max_upload_bytes": 0 }"#);
    assert!(matches!(result, Err(MooTrackError::InvalidConfig(_))));
}

// ============================================================================
// Index Errors
// ============================================================================

#[test]
fn test_toggle_out_of_range() {
    let mut selection = SelectionSet::new(2);
    let result = selection.toggle(5);
    assert!(matches!(
        result,
        Err(MooTrackError::DetectionIndexOutOfRange { index: 5, len: 2 })
    ));
    assert!(selection.is_empty());
}

#[test]
fn test_toggle_without_result() {
    let mut session = AnnotationSession::default();
    assert!(session.toggle_detection(0).is_err());
}

#[test]
fn test_error_messages() {
    let err = MooTrackError::DetectionIndexOutOfRange { index: 3, len: 2 };
    assert_eq!(
        err.to_string(),
        "Detection index 3 out of range (result has 2 detections)"
    );
    let err = MooTrackError::InvalidConfig("max_zoom too small".to_string());
    assert_eq!(err.to_string(), "Invalid config: max_zoom too small");
}
