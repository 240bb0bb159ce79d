//! Walk through a review session: analyse, filter, draw a missed cow, export.

use mootrack::{
    drawing::DrawOutcome, parse_response, AnnotationSession, DetectionMethod, Modifiers, Point,
    SessionConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== MooTrack Review Session ===\n");

    let mut session = AnnotationSession::new(SessionConfig::default())?;

    // 1. Upload and detection request
    println!("1. Upload");
    let pending = session.begin_upload("north_paddock.jpg");
    let config = session.config();
    println!(
        "   POST {}?{}",
        pending.request.endpoint(&config.api_base_url),
        pending
            .request
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    );
    session.image_loaded(1600.0, 1200.0, 800.0, 600.0);
    println!();

    // 2. Apply the service reply
    println!("2. Detector Reply");
    let reply = parse_response(
        r#"{
            "total_cows": 3,
            "method": "enhanced",
            "processing_time": 1.4,
            "detections": [
                { "bbox": [120, 180, 340, 420], "confidence": 0.94, "model": "YOLOv8-Enhanced" },
                { "bbox": { "x": 900, "y": 500, "width": 220, "height": 160 }, "confidence": 0.81 },
                { "bbox": [1300, 900, 1420, 1010], "confidence": 0.42 }
            ]
        }"#,
    )?;
    session.apply_reply(pending.token, reply);
    if let Some(status) = session.status() {
        println!("   {}", status.message);
    }
    for overlay in session.overlay_boxes() {
        println!("   {} at {:?}", overlay.title(), overlay.display_bbox.to_array());
    }
    println!();

    // 3. Filter out weak detections
    println!("3. Confidence Filter");
    let pruned = session.set_confidence_percent(50)?;
    println!(
        "   {} of {} visible, {} selected ({} pruned)",
        session.filtered_count(),
        session.detections().len(),
        session.filtered_selected_count(),
        pruned
    );
    println!();

    // 4. Zoom in and draw a missed cow
    println!("4. Manual Annotation");
    session.wheel(-50.0, Modifiers::CTRL);
    println!("   Zoom {}%: {}", session.viewport().zoom_percent(), session.viewport().transform().css());
    session.set_manual_mode(true);
    session.pointer_down(Point::new(500.0, 100.0));
    session.pointer_move(Point::new(560.0, 150.0));
    match session.pointer_up(Point::new(620.0, 200.0)) {
        DrawOutcome::Committed(detection) => {
            println!("   Added manual box {:?} (natural pixels)", detection.bbox.to_array())
        }
        DrawOutcome::Discarded { width, height } => {
            println!("   Box {:.0}x{:.0} too small, discarded", width, height)
        }
        DrawOutcome::Ignored => println!("   No gesture in progress"),
    }
    session.set_manual_mode(false);
    println!();

    // 5. Summary and export
    println!("5. Export");
    let summary = session.summary();
    println!(
        "   confirmed {} / rejected {} / pending {} (manual {})",
        summary.confirmed, summary.rejected, summary.pending, summary.manual
    );
    let document = session.export()?;
    println!("   {}", document.file_name());
    println!("{}", document.to_json_pretty()?);

    // Switching method re-runs detection on the same image
    if let Some(next) = session.change_method(DetectionMethod::Ultra) {
        println!("\nRe-detecting with {}", next.request.method.as_label());
    }

    Ok(())
}
