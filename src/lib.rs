//! # mootrack
//!
//! Bounding-box geometry and interaction engine for reviewing cow detections
//! on a single image.
//!
//! A detection service returns boxes in the image's natural pixel space. The
//! image is rendered scaled down, and the user can zoom, pan, confirm or
//! reject individual detections, hide low-confidence ones, and draw missing
//! boxes by hand. This crate keeps all of that state consistent:
//!
//! - **Coordinate mapping** between natural and display space
//! - **Viewport** zoom/pan with a forward and inverse screen transform
//! - **Selection** of detections, kept consistent with the confidence filter
//! - **Manual drawing** of boxes, stored in natural space
//! - **Payload normalization** of corner and center/size box formats
//! - **Export** of the verified results as a JSON document
//!
//! ## Quick Start
//!
//! ```rust
//! use mootrack::loader::parse_response;
//! use mootrack::session::{AnnotationSession, ApplyOutcome};
//! use mootrack::types::Point;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = AnnotationSession::default();
//! let pending = session.begin_upload("pasture.jpg");
//! session.image_loaded(1600.0, 1200.0, 800.0, 600.0);
//!
//! // Send `pending.request` to the service, then hand back the reply body
//! let reply = parse_response(r#"{
//!     "total_cows": 1,
//!     "detections": [{ "bbox": [200, 200, 400, 500], "confidence": 0.94 }]
//! }"#)?;
//! assert_eq!(session.apply_reply(pending.token, reply), ApplyOutcome::Applied);
//!
//! // Clicking the box in display space rejects it
//! session.click(Point::new(150.0, 150.0));
//! assert_eq!(session.summary().rejected, 1);
//!
//! let document = session.export()?;
//! println!("{}", document.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reply format
//!
//! Each detection's `bbox` may be a corner array or a center/size object:
//!
//! ```json
//! {
//!   "total_cows": 2,
//!   "method": "enhanced",
//!   "processing_time": "1.2s",
//!   "detections": [
//!     { "bbox": [120, 180, 340, 420], "confidence": 0.94, "model": "YOLOv8" },
//!     { "bbox": { "x": 80, "y": 80, "width": 40, "height": 40 }, "confidence": 0.61 }
//!   ]
//! }
//! ```

pub mod config;
pub mod drawing;
pub mod error;
pub mod export;
pub mod loader;
pub mod mapping;
pub mod request;
pub mod selection;
pub mod session;
pub mod stats;
pub mod threshold;
pub mod types;
pub mod viewport;

// Re-export commonly used types and functions
pub use config::{load_config_from_file, load_config_from_str, SessionConfig};
pub use drawing::{DrawOutcome, ManualDrawer};
pub use error::{MooTrackError, Result};
pub use export::{ExportDocument, ReviewSummary};
pub use loader::{load_response_from_file, parse_response, DetectionResponse, ServiceReply};
pub use mapping::{hit_test, to_display, to_natural};
pub use request::{DetectionMethod, DetectionRequest};
pub use selection::SelectionSet;
pub use session::{AnnotationSession, ApplyOutcome, PendingDetection, UploadToken};
pub use threshold::{derive_filtered_detections, ConfidenceFilter};
pub use types::{BoundingBox, Detection, DetectionOrigin, ImageGeometry, Point};
pub use viewport::{Modifiers, Viewport};
