//! Review session controller.
//!
//! One [`AnnotationSession`] owns all mutable state for the active image:
//! geometry, viewport, the detector result, selection, confidence filter,
//! manual boxes and the drawing gesture. The presentation layer renders from
//! [`SessionState`] and forwards UI events to the transition methods here.
//!
//! Detector replies are matched against the [`UploadToken`] issued when the
//! request started. A reply for any other token is stale and ignored, so a
//! slow response never lands on a newer image.

use crate::config::SessionConfig;
use crate::drawing::{DrawOutcome, ManualDrawer};
use crate::error::{MooTrackError, Result};
use crate::export::{ExportDocument, ReviewSnapshot, ReviewSummary};
use crate::loader::{DetectionResponse, ServiceReply};
use crate::mapping::{hit_test, to_display};
use crate::request::{validate_upload, DetectionMethod, DetectionRequest};
use crate::selection::SelectionSet;
use crate::threshold::{
    derive_filtered_detections, filtered_count, filtered_selected_count, ConfidenceBadge,
    ConfidenceFilter, ConfidenceLevel,
};
use crate::types::{BoundingBox, Detection, DetectionOrigin, ImageGeometry, Point};
use crate::viewport::{Modifiers, Viewport};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Identity of one detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadToken(u64);

/// The request currently awaiting a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveRequest {
    token: UploadToken,
    method: DetectionMethod,
}

/// A request the caller should now send to the detection service.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDetection {
    pub token: UploadToken,
    pub request: DetectionRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Dismissible message shown after an upload resolves or is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusMessage {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// What [`AnnotationSession::apply_reply`] did with a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The result is now on screen.
    Applied,
    /// The service reported an error; a status message was set.
    Failed,
    /// The reply belongs to a request that is no longer active.
    Stale,
}

/// Which gesture a pointer-down started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Drawing,
    Panning,
    None,
}

/// A box to render over the image, in display space (before zoom/pan).
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    /// Index into the detector result, or into the manual list for manual boxes.
    pub index: usize,
    pub origin: DetectionOrigin,
    pub display_bbox: BoundingBox,
    pub confidence: f64,
    pub selected: bool,
}

impl OverlayBox {
    /// Hover text, e.g. `Cow #3 - 94.0% confidence`.
    pub fn title(&self) -> String {
        match self.origin {
            DetectionOrigin::Detector => format!(
                "Cow #{} - {:.1}% confidence",
                self.index + 1,
                self.confidence * 100.0
            ),
            DetectionOrigin::Manual => format!("Manual #{}", self.index + 1),
        }
    }

    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }

    pub fn badge(&self) -> ConfidenceBadge {
        ConfidenceBadge::from_confidence(self.confidence)
    }
}

/// All review state for the active image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub image_name: Option<String>,
    pub method: DetectionMethod,
    pub loading: bool,
    pub geometry: ImageGeometry,
    pub viewport: Viewport,
    pub response: Option<DetectionResponse>,
    /// Method that produced `response`. May differ from `method` once the
    /// user picks another variant.
    pub result_method: Option<DetectionMethod>,
    pub selection: SelectionSet,
    pub filter: ConfidenceFilter,
    pub manual: Vec<Detection>,
    pub drawer: ManualDrawer,
    pub show_boxes: bool,
    pub status: Option<StatusMessage>,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            image_name: None,
            method: DetectionMethod::default(),
            loading: false,
            geometry: ImageGeometry::default(),
            viewport: Viewport::from_config(config),
            response: None,
            result_method: None,
            selection: SelectionSet::default(),
            filter: ConfidenceFilter::from_percent(config.default_confidence_percent)
                .unwrap_or(ConfidenceFilter::NONE),
            manual: Vec::new(),
            drawer: ManualDrawer::new(config.min_manual_box_size),
            show_boxes: true,
            status: None,
        }
    }
}

/// Controller for one image review session.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    config: SessionConfig,
    state: SessionState,
    next_token: u64,
    active_request: Option<ActiveRequest>,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            state: SessionState::new(&config),
            config,
            next_token: 0,
            active_request: None,
        }
    }
}

impl AnnotationSession {
    /// Create a session after validating `config`.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: SessionState::new(&config),
            config,
            next_token: 0,
            active_request: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Detector output for the current image, empty while none is shown.
    pub fn detections(&self) -> &[Detection] {
        self.state
            .response
            .as_ref()
            .map(|r| r.detections.as_slice())
            .unwrap_or(&[])
    }

    pub fn manual_detections(&self) -> &[Detection] {
        &self.state.manual
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.state.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    pub fn geometry(&self) -> &ImageGeometry {
        &self.state.geometry
    }

    pub fn filter(&self) -> ConfidenceFilter {
        self.state.filter
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.state.status.as_ref()
    }

    pub fn dismiss_status(&mut self) {
        self.state.status = None;
    }

    fn issue_token(&mut self, method: DetectionMethod) -> UploadToken {
        self.next_token += 1;
        let token = UploadToken(self.next_token);
        self.active_request = Some(ActiveRequest { token, method });
        token
    }

    fn clear_result(&mut self) {
        self.state.response = None;
        self.state.result_method = None;
        self.state.selection = SelectionSet::default();
    }

    fn clear_image_state(&mut self) {
        self.clear_result();
        self.state.geometry = ImageGeometry::default();
        self.state.viewport.reset();
        self.state.manual.clear();
        self.state.drawer.set_manual_mode(false);
        self.state.status = None;
    }

    /// Check a chosen file and start analysing it.
    ///
    /// Files over `max_upload_bytes` or without an `image/*` MIME type are
    /// refused: an error status is shown, no request is issued and the
    /// current image stays as it is.
    pub fn submit_upload(
        &mut self,
        image_name: impl Into<String>,
        size_bytes: u64,
        mime_type: &str,
    ) -> Option<PendingDetection> {
        if let Err(rejection) = validate_upload(size_bytes, mime_type, self.config.max_upload_bytes) {
            warn!("upload refused: {}", rejection);
            self.state.status = Some(StatusMessage::error(rejection.to_string()));
            return None;
        }
        Some(self.begin_upload(image_name))
    }

    /// Start analysing a newly chosen image.
    ///
    /// Geometry, viewport, selection and manual boxes are reset now, not when
    /// the reply arrives, and any request still in flight becomes stale.
    pub fn begin_upload(&mut self, image_name: impl Into<String>) -> PendingDetection {
        let image_name = image_name.into();
        self.clear_image_state();
        let token = self.issue_token(self.state.method);
        self.state.image_name = Some(image_name.clone());
        self.state.loading = true;
        debug!("upload {:?} started for {} ({})", token, image_name, self.state.method);
        PendingDetection {
            token,
            request: DetectionRequest::new(image_name, self.state.method),
        }
    }

    /// Apply the detector's reply for `token`.
    pub fn apply_reply(&mut self, token: UploadToken, reply: ServiceReply) -> ApplyOutcome {
        let method = match self.active_request {
            Some(active) if active.token == token && self.state.loading => active.method,
            _ => {
                debug!("ignoring stale reply for {:?}", token);
                return ApplyOutcome::Stale;
            }
        };
        self.state.loading = false;

        match reply {
            ServiceReply::Success(response) => {
                let found = match &response.processing_time {
                    Some(time) => format!("Found {} cow(s) in {}", response.total_cows, time),
                    None => format!("Found {} cow(s)", response.total_cows),
                };
                info!("analysis complete: {} ({} boxes)", found, response.detections.len());
                self.state.status = Some(StatusMessage::success(format!("Analysis complete! {}", found)));

                let mut selection = SelectionSet::new(response.detections.len());
                if self.config.auto_select_on_result {
                    selection.select_all_filtered(&response.detections, self.state.filter);
                }
                self.state.selection = selection;
                self.state.response = Some(response);
                self.state.result_method = Some(method);
                ApplyOutcome::Applied
            }
            ServiceReply::Failure(message) => {
                warn!("detection failed: {}", message);
                self.state.status = Some(StatusMessage::error(format!("Detection failed: {}", message)));
                ApplyOutcome::Failed
            }
        }
    }

    /// Switch detector variant. Re-runs detection on the current image when
    /// one is present and nothing is in flight.
    ///
    /// With `clear_results_on_redetect` (the default) the current result is
    /// dropped immediately; otherwise it stays on screen until the new reply
    /// resolves and survives a failed re-detection. Manual boxes belong to the
    /// image and are kept either way.
    pub fn change_method(&mut self, method: DetectionMethod) -> Option<PendingDetection> {
        self.state.method = method;
        if self.state.loading {
            return None;
        }
        let image_name = self.state.image_name.clone()?;

        if self.config.clear_results_on_redetect {
            self.clear_result();
        }
        self.state.status = None;
        let token = self.issue_token(method);
        self.state.loading = true;
        debug!("re-detecting {} with {}", image_name, method);
        Some(PendingDetection {
            token,
            request: DetectionRequest::new(image_name, method),
        })
    }

    /// Drop the image and everything derived from it.
    pub fn reset(&mut self) {
        self.clear_image_state();
        self.state.image_name = None;
        self.state.loading = false;
        self.active_request = None;
        debug!("session reset");
    }

    /// Record dimensions once the image element has loaded.
    pub fn image_loaded(
        &mut self,
        natural_width: f64,
        natural_height: f64,
        display_width: f64,
        display_height: f64,
    ) {
        self.state.geometry =
            ImageGeometry::new(natural_width, natural_height, display_width, display_height);
    }

    /// Record a new rendered size, e.g. after a window resize.
    pub fn display_resized(&mut self, display_width: f64, display_height: f64) {
        self.state.geometry.display_width = display_width;
        self.state.geometry.display_height = display_height;
    }

    pub fn set_show_boxes(&mut self, show: bool) {
        self.state.show_boxes = show;
    }

    pub fn toggle_detection(&mut self, index: usize) -> Result<bool> {
        self.state.selection.toggle(index)
    }

    /// Select exactly the detections visible under the current filter.
    pub fn select_all(&mut self) {
        let detections = self
            .state
            .response
            .as_ref()
            .map(|r| r.detections.as_slice())
            .unwrap_or(&[]);
        self.state
            .selection
            .select_all_filtered(detections, self.state.filter);
    }

    pub fn deselect_all(&mut self) {
        self.state.selection.deselect_all();
    }

    /// Change the confidence filter and prune the selection to match.
    ///
    /// Returns how many selected detections were dropped.
    pub fn set_confidence_filter(&mut self, filter: ConfidenceFilter) -> usize {
        self.state.filter = filter;
        let detections = self
            .state
            .response
            .as_ref()
            .map(|r| r.detections.as_slice())
            .unwrap_or(&[]);
        self.state.selection.prune_to_filter(detections, filter)
    }

    /// Slider variant of [`set_confidence_filter`](Self::set_confidence_filter).
    pub fn set_confidence_percent(&mut self, percent: u8) -> Result<usize> {
        let filter = ConfidenceFilter::from_percent(percent)?;
        Ok(self.set_confidence_filter(filter))
    }

    /// Detections passing the filter, with their original indices.
    pub fn filtered_detections(&self) -> Vec<(usize, &Detection)> {
        derive_filtered_detections(self.detections(), self.state.filter)
    }

    pub fn filtered_count(&self) -> usize {
        filtered_count(self.detections(), self.state.filter)
    }

    pub fn filtered_selected_count(&self) -> usize {
        filtered_selected_count(self.detections(), &self.state.selection, self.state.filter)
    }

    /// Enter or leave manual drawing mode.
    ///
    /// Drawing and panning are mutually exclusive, so entering manual mode
    /// ends any pan in progress.
    pub fn set_manual_mode(&mut self, enabled: bool) {
        if enabled {
            self.state.viewport.end_pan();
        }
        self.state.drawer.set_manual_mode(enabled);
    }

    pub fn toggle_manual_mode(&mut self) -> bool {
        let enabled = !self.state.drawer.manual_mode();
        self.set_manual_mode(enabled);
        enabled
    }

    pub fn remove_manual(&mut self, index: usize) -> Result<Detection> {
        if index >= self.state.manual.len() {
            return Err(MooTrackError::ManualIndexOutOfRange {
                index,
                len: self.state.manual.len(),
            });
        }
        Ok(self.state.manual.remove(index))
    }

    fn to_display_point(&self, screen: Point) -> Point {
        self.state
            .viewport
            .screen_to_display(screen, self.state.geometry.display_center())
    }

    /// Pointer pressed at `screen`, relative to the untransformed image box.
    ///
    /// In manual mode this starts a drawing gesture (once geometry is known)
    /// and never pans. Otherwise it starts a pan when zoomed in.
    pub fn pointer_down(&mut self, screen: Point) -> PointerTarget {
        if self.state.drawer.manual_mode() {
            if !self.state.geometry.is_ready() {
                return PointerTarget::None;
            }
            let point = self.to_display_point(screen);
            return if self.state.drawer.pointer_down(point) {
                PointerTarget::Drawing
            } else {
                PointerTarget::None
            };
        }
        if self.state.viewport.begin_pan(screen) {
            PointerTarget::Panning
        } else {
            PointerTarget::None
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if self.state.drawer.is_drawing() {
            let point = self.to_display_point(screen);
            self.state.drawer.pointer_move(point);
        } else if self.state.viewport.is_panning() {
            self.state.viewport.update_pan(screen);
        }
    }

    /// Pointer released at `screen`. Commits a manual box when one was being
    /// drawn and is large enough.
    pub fn pointer_up(&mut self, screen: Point) -> DrawOutcome {
        self.state.viewport.end_pan();
        if !self.state.drawer.is_drawing() {
            return DrawOutcome::Ignored;
        }
        let point = self.to_display_point(screen);
        self.state.drawer.pointer_move(point);
        let outcome = self.state.drawer.pointer_up(&self.state.geometry);
        if let DrawOutcome::Committed(detection) = &outcome {
            debug!("manual box committed at {:?}", detection.bbox.to_array());
            self.state.manual.push(detection.clone());
        }
        outcome
    }

    /// Abandon the box being drawn, e.g. on Escape.
    pub fn cancel_drawing(&mut self) {
        self.state.drawer.cancel();
    }

    /// Pointer left the document. Ends panning; a drawing gesture waits for
    /// the release.
    pub fn pointer_leave(&mut self) {
        self.state.viewport.end_pan();
    }

    /// Toggle the visible detection under `screen`, if any.
    ///
    /// Ignored in manual mode, where clicks belong to the drawer.
    pub fn click(&mut self, screen: Point) -> Option<(usize, bool)> {
        if self.state.drawer.manual_mode() || !self.state.show_boxes {
            return None;
        }
        let point = self.to_display_point(screen);
        let index = hit_test(point, self.filtered_detections(), &self.state.geometry)?;
        let selected = self.state.selection.toggle(index).ok()?;
        Some((index, selected))
    }

    pub fn zoom(&mut self, delta: f64) {
        self.state.viewport.zoom(delta);
    }

    pub fn zoom_in(&mut self) {
        self.state.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.state.viewport.zoom_out();
    }

    /// Returns whether the wheel event was consumed.
    pub fn wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        self.state.viewport.wheel(delta_y, modifiers)
    }

    /// Boxes to draw in the overlay layer: visible detections first, then
    /// manual boxes. Empty while boxes are hidden.
    pub fn overlay_boxes(&self) -> Vec<OverlayBox> {
        if !self.state.show_boxes {
            return Vec::new();
        }
        let geometry = &self.state.geometry;
        let detected = self.filtered_detections().into_iter().map(|(index, det)| OverlayBox {
            index,
            origin: DetectionOrigin::Detector,
            display_bbox: to_display(&det.bbox, geometry),
            confidence: det.confidence,
            selected: self.state.selection.contains(index),
        });
        let manual = self.state.manual.iter().enumerate().map(|(index, det)| OverlayBox {
            index,
            origin: DetectionOrigin::Manual,
            display_bbox: to_display(&det.bbox, geometry),
            confidence: det.confidence,
            selected: true,
        });
        detected.chain(manual).collect()
    }

    fn snapshot(&self) -> ReviewSnapshot<'_> {
        ReviewSnapshot {
            image_name: self.state.image_name.as_deref().unwrap_or_default(),
            method: self
                .state
                .result_method
                .unwrap_or(self.state.method)
                .as_query_value(),
            detections: self.detections(),
            selection: &self.state.selection,
            filter: self.state.filter,
            manual: &self.state.manual,
        }
    }

    pub fn summary(&self) -> ReviewSummary {
        self.snapshot().summary()
    }

    /// Build the verified-results document stamped with `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error when no detection result is on screen.
    pub fn export_at(&self, timestamp: DateTime<Utc>) -> Result<ExportDocument> {
        if self.state.response.is_none() {
            return Err(MooTrackError::NoActiveResult(
                "nothing to export before a detection result arrives".to_string(),
            ));
        }
        Ok(self.snapshot().export_at(timestamp))
    }

    pub fn export(&self) -> Result<ExportDocument> {
        self.export_at(Utc::now())
    }
}
