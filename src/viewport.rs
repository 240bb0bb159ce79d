//! Zoom and pan over the displayed image.
//!
//! The same affine transform is applied to the image element and to the
//! overlay layer holding the boxes, so both stay pixel-aligned. The transform
//! is `scale(s) translate(pan / s)` with its origin at the image centre, which
//! maps a display-space point `p` to
//! `screen = origin + s * (p - origin) + pan`.

use crate::config::SessionConfig;
use crate::types::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Keyboard modifiers held during a wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        meta: false,
        shift: false,
        alt: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// The composed transform in the form the renderer applies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Transform {
    /// CSS `transform` value for the image and overlay layers.
    pub fn css(&self) -> String {
        format!(
            "scale({}) translate({}px, {}px)",
            self.scale, self.translate_x, self.translate_y
        )
    }
}

/// Zoom scale and pan offset for the active image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom_scale: f64,
    pan_offset: Point,
    #[serde(skip)]
    pan_anchor: Option<Point>,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    wheel_sensitivity: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl Viewport {
    /// Build a viewport at native zoom using the configured bounds.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            zoom_scale: config.min_zoom,
            pan_offset: Point::ZERO,
            pan_anchor: None,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom.max(config.min_zoom),
            zoom_step: config.zoom_step,
            wheel_sensitivity: config.wheel_sensitivity,
        }
    }

    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    pub fn pan_offset(&self) -> Point {
        self.pan_offset
    }

    /// A pan gesture is in progress.
    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Zoomed in past native scale, so panning is allowed.
    pub fn is_zoomed(&self) -> bool {
        self.zoom_scale > self.min_zoom
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom_scale < self.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.is_zoomed()
    }

    /// Zoom as a rounded percentage, e.g. `150` for 1.5x.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom_scale * 100.0).round() as u32
    }

    /// Change the zoom scale by `delta`, clamped to the configured bounds.
    ///
    /// Returning to native scale recentres the image and ends any pan.
    /// Inverted bounds resolve to `min_zoom`.
    pub fn zoom(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.zoom_scale = (self.zoom_scale + delta).min(self.max_zoom).max(self.min_zoom);
        if self.zoom_scale == self.min_zoom {
            self.pan_offset = Point::ZERO;
            self.pan_anchor = None;
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom(-self.zoom_step);
    }

    /// Handle a wheel event. Only zooms while ctrl/cmd is held so plain
    /// scrolling still scrolls the page.
    ///
    /// Returns `true` when the event was consumed and the caller should
    /// suppress the default scroll.
    pub fn wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        if !modifiers.command() {
            return false;
        }
        self.zoom(delta_y * -self.wheel_sensitivity);
        true
    }

    /// Start a pan gesture at `pointer`. Ignored at native zoom.
    pub fn begin_pan(&mut self, pointer: Point) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.pan_anchor = Some(pointer - self.pan_offset);
        true
    }

    /// Move the pan to follow `pointer`.
    ///
    /// The offset is recomputed from the anchor each time, never accumulated.
    pub fn update_pan(&mut self, pointer: Point) {
        if let Some(anchor) = self.pan_anchor {
            if self.is_zoomed() {
                self.pan_offset = pointer - anchor;
            }
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    /// Back to native scale, centred.
    pub fn reset(&mut self) {
        self.zoom_scale = self.min_zoom;
        self.pan_offset = Point::ZERO;
        self.pan_anchor = None;
    }

    pub fn transform(&self) -> Transform {
        Transform {
            scale: self.zoom_scale,
            translate_x: self.pan_offset.x / self.zoom_scale,
            translate_y: self.pan_offset.y / self.zoom_scale,
        }
    }

    /// Map a display-space point to where it appears on screen, relative to
    /// the untransformed element. `origin` is the transform origin (the
    /// displayed image centre).
    pub fn display_to_screen(&self, point: Point, origin: Point) -> Point {
        let s = self.zoom_scale;
        Point::new(
            origin.x + s * (point.x - origin.x) + self.pan_offset.x,
            origin.y + s * (point.y - origin.y) + self.pan_offset.y,
        )
    }

    /// Inverse of [`display_to_screen`](Self::display_to_screen).
    pub fn screen_to_display(&self, point: Point, origin: Point) -> Point {
        let s = self.zoom_scale;
        Point::new(
            origin.x + (point.x - self.pan_offset.x - origin.x) / s,
            origin.y + (point.y - self.pan_offset.y - origin.y) / s,
        )
    }

    /// Where a display-space box lands on screen under the current zoom/pan.
    pub fn place(&self, bbox: &BoundingBox, origin: Point) -> BoundingBox {
        let top_left = self.display_to_screen(Point::new(bbox.x1, bbox.y1), origin);
        let bottom_right = self.display_to_screen(Point::new(bbox.x2, bbox.y2), origin);
        BoundingBox::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }
}
