//! Core data types for detections, image geometry and points.

use serde::{Deserialize, Serialize};

/// A 2D point in pixel units.
///
/// Which space the point lives in (natural image, display, or screen) is up to
/// the caller; functions that convert between spaces say so in their names.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// An axis-aligned bounding box in corner form (x1, y1, x2, y2).
///
/// Stored boxes always satisfy `x1 <= x2` and `y1 <= y2`. Detections keep their
/// boxes in natural image pixels; display-space boxes only exist transiently
/// while rendering or drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from two opposite corners.
    ///
    /// The corners may be given in any order; they are normalized so that
    /// `(x1, y1)` is the top-left corner.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Create a bounding box from a center point and a size.
    ///
    /// ```
    /// use mootrack::types::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_center_size(50.0, 40.0, 20.0, 10.0);
    /// assert_eq!(bbox, BoundingBox::new(40.0, 35.0, 60.0, 45.0));
    /// ```
    pub fn from_center_size(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    /// Create a bounding box from a `[x1, y1, x2, y2]` array.
    pub fn from_corners_array(corners: [f64; 4]) -> Self {
        Self::new(corners[0], corners[1], corners[2], corners[3])
    }

    /// Corner form as an array, the shape used on the wire and in exports.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Get the width (x2 - x1).
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Get the height (y2 - y1).
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Whether the point lies inside the box, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    /// Check if the bounding box is valid (finite coordinates, positive area).
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }
}

/// Where a detection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionOrigin {
    Detector,
    Manual,
}

/// Source label attached to user-drawn boxes.
pub const MANUAL_SOURCE_LABEL: &str = "manual";

/// One bounding box with confidence.
///
/// Detections are immutable once received. Whether a detection is selected is
/// tracked by [`SelectionSet`](crate::selection::SelectionSet), not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box in natural image pixels.
    pub bbox: BoundingBox,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub source_label: String,
    pub origin: DetectionOrigin,
}

impl Detection {
    /// Create a detector-produced detection.
    pub fn new(bbox: BoundingBox, confidence: f64, source_label: impl Into<String>) -> Self {
        Self {
            bbox,
            confidence,
            source_label: source_label.into(),
            origin: DetectionOrigin::Detector,
        }
    }

    /// Create a user-drawn detection. Confidence is fixed at 1.0.
    pub fn manual(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            confidence: 1.0,
            source_label: MANUAL_SOURCE_LABEL.to_string(),
            origin: DetectionOrigin::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.origin == DetectionOrigin::Manual
    }
}

/// Natural and displayed pixel dimensions of the active image.
///
/// Natural dimensions are captured once the image finishes loading. Display
/// dimensions change whenever the rendered element is resized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub natural_width: f64,
    pub natural_height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl ImageGeometry {
    pub fn new(natural_width: f64, natural_height: f64, display_width: f64, display_height: f64) -> Self {
        Self {
            natural_width,
            natural_height,
            display_width,
            display_height,
        }
    }

    /// All four dimensions are known and positive.
    pub fn is_ready(&self) -> bool {
        self.natural_width > 0.0
            && self.natural_height > 0.0
            && self.display_width > 0.0
            && self.display_height > 0.0
    }

    /// Horizontal natural-to-display factor, or `None` before the image has loaded.
    pub fn scale_x(&self) -> Option<f64> {
        self.is_ready().then(|| self.display_width / self.natural_width)
    }

    /// Vertical natural-to-display factor, or `None` before the image has loaded.
    pub fn scale_y(&self) -> Option<f64> {
        self.is_ready().then(|| self.display_height / self.natural_height)
    }

    /// Centre of the displayed image, used as the zoom transform origin.
    pub fn display_center(&self) -> Point {
        Point::new(self.display_width / 2.0, self.display_height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let bbox = BoundingBox::new(50.0, 60.0, 10.0, 20.0);
        assert_eq!(bbox.to_array(), [10.0, 20.0, 50.0, 60.0]);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 40.0);
    }

    #[test]
    fn test_center_size_negative_extent() {
        let bbox = BoundingBox::from_center_size(10.0, 10.0, -4.0, 2.0);
        assert_eq!(bbox.to_array(), [8.0, 9.0, 12.0, 11.0]);
    }

    #[test]
    fn test_contains_edges() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains(Point::new(10.0, 0.0)));
        assert!(!bbox.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_manual_detection_fields() {
        let det = Detection::manual(BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(det.confidence, 1.0);
        assert!(det.is_manual());
        assert_eq!(det.source_label, "manual");
    }

    #[test]
    fn test_geometry_not_ready() {
        let geometry = ImageGeometry::new(0.0, 0.0, 800.0, 600.0);
        assert!(!geometry.is_ready());
        assert_eq!(geometry.scale_x(), None);
    }
}
