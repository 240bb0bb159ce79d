//! Coordinate mapping between natural image space and display space.
//!
//! Display space is the image as rendered by the browser after CSS scaling,
//! before any zoom or pan is applied. Zoom and pan live in
//! [`viewport`](crate::viewport).

use crate::types::{BoundingBox, Detection, ImageGeometry, Point};

/// Scale a natural-space bounding box into display space.
///
/// Before the image has loaded (any dimension is zero) the box is returned
/// unchanged, so overlays render at native pixel values until geometry is known.
///
/// # Example
///
/// ```
/// use mootrack::mapping::to_display;
/// use mootrack::types::{BoundingBox, ImageGeometry};
///
/// let geometry = ImageGeometry::new(1600.0, 1200.0, 800.0, 600.0);
/// let bbox = BoundingBox::new(200.0, 200.0, 400.0, 500.0);
/// assert_eq!(to_display(&bbox, &geometry), BoundingBox::new(100.0, 100.0, 200.0, 250.0));
/// ```
pub fn to_display(bbox: &BoundingBox, geometry: &ImageGeometry) -> BoundingBox {
    match (geometry.scale_x(), geometry.scale_y()) {
        (Some(sx), Some(sy)) => BoundingBox::new(bbox.x1 * sx, bbox.y1 * sy, bbox.x2 * sx, bbox.y2 * sy),
        _ => *bbox,
    }
}

/// Scale a display-space bounding box back into natural image space.
///
/// Inverse of [`to_display`], with the same identity fallback.
pub fn to_natural(bbox: &BoundingBox, geometry: &ImageGeometry) -> BoundingBox {
    match (geometry.scale_x(), geometry.scale_y()) {
        (Some(sx), Some(sy)) => BoundingBox::new(bbox.x1 / sx, bbox.y1 / sy, bbox.x2 / sx, bbox.y2 / sy),
        _ => *bbox,
    }
}

/// Scale a natural-space point into display space.
pub fn point_to_display(point: Point, geometry: &ImageGeometry) -> Point {
    match (geometry.scale_x(), geometry.scale_y()) {
        (Some(sx), Some(sy)) => Point::new(point.x * sx, point.y * sy),
        _ => point,
    }
}

/// Scale a display-space point into natural space.
pub fn point_to_natural(point: Point, geometry: &ImageGeometry) -> Point {
    match (geometry.scale_x(), geometry.scale_y()) {
        (Some(sx), Some(sy)) => Point::new(point.x / sx, point.y / sy),
        _ => point,
    }
}

/// Find the first candidate whose displayed box contains a display-space point.
///
/// Candidates are `(index, detection)` pairs so callers can pass a filtered
/// view; the matching pair's index is returned.
pub fn hit_test<'a, I>(point: Point, candidates: I, geometry: &ImageGeometry) -> Option<usize>
where
    I: IntoIterator<Item = (usize, &'a Detection)>,
{
    candidates
        .into_iter()
        .find(|(_, det)| to_display(&det.bbox, geometry).contains(point))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_scale() -> ImageGeometry {
        ImageGeometry::new(1600.0, 1200.0, 800.0, 600.0)
    }

    #[test]
    fn test_to_display_half_scale() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let scaled = to_display(&bbox, &half_scale());
        assert_eq!(scaled.to_array(), [5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_to_natural_inverts() {
        let bbox = BoundingBox::new(100.0, 100.0, 200.0, 250.0);
        let natural = to_natural(&bbox, &half_scale());
        assert_eq!(natural.to_array(), [200.0, 200.0, 400.0, 500.0]);
    }

    #[test]
    fn test_identity_before_load() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let geometry = ImageGeometry::new(0.0, 0.0, 800.0, 600.0);
        assert_eq!(to_display(&bbox, &geometry), bbox);
        assert_eq!(to_natural(&bbox, &geometry), bbox);

        let no_display = ImageGeometry::new(1600.0, 1200.0, 0.0, 0.0);
        assert_eq!(to_display(&bbox, &no_display), bbox);
    }

    #[test]
    fn test_non_uniform_scale() {
        let geometry = ImageGeometry::new(100.0, 200.0, 50.0, 50.0);
        let bbox = BoundingBox::new(0.0, 0.0, 100.0, 200.0);
        assert_eq!(to_display(&bbox, &geometry).to_array(), [0.0, 0.0, 50.0, 50.0]);
    }

    #[test]
    fn test_point_round_trip() {
        let p = Point::new(123.0, 77.0);
        let back = point_to_natural(point_to_display(p, &half_scale()), &half_scale());
        assert!((back.x - p.x).abs() < 1e-10);
        assert!((back.y - p.y).abs() < 1e-10);
    }

    #[test]
    fn test_hit_test_first_match() {
        let detections = vec![
            Detection::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0.9, "m"),
            Detection::new(BoundingBox::new(50.0, 50.0, 200.0, 200.0), 0.8, "m"),
        ];
        // (40, 40) in display is (80, 80) natural: inside both, first wins
        let all = || detections.iter().enumerate();
        assert_eq!(hit_test(Point::new(40.0, 40.0), all(), &half_scale()), Some(0));
        assert_eq!(hit_test(Point::new(90.0, 90.0), all(), &half_scale()), Some(1));
        assert_eq!(hit_test(Point::new(300.0, 300.0), all(), &half_scale()), None);

        // Skipping the first candidate exposes the one underneath
        assert_eq!(hit_test(Point::new(40.0, 40.0), all().skip(1), &half_scale()), Some(1));
    }
}
