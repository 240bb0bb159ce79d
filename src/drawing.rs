//! Manual bounding box drawing.
//!
//! A click-drag gesture on the displayed image, active only in manual mode.
//! Coordinates fed to the drawer are display-space pixels; committed boxes are
//! converted to natural image space so they compose with detector output.

use crate::mapping::to_natural;
use crate::types::{BoundingBox, Detection, ImageGeometry, Point};
use log::debug;
use serde::{Deserialize, Serialize};

/// Default minimum side length (display pixels) for a manual box.
pub const DEFAULT_MIN_BOX_SIZE: f64 = 20.0;

/// The in-progress rectangle of a drawing gesture, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingBox {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl DrawingBox {
    fn at(point: Point) -> Self {
        Self {
            start_x: point.x,
            start_y: point.y,
            end_x: point.x,
            end_y: point.y,
        }
    }

    pub fn width(&self) -> f64 {
        (self.end_x - self.start_x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.end_y - self.start_y).abs()
    }

    /// Corner-normalized rectangle in display space.
    pub fn to_bbox(&self) -> BoundingBox {
        BoundingBox::new(self.start_x, self.start_y, self.end_x, self.end_y)
    }
}

/// Drawer state. Committing happens inside [`ManualDrawer::pointer_up`] and
/// never persists.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing(DrawingBox),
}

/// Result of finishing a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// A manual detection in natural image space.
    Committed(Detection),
    /// The rectangle was too small on at least one axis.
    Discarded { width: f64, height: f64 },
    /// No gesture was in progress.
    Ignored,
}

/// Click-drag state machine for user-drawn boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualDrawer {
    manual_mode: bool,
    state: DrawState,
    min_box_size: f64,
}

impl Default for ManualDrawer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BOX_SIZE)
    }
}

impl ManualDrawer {
    pub fn new(min_box_size: f64) -> Self {
        Self {
            manual_mode: false,
            state: DrawState::Idle,
            min_box_size,
        }
    }

    pub fn manual_mode(&self) -> bool {
        self.manual_mode
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing(_))
    }

    /// The rectangle being drawn, for rendering a preview.
    pub fn current_box(&self) -> Option<DrawingBox> {
        match self.state {
            DrawState::Drawing(draft) => Some(draft),
            DrawState::Idle => None,
        }
    }

    /// Enter or leave manual mode. Leaving discards any in-progress box.
    pub fn set_manual_mode(&mut self, enabled: bool) {
        if !enabled && self.is_drawing() {
            debug!("manual mode left mid-gesture, discarding draft box");
        }
        self.manual_mode = enabled;
        if !enabled {
            self.state = DrawState::Idle;
        }
    }

    /// Start a gesture. Only effective in manual mode; returns whether a
    /// gesture started.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.manual_mode {
            return false;
        }
        self.state = DrawState::Drawing(DrawingBox::at(point));
        true
    }

    /// Track the pointer while the button is held.
    pub fn pointer_move(&mut self, point: Point) {
        if let DrawState::Drawing(ref mut draft) = self.state {
            draft.end_x = point.x;
            draft.end_y = point.y;
        }
    }

    /// Finish the gesture and return to idle.
    ///
    /// Boxes with either side `<= min_box_size` display pixels are discarded.
    pub fn pointer_up(&mut self, geometry: &ImageGeometry) -> DrawOutcome {
        let DrawState::Drawing(draft) = std::mem::take(&mut self.state) else {
            return DrawOutcome::Ignored;
        };

        let (width, height) = (draft.width(), draft.height());
        if width <= self.min_box_size || height <= self.min_box_size {
            debug!("discarding manual box {:.1}x{:.1} (min {})", width, height, self.min_box_size);
            return DrawOutcome::Discarded { width, height };
        }

        let natural = to_natural(&draft.to_bbox(), geometry);
        DrawOutcome::Committed(Detection::manual(natural))
    }

    /// Abandon any in-progress gesture without committing.
    pub fn cancel(&mut self) {
        self.state = DrawState::Idle;
    }
}
