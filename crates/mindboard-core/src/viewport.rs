//! Viewport module for pan/zoom transforms.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;

/// ViewPort manages the visible window onto the document.
///
/// `min_x`/`min_y` is the document-space point at the top-left corner of
/// the canvas; `width`/`height` are the visible extent in document units.
/// Screen coordinates are canvas-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPort {
    /// Document-space x of the canvas top-left corner
    pub min_x: f64,
    /// Document-space y of the canvas top-left corner
    pub min_y: f64,
    /// Visible width in document units
    pub width: f64,
    /// Visible height in document units
    pub height: f64,
    /// Current zoom level (1.0 = 100%)
    pub zoom: f64,
}

impl Default for ViewPort {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: 0.0,
            height: 0.0,
            zoom: 1.0,
        }
    }
}

impl ViewPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a canvas-local screen point to document coordinates.
    pub fn screen_to_viewport(&self, screen_point: Point) -> Point {
        Point::new(
            screen_point.x / self.zoom + self.min_x,
            screen_point.y / self.zoom + self.min_y,
        )
    }

    /// Convert a document point to canvas-local screen coordinates.
    pub fn viewport_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            (world_point.x - self.min_x) * self.zoom,
            (world_point.y - self.min_y) * self.zoom,
        )
    }

    /// The visible document region.
    pub fn visible_rect(&self) -> Rect {
        Rect::new(
            self.min_x,
            self.min_y,
            self.min_x + self.width,
            self.min_y + self.height,
        )
    }

    /// Pan the viewport by a delta in document units.
    pub fn pan(&mut self, delta: Vec2) {
        self.min_x += delta.x;
        self.min_y += delta.y;
    }

    /// Zoom, keeping the given screen point fixed over the same
    /// document point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let anchor = self.screen_to_viewport(screen_point);
        let scale = self.zoom / new_zoom;
        self.width *= scale;
        self.height *= scale;
        self.zoom = new_zoom;

        // Shift so the anchor stays under the screen point
        let moved = self.screen_to_viewport(screen_point);
        self.min_x += anchor.x - moved.x;
        self.min_y += anchor.y - moved.y;
    }
}
