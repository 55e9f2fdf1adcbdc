//! Arrow element and its curve geometry.

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{ElementId, SerializableColor};
use crate::geometry;

/// Marker size in document units; marked curve ends are pulled back by
/// this much so the head sits on the node boundary.
pub const ARROW_SIZE: f64 = 10.0;

/// Pointer slack around the polyline for hit testing, in document units.
pub const ARROW_HIT_TOLERANCE: f64 = 4.0;

/// End decoration of an arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    #[default]
    None,
    Arrow,
}

/// A connector drawn as chained cubic beziers through its points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowElement {
    pub id: ElementId,
    pub points: Vec<Point>,
    pub line_width: f64,
    pub line_color: SerializableColor,
    pub source_marker: MarkerKind,
    pub target_marker: MarkerKind,
}

impl ArrowElement {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            line_width: 2.0,
            line_color: SerializableColor::BLACK,
            source_marker: MarkerKind::None,
            target_marker: MarkerKind::Arrow,
        }
    }

    /// The curve through all points.
    ///
    /// Each consecutive pair becomes one cubic segment. On the dominant
    /// axis the control points sit at 25% and 75% of the span, each at
    /// its endpoint's cross-axis coordinate, which gives the flat-out,
    /// flat-in S shape. Ends carrying a marker are inset by
    /// [`ARROW_SIZE`] along the dominant axis. Coincident pairs are
    /// skipped rather than emitting a degenerate segment.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if self.points.len() < 2 {
            return path;
        }

        let last_pair = self.points.len() - 2;
        let mut started = false;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let w = b.x - a.x;
            let h = b.y - a.y;
            if w.abs() < f64::EPSILON && h.abs() < f64::EPSILON {
                continue;
            }

            let inset_start = i == 0 && self.source_marker != MarkerKind::None;
            let inset_end = i == last_pair && self.target_marker != MarkerKind::None;

            let (start, end, control1, control2) = if w.abs() >= h.abs() {
                let offset = ARROW_SIZE * w.signum();
                let start = if inset_start {
                    Point::new(a.x + offset, a.y)
                } else {
                    a
                };
                let end = if inset_end {
                    Point::new(b.x - offset, b.y)
                } else {
                    b
                };
                (
                    start,
                    end,
                    Point::new(a.x + w * 0.25, a.y),
                    Point::new(a.x + w * 0.75, b.y),
                )
            } else {
                let offset = ARROW_SIZE * h.signum();
                let start = if inset_start {
                    Point::new(a.x, a.y + offset)
                } else {
                    a
                };
                let end = if inset_end {
                    Point::new(b.x, b.y - offset)
                } else {
                    b
                };
                (
                    start,
                    end,
                    Point::new(a.x, a.y + h * 0.25),
                    Point::new(b.x, a.y + h * 0.75),
                )
            };

            if !started {
                path.move_to(start);
                started = true;
            }
            path.curve_to(control1, control2, end);
        }
        path
    }

    /// Bounding box of the control polyline.
    pub fn bounds(&self) -> Rect {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        let mut rect = Rect::from_points(*first, *first);
        for point in points {
            rect = rect.union_pt(*point);
        }
        rect
    }

    /// Whether the point is within `tolerance` of the polyline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.line_width / 2.0;
        self.points
            .windows(2)
            .any(|pair| geometry::point_to_segment_distance(point, pair[0], pair[1]) <= reach)
    }

    /// Whether any segment of the polyline touches the rectangle.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        self.points
            .windows(2)
            .any(|pair| geometry::segment_intersects_rect(pair[0], pair[1], rect))
    }
}
