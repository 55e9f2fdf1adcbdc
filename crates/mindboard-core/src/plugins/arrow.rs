//! Arrow plugin. Thin: the curve math lives on the element.

use std::any::Any;

use kurbo::{Point, Rect};

use crate::arrow::ARROW_HIT_TOLERANCE;
use crate::board::Board;
use crate::element::{BoardElement, ElementKind, ElementRef};
use crate::plugin::{ElementPlugin, RenderNode};

#[derive(Debug, Default)]
pub struct ArrowPlugin;

impl ArrowPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl ElementPlugin for ArrowPlugin {
    fn kind(&self) -> ElementKind {
        ElementKind::Arrow
    }

    fn is_hit(&self, _board: &Board, element: ElementRef<'_>, point: Point) -> bool {
        match element {
            ElementRef::Arrow(arrow) => arrow.hit_test(point, ARROW_HIT_TOLERANCE),
            _ => false,
        }
    }

    fn move_element(
        &self,
        _board: &Board,
        element: ElementRef<'_>,
        dx: f64,
        dy: f64,
    ) -> Option<BoardElement> {
        let ElementRef::Arrow(arrow) = element else {
            return None;
        };
        let mut moved = arrow.clone();
        for point in &mut moved.points {
            point.x += dx;
            point.y += dy;
        }
        Some(BoardElement::Arrow(moved))
    }

    fn is_element_selected(&self, _board: &Board, element: ElementRef<'_>, area: Rect) -> bool {
        match element {
            ElementRef::Arrow(arrow) => arrow.intersects_rect(area),
            _ => false,
        }
    }

    fn render(
        &self,
        _board: &Board,
        element: ElementRef<'_>,
        children: Vec<RenderNode>,
    ) -> Option<RenderNode> {
        let ElementRef::Arrow(arrow) = element else {
            return None;
        };
        Some(RenderNode {
            element: arrow.id,
            path: arrow.to_path(),
            fill: None,
            stroke: Some(arrow.line_color.into()),
            stroke_width: arrow.line_width,
            children,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::ArrowElement;

    fn horizontal_arrow() -> ArrowElement {
        ArrowElement::new(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)])
    }

    #[test]
    fn test_hit_near_polyline() {
        let board = Board::new();
        let plugin = ArrowPlugin::new();
        let arrow = horizontal_arrow();
        assert!(plugin.is_hit(&board, ElementRef::Arrow(&arrow), Point::new(50.0, 3.0)));
        assert!(!plugin.is_hit(&board, ElementRef::Arrow(&arrow), Point::new(50.0, 30.0)));
    }

    #[test]
    fn test_move_translates_every_point() {
        let board = Board::new();
        let plugin = ArrowPlugin::new();
        let arrow = horizontal_arrow();
        let moved = plugin
            .move_element(&board, ElementRef::Arrow(&arrow), 10.0, -5.0)
            .unwrap();
        let moved = moved.as_arrow().unwrap();
        assert!((moved.points[0].x - 10.0).abs() < f64::EPSILON);
        assert!((moved.points[1].y + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_strokes_without_fill() {
        let board = Board::new();
        let plugin = ArrowPlugin::new();
        let arrow = horizontal_arrow();
        let rendered = plugin
            .render(&board, ElementRef::Arrow(&arrow), Vec::new())
            .unwrap();
        assert!(rendered.fill.is_none());
        assert!(rendered.stroke.is_some());
        assert!((rendered.stroke_width - arrow.line_width).abs() < f64::EPSILON);
        assert!(!rendered.path.elements().is_empty());
    }

    #[test]
    fn test_marquee_selection_by_intersection() {
        let board = Board::new();
        let plugin = ArrowPlugin::new();
        let arrow = horizontal_arrow();
        assert!(plugin.is_element_selected(
            &board,
            ElementRef::Arrow(&arrow),
            Rect::new(40.0, -10.0, 60.0, 10.0),
        ));
        assert!(!plugin.is_element_selected(
            &board,
            ElementRef::Arrow(&arrow),
            Rect::new(0.0, 50.0, 100.0, 80.0),
        ));
    }
}
