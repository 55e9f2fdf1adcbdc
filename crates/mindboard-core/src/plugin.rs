//! The element plugin contract.
//!
//! Each element kind registers one plugin; the board routes geometry
//! queries, rendering and pointer events through it. Plugins never touch
//! the tree directly, they produce operations via `Board::apply`.

use std::any::Any;

use kurbo::{BezPath, Point, Rect};

use crate::board::Board;
use crate::element::{BoardElement, ElementId, ElementKind, ElementRef};
use crate::input::PointerInput;

/// Engine-side renderable produced by plugins.
///
/// Rasterization lives outside this crate; a renderer walks these,
/// fills/strokes the paths and recurses into `children`.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub element: ElementId,
    pub path: BezPath,
    pub fill: Option<peniko::Color>,
    pub stroke: Option<peniko::Color>,
    pub stroke_width: f64,
    pub children: Vec<RenderNode>,
}

/// Per-kind behavior contract.
pub trait ElementPlugin: Any {
    /// The element kind this plugin serves.
    fn kind(&self) -> ElementKind;

    /// Containment test for a document-space point.
    fn is_hit(&self, board: &Board, element: ElementRef<'_>, point: Point) -> bool;

    /// Translate the element, returning the replacement. `None` when the
    /// element does not move freely (mind nodes below the root).
    fn move_element(
        &self,
        board: &Board,
        element: ElementRef<'_>,
        dx: f64,
        dy: f64,
    ) -> Option<BoardElement>;

    /// Whether the element is caught by the given marquee rectangle.
    fn is_element_selected(&self, board: &Board, element: ElementRef<'_>, area: Rect) -> bool;

    /// Build the renderable for this element. `children` holds the
    /// already-rendered child fragments in document order.
    fn render(
        &self,
        board: &Board,
        element: ElementRef<'_>,
        children: Vec<RenderNode>,
    ) -> Option<RenderNode>;

    /// Pointer hooks. Return `true` to stop propagation to later plugins.
    fn on_pointer_down(&mut self, _board: &mut Board, _event: &PointerInput) -> bool {
        false
    }

    fn on_pointer_move(&mut self, _board: &mut Board, _event: &PointerInput) -> bool {
        false
    }

    /// Fired on release anywhere, including outside the canvas.
    fn on_global_pointer_up(&mut self, _board: &mut Board, _event: &PointerInput) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
