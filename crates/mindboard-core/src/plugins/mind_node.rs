//! Mind node plugin: hit testing, rendering and the drag gesture.

use std::any::Any;

use kurbo::{BezPath, Point, Rect, RoundedRect, Shape};

use crate::board::Board;
use crate::element::{BoardElement, ElementKind, ElementRef};
use crate::input::PointerInput;
use crate::mind::drag::DragController;
use crate::mind::node::MindNodeElement;
use crate::mind::tree;
use crate::plugin::{ElementPlugin, RenderNode};

const CORNER_RADIUS: f64 = 6.0;
const BORDER_WIDTH: f64 = 1.0;

/// Serves every mind node, root or nested. Pointer events feed the
/// drag-to-reparent gesture.
#[derive(Default)]
pub struct MindNodePlugin {
    drag: DragController,
}

impl MindNodePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }
}

/// Connector from a parent's attach edge to a child's near edge, flat
/// at both ends like the arrow curves.
fn connector(from: Point, to: Point) -> (Point, Point) {
    let w = to.x - from.x;
    (
        Point::new(from.x + w * 0.25, from.y),
        Point::new(from.x + w * 0.75, to.y),
    )
}

fn node_path(node: &MindNodeElement) -> BezPath {
    let mut path = RoundedRect::from_rect(node.bounds(), CORNER_RADIUS).to_path(0.1);
    for child in &node.children {
        if node.fold_for(child.side()) {
            continue;
        }
        let (from, to) = match child.side() {
            crate::element::Direction::Right => (
                Point::new(node.x + node.width, node.y + node.height / 2.0),
                Point::new(child.x, child.y + child.height / 2.0),
            ),
            crate::element::Direction::Left => (
                Point::new(node.x, node.y + node.height / 2.0),
                Point::new(child.x + child.width, child.y + child.height / 2.0),
            ),
        };
        let (c1, c2) = connector(from, to);
        path.move_to(from);
        path.curve_to(c1, c2, to);
    }
    path
}

impl ElementPlugin for MindNodePlugin {
    fn kind(&self) -> ElementKind {
        ElementKind::MindNode
    }

    fn is_hit(&self, _board: &Board, element: ElementRef<'_>, point: Point) -> bool {
        element
            .as_mind_node()
            .is_some_and(|node| node.hit_test(point))
    }

    /// Only whole trees move freely; non-root nodes relocate through the
    /// drag gesture instead.
    fn move_element(
        &self,
        _board: &Board,
        element: ElementRef<'_>,
        dx: f64,
        dy: f64,
    ) -> Option<BoardElement> {
        let node = element.as_mind_node()?;
        if !node.is_root() {
            return None;
        }
        Some(BoardElement::MindNode(tree::move_all(node, dx, dy)))
    }

    fn is_element_selected(&self, _board: &Board, element: ElementRef<'_>, area: Rect) -> bool {
        element
            .as_mind_node()
            .is_some_and(|node| crate::geometry::is_rect_intersect(node.bounds(), area))
    }

    fn render(
        &self,
        _board: &Board,
        element: ElementRef<'_>,
        mut children: Vec<RenderNode>,
    ) -> Option<RenderNode> {
        let node = element.as_mind_node()?;

        // drop fragments for children hidden behind a fold toggle
        children.retain(|fragment| {
            node.children
                .iter()
                .find(|child| child.id == fragment.element)
                .is_none_or(|child| !node.fold_for(child.side()))
        });

        let fill = (!node.background.is_transparent()).then(|| node.background.into());
        let stroke = (!node.border.is_transparent()).then(|| node.border.into());
        Some(RenderNode {
            element: node.id,
            path: node_path(node),
            fill,
            stroke,
            stroke_width: BORDER_WIDTH,
            children,
        })
    }

    fn on_pointer_down(&mut self, board: &mut Board, event: &PointerInput) -> bool {
        self.drag.on_pointer_down(board, event)
    }

    fn on_pointer_move(&mut self, board: &mut Board, event: &PointerInput) -> bool {
        self.drag.on_pointer_move(board, event)
    }

    fn on_global_pointer_up(&mut self, board: &mut Board, event: &PointerInput) -> bool {
        self.drag.on_global_pointer_up(board, event)
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
    use crate::element::Direction;

    fn sized_root() -> MindNodeElement {
        let mut root = MindNodeElement::new_root(Point::new(0.0, 0.0));
        root.width = 100.0;
        root.height = 40.0;
        root
    }

    fn fragment(id: crate::element::ElementId) -> RenderNode {
        RenderNode {
            element: id,
            path: BezPath::new(),
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_hit_inside_bounds() {
        let board = Board::new();
        let plugin = MindNodePlugin::new();
        let root = sized_root();
        assert!(plugin.is_hit(&board, ElementRef::MindNode(&root), Point::new(50.0, 20.0)));
        assert!(!plugin.is_hit(&board, ElementRef::MindNode(&root), Point::new(150.0, 20.0)));
    }

    #[test]
    fn test_only_roots_move_freely() {
        let board = Board::new();
        let plugin = MindNodePlugin::new();
        let base = sized_root();
        let with_child = tree::add_child(&base, base.id).unwrap();
        let moved = plugin.move_element(&board, ElementRef::MindNode(&with_child), 10.0, 5.0);
        let moved = moved.unwrap();
        let moved = moved.as_mind_node().unwrap();
        assert!((moved.x - (with_child.x + 10.0)).abs() < f64::EPSILON);
        assert!((moved.children[0].y - (with_child.children[0].y + 5.0)).abs() < f64::EPSILON);

        let child = &with_child.children[0];
        assert!(
            plugin
                .move_element(&board, ElementRef::MindNode(child), 10.0, 5.0)
                .is_none()
        );
    }

    #[test]
    fn test_render_filters_folded_side() {
        let board = Board::new();
        let plugin = MindNodePlugin::new();
        let base = sized_root();
        let root = tree::add_child(&base, base.id).unwrap();
        let root = tree::add_sibling(&root, root.children[0].id).unwrap();
        let mut root = root;
        root.is_right_fold = true;

        let fragments = root.children.iter().map(|c| fragment(c.id)).collect();
        let rendered = plugin
            .render(&board, ElementRef::MindNode(&root), fragments)
            .unwrap();
        assert!(rendered.children.is_empty());
        assert!(rendered.fill.is_some());
    }

    #[test]
    fn test_render_keeps_unfolded_children() {
        let board = Board::new();
        let plugin = MindNodePlugin::new();
        let base = sized_root();
        let root = tree::add_child(&base, base.id).unwrap();

        let fragments = root.children.iter().map(|c| fragment(c.id)).collect();
        let rendered = plugin
            .render(&board, ElementRef::MindNode(&root), fragments)
            .unwrap();
        assert_eq!(rendered.children.len(), 1);
        assert_eq!(rendered.children[0].element, root.children[0].id);
    }

    #[test]
    fn test_marquee_selection_uses_bounds() {
        let board = Board::new();
        let plugin = MindNodePlugin::new();
        let root = sized_root();
        assert!(plugin.is_element_selected(
            &board,
            ElementRef::MindNode(&root),
            Rect::new(90.0, 30.0, 200.0, 200.0),
        ));
        assert!(!plugin.is_element_selected(
            &board,
            ElementRef::MindNode(&root),
            Rect::new(200.0, 200.0, 300.0, 300.0),
        ));
    }

    #[test]
    fn test_connectors_skip_folded_side() {
        let base = sized_root();
        let root = tree::add_child(&base, base.id).unwrap();
        let laid = tree::layout(&root);
        let with_connector = node_path(&laid).elements().len();

        let mut folded = laid.clone();
        folded.is_right_fold = true;
        let without = node_path(&folded).elements().len();
        assert!(with_connector > without);
    }

    #[test]
    fn test_left_child_connects_to_left_edge() {
        let mut base = sized_root();
        base.direction = None;
        let root = tree::add_child(&base, base.id).unwrap();
        let mut root = root;
        root.children[0].direction = Some(Direction::Left);
        let root = tree::layout(&root);
        let child = &root.children[0];
        // left-side children are laid out left of the root
        assert!(child.x + child.width <= root.x);
    }
}
