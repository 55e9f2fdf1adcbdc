//! Bridge between an embedded rich-text editor and the document.
//!
//! The host owns the actual editor widget; this type turns its callbacks
//! (content changed, intrinsic size changed, blur) into operations. Size
//! changes are trailing-debounced so typing bursts produce one write.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::board::Board;
use crate::element::{BoardElement, Direction, ElementId};
use crate::geometry;
use crate::mind::node::MindNodeElement;
use crate::mind::tree;
use crate::operation::Operation;
use crate::selection::Selection;

/// Widest a node grows before the editor wraps text.
pub const MAX_NODE_WIDTH: f64 = 200.0;

/// Trailing delay applied to intrinsic size changes.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    width: f64,
    height: f64,
    at: Instant,
}

/// One bridge per open editor, bound to a single mind node.
#[derive(Debug)]
pub struct ContentBridge {
    node_id: ElementId,
    pending_resize: Option<PendingResize>,
}

impl ContentBridge {
    pub fn new(node_id: ElementId) -> Self {
        Self {
            node_id,
            pending_resize: None,
        }
    }

    pub fn node_id(&self) -> ElementId {
        self.node_id
    }

    /// Consume the one-shot autofocus flag set on freshly created nodes.
    /// Returns whether the editor should take focus now.
    pub fn take_default_focus(&self, board: &mut Board) -> bool {
        let Some(node) = self.resolve(board) else {
            return false;
        };
        if !node.default_focus {
            return false;
        }
        let mut cleared = node.clone();
        cleared.default_focus = false;
        self.replace_node(board, &node, cleared, false);
        board.begin_editing(self.node_id);
        true
    }

    /// Editor content changed; store the new rich-text value.
    pub fn on_change(&self, board: &mut Board, value: Value) {
        let Some(node) = self.resolve(board) else {
            return;
        };
        let mut updated = node.clone();
        updated.text = value;
        self.replace_node(board, &node, updated, true);
    }

    /// Editor reported a new intrinsic size. Recorded, not applied;
    /// call [`poll`](Self::poll) to flush once the debounce window ends.
    pub fn on_resize(&mut self, width: f64, height: f64, now: Instant) {
        self.pending_resize = Some(PendingResize { width, height, at: now });
    }

    /// Apply the pending resize if its debounce window has elapsed.
    pub fn poll(&mut self, board: &mut Board, now: Instant) -> bool {
        match self.pending_resize {
            Some(pending) if now.duration_since(pending.at) >= RESIZE_DEBOUNCE => {
                self.flush(board)
            }
            _ => false,
        }
    }

    /// Apply the pending resize immediately.
    pub fn flush(&mut self, board: &mut Board) -> bool {
        let Some(pending) = self.pending_resize.take() else {
            return false;
        };
        let Some(node) = self.resolve(board) else {
            return false;
        };

        let width = pending.width.min(MAX_NODE_WIDTH);
        let height = pending.height;
        if (width - node.width).abs() < f64::EPSILON
            && (height - node.height).abs() < f64::EPSILON
        {
            return false;
        }

        let mut resized = node.clone();
        resized.width = width;
        resized.height = height;
        // left-side nodes keep their attach edge fixed and grow leftward
        if node.direction == Some(Direction::Left) {
            resized.x = node.x - (width - node.width);
        }
        self.replace_node(board, &node, resized, true);
        true
    }

    /// Editor lost focus: flush any pending size, leave editing mode,
    /// re-run layout on the tree and select the node.
    pub fn on_blur(&mut self, board: &mut Board) {
        self.flush(board);
        board.end_editing(self.node_id);

        let Some(root) = tree::root_of(board, self.node_id).cloned() else {
            return;
        };
        let relaid = tree::layout(&root);
        let Some(path) = geometry::path_of(board, root.id) else {
            return;
        };
        board.apply(
            vec![
                Operation::set_node(
                    path,
                    BoardElement::MindNode(root),
                    BoardElement::MindNode(relaid),
                ),
                Operation::set_selection(
                    board.selection.clone(),
                    Selection::single(self.node_id),
                ),
            ],
            true,
        );
    }

    fn resolve(&self, board: &Board) -> Option<MindNodeElement> {
        geometry::find_element(board, self.node_id)?
            .as_mind_node()
            .cloned()
    }

    fn replace_node(
        &self,
        board: &mut Board,
        old: &MindNodeElement,
        new: MindNodeElement,
        commit: bool,
    ) {
        let Some(path) = geometry::path_of(board, old.id) else {
            return;
        };
        board.apply(
            vec![Operation::set_node(
                path,
                BoardElement::MindNode(old.clone()),
                BoardElement::MindNode(new),
            )],
            commit,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use serde_json::json;

    fn board_with_child() -> (Board, ElementId) {
        let mut root = MindNodeElement::new_root(Point::new(0.0, 0.0));
        root.width = 100.0;
        root.height = 40.0;
        let root = tree::add_child(&root, root.id).unwrap();
        let child = root.children[0].id;
        (Board::with_children(vec![BoardElement::MindNode(root)]), child)
    }

    fn node(board: &Board, id: ElementId) -> MindNodeElement {
        geometry::find_element(board, id)
            .unwrap()
            .as_mind_node()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_default_focus_consumed_once() {
        let (mut board, child) = board_with_child();
        let bridge = ContentBridge::new(child);

        assert!(bridge.take_default_focus(&mut board));
        assert!(board.is_editing(child));
        assert!(!node(&board, child).default_focus);
        assert!(!bridge.take_default_focus(&mut board));
    }

    #[test]
    fn test_change_swaps_text() {
        let (mut board, child) = board_with_child();
        let bridge = ContentBridge::new(child);
        let value = json!({"type": "doc", "content": "hello"});

        bridge.on_change(&mut board, value.clone());
        assert_eq!(node(&board, child).text, value);
    }

    #[test]
    fn test_resize_waits_for_debounce_window() {
        let (mut board, child) = board_with_child();
        let mut bridge = ContentBridge::new(child);
        let t0 = Instant::now();

        bridge.on_resize(120.0, 60.0, t0);
        assert!(!bridge.poll(&mut board, t0 + Duration::from_millis(10)));
        assert!(bridge.poll(&mut board, t0 + Duration::from_millis(50)));

        let updated = node(&board, child);
        assert!((updated.width - 120.0).abs() < f64::EPSILON);
        assert!((updated.height - 60.0).abs() < f64::EPSILON);
        // nothing left to flush
        assert!(!bridge.poll(&mut board, t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_resize_clamps_width() {
        let (mut board, child) = board_with_child();
        let mut bridge = ContentBridge::new(child);

        bridge.on_resize(500.0, 60.0, Instant::now());
        bridge.flush(&mut board);
        assert!((node(&board, child).width - MAX_NODE_WIDTH).abs() < f64::EPSILON);
    }

    #[test]
    fn test_left_node_grows_leftward() {
        let (mut board, child) = board_with_child();
        let before = node(&board, child);
        let root = board.children[0].as_mind_node().unwrap().clone();
        let mut flipped = tree::find_node(&root, child).unwrap().clone();
        flipped.direction = Some(Direction::Left);
        let flipped_root = {
            let mut r = root.clone();
            r.children[0] = flipped;
            r
        };
        board.apply(
            vec![Operation::set_node(
                vec![0],
                BoardElement::MindNode(root),
                BoardElement::MindNode(flipped_root),
            )],
            false,
        );

        let mut bridge = ContentBridge::new(child);
        bridge.on_resize(before.width + 30.0, before.height, Instant::now());
        bridge.flush(&mut board);

        let after = node(&board, child);
        assert!((after.x - (before.x - 30.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blur_flushes_relayouts_and_selects() {
        let (mut board, child) = board_with_child();
        let mut bridge = ContentBridge::new(child);
        board.begin_editing(child);

        bridge.on_resize(150.0, 80.0, Instant::now());
        bridge.on_blur(&mut board);

        assert!(!board.is_editing(child));
        assert_eq!(board.selection.selected_elements, vec![child]);
        let updated = node(&board, child);
        assert!((updated.width - 150.0).abs() < f64::EPSILON);
        // layout ran: child sits a fixed gap right of the root edge
        let root = board.children[0].as_mind_node().unwrap();
        assert!((updated.x - (root.x + root.width + tree::MARGIN_X)).abs() < f64::EPSILON);
    }
}
