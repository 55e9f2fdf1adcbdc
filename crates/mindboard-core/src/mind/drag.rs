//! Pointer-driven re-parenting of mind nodes.
//!
//! A press on a non-root node arms the gesture; once the cursor travels
//! past the threshold the node leaves its tree and follows the pointer
//! as an independent root. Every subsequent move diffs the nearest
//! attachable parent and splices the subtree in and out accordingly, all
//! through uncommitted operations so observers see live previews.
//! Release collapses the previews into a single committed batch, so one
//! undo step reverts the whole drop.

use kurbo::{Point, Vec2};

use crate::board::{Board, SubscriptionId};
use crate::element::{BoardElement, ElementId};
use crate::geometry;
use crate::input::PointerInput;
use crate::mind::node::{MindNodeElement, palette_for_level};
use crate::mind::tree::{self, DropTarget};
use crate::operation::Operation;

/// Cursor travel in document units before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;

/// Externally visible gesture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Detached,
    Attached,
}

/// What observers get on every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSnapshot {
    pub phase: DragPhase,
    pub dragged: Option<ElementId>,
    pub drop_parent: Option<ElementId>,
}

#[derive(Debug, Clone, Copy)]
enum DragState {
    Idle,
    Armed {
        node_id: ElementId,
        start: Point,
        grab_offset: Vec2,
    },
    Dragging {
        node_id: ElementId,
        grab_offset: Vec2,
        hold: DragHold,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragHold {
    /// The dragged subtree is a temporary top-level root.
    Detached,
    /// The dragged subtree currently previews under this target.
    Attached(DropTarget),
}

type DragListener = Box<dyn Fn(&DragSnapshot)>;

/// The drag state machine. One instance per board, owned by the mind
/// node plugin; no global state.
pub struct DragController {
    state: DragState,
    /// Pre-gesture snapshot of every tree the previews have edited,
    /// keyed by root id. Drives the committed batch built on release.
    touched_roots: Vec<(ElementId, MindNodeElement)>,
    listeners: Vec<(SubscriptionId, DragListener)>,
    next_subscription: u64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            touched_roots: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn snapshot(&self) -> DragSnapshot {
        match self.state {
            DragState::Idle => DragSnapshot {
                phase: DragPhase::Idle,
                dragged: None,
                drop_parent: None,
            },
            DragState::Armed { node_id, .. } => DragSnapshot {
                phase: DragPhase::Armed,
                dragged: Some(node_id),
                drop_parent: None,
            },
            DragState::Dragging { node_id, hold, .. } => match hold {
                DragHold::Detached => DragSnapshot {
                    phase: DragPhase::Detached,
                    dragged: Some(node_id),
                    drop_parent: None,
                },
                DragHold::Attached(target) => DragSnapshot {
                    phase: DragPhase::Attached,
                    dragged: Some(node_id),
                    drop_parent: Some(target.parent_id),
                },
            },
        }
    }

    pub fn subscribe(&mut self, listener: DragListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(key, _)| *key != id);
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        for (_, listener) in &self.listeners {
            listener(&snapshot);
        }
    }

    /// Back to idle, notifying observers if anything was in flight.
    pub fn reset(&mut self) {
        self.touched_roots.clear();
        if !matches!(self.state, DragState::Idle) {
            self.state = DragState::Idle;
            self.notify();
        }
    }

    fn remember_root(&mut self, root: &MindNodeElement) {
        if !self.touched_roots.iter().any(|(id, _)| *id == root.id) {
            self.touched_roots.push((root.id, root.clone()));
        }
    }

    fn abort(&mut self, why: &str) {
        log::warn!("aborting drag: {why}");
        self.reset();
    }

    /// Arm on the topmost non-root mind node under the pointer.
    pub fn on_pointer_down(&mut self, board: &mut Board, event: &PointerInput) -> bool {
        if !matches!(self.state, DragState::Idle) {
            self.reset();
        }
        let point = board.view_port.screen_to_viewport(event.position);
        let hits = geometry::hit_elements(board, point);
        for id in hits.iter().rev() {
            let Some(root) = tree::root_of(board, *id) else {
                continue;
            };
            let Some(node) = tree::find_node(root, *id) else {
                continue;
            };
            if node.is_root() {
                continue;
            }
            self.state = DragState::Armed {
                node_id: node.id,
                start: point,
                grab_offset: point - Point::new(node.x, node.y),
            };
            self.notify();
            return true;
        }
        false
    }

    pub fn on_pointer_move(&mut self, board: &mut Board, event: &PointerInput) -> bool {
        let point = board.view_port.screen_to_viewport(event.position);
        match self.state {
            DragState::Idle => false,
            DragState::Armed {
                node_id,
                start,
                grab_offset,
            } => {
                if (point - start).hypot() <= DRAG_THRESHOLD {
                    return true;
                }
                if self
                    .detach_from_source(board, node_id, point, grab_offset)
                    .is_none()
                {
                    self.abort("drag source no longer resolves");
                }
                true
            }
            DragState::Dragging {
                node_id,
                grab_offset,
                hold,
            } => {
                if self
                    .update_drag(board, node_id, grab_offset, hold, point)
                    .is_none()
                {
                    self.abort("dragged subtree no longer resolves");
                }
                true
            }
        }
    }

    /// Release anywhere ends the gesture. A below-threshold press leaves
    /// the document untouched; a real drop lands on the undo stack as a
    /// single committed batch.
    pub fn on_global_pointer_up(&mut self, board: &mut Board, _event: &PointerInput) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => return false,
            DragState::Armed { .. } => {}
            DragState::Dragging { node_id, hold, .. } => self.finish_drag(board, node_id, hold),
        }
        self.touched_roots.clear();
        self.notify();
        true
    }

    /// Pull the node out of its tree and materialize it as a temporary
    /// top-level root under the cursor.
    fn detach_from_source(
        &mut self,
        board: &mut Board,
        node_id: ElementId,
        point: Point,
        grab_offset: Vec2,
    ) -> Option<()> {
        let root = tree::root_of(board, node_id)?.clone();
        if !tree::can_move_node(&root, node_id) {
            return None;
        }
        self.remember_root(&root);
        let subtree = tree::find_node(&root, node_id)?.clone();
        let new_source = tree::delete_node(&root, node_id)?;
        let independent = tree::create_new_root_node(&subtree, point - grab_offset);

        let root_path = geometry::path_of(board, root.id)?;
        let insert_path = vec![board.children.len()];
        board.apply(
            vec![
                Operation::set_node(
                    root_path,
                    BoardElement::MindNode(root),
                    BoardElement::MindNode(new_source),
                ),
                Operation::insert_node(insert_path, BoardElement::MindNode(independent)),
            ],
            false,
        );

        self.state = DragState::Dragging {
            node_id,
            grab_offset,
            hold: DragHold::Detached,
        };
        self.notify();
        Some(())
    }

    fn update_drag(
        &mut self,
        board: &mut Board,
        node_id: ElementId,
        grab_offset: Vec2,
        hold: DragHold,
        point: Point,
    ) -> Option<()> {
        let desired = point - grab_offset;
        let current = match hold {
            DragHold::Detached => board
                .children
                .iter()
                .find(|element| element.id() == node_id)?
                .as_mind_node()?
                .clone(),
            DragHold::Attached(_) => {
                let root = tree::root_of(board, node_id)?;
                tree::find_node(root, node_id)?.clone()
            }
        };
        let mut candidate = current.clone();
        candidate.x = desired.x;
        candidate.y = desired.y;
        let target = tree::find_nearest_mind_node(board, point, &candidate);

        match (hold, target) {
            (DragHold::Detached, Some(target)) => {
                self.attach(board, node_id, grab_offset, target)?;
            }
            (DragHold::Detached, None) => {
                self.translate_detached(board, node_id, desired, &current)?;
            }
            (DragHold::Attached(previous), Some(target)) if target != previous => {
                self.detach_from_target(board, node_id, grab_offset, desired)?;
                self.attach(board, node_id, grab_offset, target)?;
            }
            (DragHold::Attached(_), None) => {
                self.detach_from_target(board, node_id, grab_offset, desired)?;
            }
            _ => {}
        }
        Some(())
    }

    /// Splice the independent root under the drop target.
    fn attach(
        &mut self,
        board: &mut Board,
        node_id: ElementId,
        grab_offset: Vec2,
        target: DropTarget,
    ) -> Option<()> {
        let independent = board
            .children
            .iter()
            .find(|element| element.id() == node_id)?
            .as_mind_node()?
            .clone();
        let target_root = tree::root_of(board, target.parent_id)?.clone();
        self.remember_root(&target_root);
        let merged = tree::move_node_to_new_parent(
            &independent,
            &target_root,
            node_id,
            target.parent_id,
            target.insert_index,
            target.direction,
        )?;
        let merged = tree::layout(&merged);

        // target path first; removing the independent root would shift it
        let target_path = geometry::path_of(board, target_root.id)?;
        let independent_path = geometry::path_of(board, node_id)?;
        board.apply(
            vec![
                Operation::set_node(
                    target_path,
                    BoardElement::MindNode(target_root),
                    BoardElement::MindNode(merged),
                ),
                Operation::remove_node(independent_path, BoardElement::MindNode(independent)),
            ],
            false,
        );

        self.state = DragState::Dragging {
            node_id,
            grab_offset,
            hold: DragHold::Attached(target),
        };
        self.notify();
        Some(())
    }

    /// Pull the previewed subtree back out of its target tree.
    fn detach_from_target(
        &mut self,
        board: &mut Board,
        node_id: ElementId,
        grab_offset: Vec2,
        desired: Point,
    ) -> Option<()> {
        let target_root = tree::root_of(board, node_id)?.clone();
        let subtree = tree::find_node(&target_root, node_id)?.clone();
        let new_target = tree::delete_node(&target_root, node_id)?;
        let independent = tree::create_new_root_node(&subtree, desired);

        let root_path = geometry::path_of(board, target_root.id)?;
        board.apply(
            vec![
                Operation::set_node(
                    root_path,
                    BoardElement::MindNode(target_root),
                    BoardElement::MindNode(new_target),
                ),
                Operation::insert_node(
                    vec![board.children.len()],
                    BoardElement::MindNode(independent),
                ),
            ],
            false,
        );

        self.state = DragState::Dragging {
            node_id,
            grab_offset,
            hold: DragHold::Detached,
        };
        self.notify();
        Some(())
    }

    fn translate_detached(
        &mut self,
        board: &mut Board,
        node_id: ElementId,
        desired: Point,
        current: &MindNodeElement,
    ) -> Option<()> {
        let dx = desired.x - current.x;
        let dy = desired.y - current.y;
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return Some(());
        }
        let moved = tree::move_all(current, dx, dy);
        let path = geometry::path_of(board, node_id)?;
        board.apply(
            vec![Operation::set_node(
                path,
                BoardElement::MindNode(current.clone()),
                BoardElement::MindNode(moved),
            )],
            false,
        );
        Some(())
    }

    /// Collapse the gesture into one committed batch: rewind every
    /// touched tree to its pre-gesture shape with uncommitted inverses,
    /// then re-apply the net change. One undo step reverts the whole
    /// drop, and a drop that lands back where it started commits nothing.
    /// A blank-canvas drop additionally promotes the detached root with
    /// the first palette entry.
    fn finish_drag(&mut self, board: &mut Board, node_id: ElementId, hold: DragHold) {
        let mut changed: Vec<(ElementId, MindNodeElement, MindNodeElement)> = Vec::new();
        for (id, before) in &self.touched_roots {
            let Some(after) = board
                .children
                .iter()
                .find(|element| element.id() == *id)
                .and_then(|element| element.as_mind_node())
                .cloned()
            else {
                continue;
            };
            if after != *before {
                changed.push((*id, before.clone(), after));
            }
        }

        let promoted = match hold {
            DragHold::Attached(_) => None,
            DragHold::Detached => {
                let node = board
                    .children
                    .iter()
                    .find(|element| element.id() == node_id)
                    .and_then(|element| element.as_mind_node())
                    .cloned();
                match node {
                    Some(node) => {
                        let palette = palette_for_level(1);
                        let mut permanent = node.clone();
                        permanent.background = palette.background;
                        permanent.text_color = palette.text_color;
                        Some((node, permanent))
                    }
                    None => {
                        log::warn!("dragged root vanished before release");
                        None
                    }
                }
            }
        };

        let mut rewind = Vec::new();
        for (id, before, after) in &changed {
            if let Some(path) = geometry::path_of(board, *id) {
                rewind.push(Operation::set_node(
                    path,
                    BoardElement::MindNode(after.clone()),
                    BoardElement::MindNode(before.clone()),
                ));
            }
        }
        if let Some((current, _)) = &promoted {
            if let Some(path) = geometry::path_of(board, node_id) {
                rewind.push(Operation::remove_node(
                    path,
                    BoardElement::MindNode(current.clone()),
                ));
            }
        }
        board.apply(rewind, false);

        let mut net = Vec::new();
        for (id, before, after) in changed {
            if let Some(path) = geometry::path_of(board, id) {
                net.push(Operation::set_node(
                    path,
                    BoardElement::MindNode(before),
                    BoardElement::MindNode(after),
                ));
            }
        }
        if let Some((_, permanent)) = promoted {
            net.push(Operation::insert_node(
                vec![board.children.len()],
                BoardElement::MindNode(permanent),
            ));
        }
        board.apply(net, true);
    }
}
