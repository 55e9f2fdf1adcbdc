//! The board store.
//!
//! Owns the element tree, viewport, selection and plugin registry. All
//! mutation funnels through [`Board::apply`], which resolves each
//! operation against the current tree, skips the ones whose references
//! went stale, and feeds committed batches to the undo stack.

use std::collections::HashSet;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::element::{BoardElement, ElementId, ElementKind, ElementRef};
use crate::error::BoardError;
use crate::geometry;
use crate::input::PointerInput;
use crate::mind::node::MindNodeElement;
use crate::operation::Operation;
use crate::plugin::{ElementPlugin, RenderNode};
use crate::selection::Selection;
use crate::viewport::ViewPort;

/// Maximum number of undo steps to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Handle returned by [`Board::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// The serializable document shape: what persists and what listeners
/// read through [`Board::snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub children: Vec<BoardElement>,
    pub view_port: ViewPort,
    pub selection: Selection,
}

pub struct Board {
    pub children: Vec<BoardElement>,
    pub view_port: ViewPort,
    pub selection: Selection,
    /// Elements whose embedded editor currently has focus.
    pub editing_elements: Vec<ElementId>,
    plugins: Vec<Box<dyn ElementPlugin>>,
    undo_stack: Vec<Vec<Operation>>,
    redo_stack: Vec<Vec<Operation>>,
    listeners: Vec<(SubscriptionId, Box<dyn Fn()>)>,
    next_subscription: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            view_port: ViewPort::default(),
            selection: Selection::default(),
            editing_elements: Vec::new(),
            plugins: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn with_children(children: Vec<BoardElement>) -> Self {
        Self {
            children,
            ..Self::new()
        }
    }

    pub fn from_document(document: PersistedDocument) -> Self {
        Self {
            children: document.children,
            view_port: document.view_port,
            selection: document.selection,
            ..Self::new()
        }
    }

    /// Register a plugin. Order matters: pointer events visit plugins in
    /// registration order until one claims the event.
    pub fn register_plugin(&mut self, plugin: Box<dyn ElementPlugin>) {
        self.plugins.push(plugin);
    }

    /// Typed access to a registered plugin.
    pub fn plugin<T: 'static>(&self) -> Option<&T> {
        self.plugins
            .iter()
            .find_map(|plugin| plugin.as_any().downcast_ref::<T>())
    }

    pub fn plugin_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.plugins
            .iter_mut()
            .find_map(|plugin| plugin.as_any_mut().downcast_mut::<T>())
    }

    // ----- operations -----

    /// Apply a batch of operations in order.
    ///
    /// Each operation resolves its path against the tree as it stands
    /// when its turn comes; an unresolvable reference skips that
    /// operation (logged) and the rest of the batch continues. With
    /// `commit` the applied batch lands on the undo stack; ephemeral
    /// edits (selection, focus bookkeeping, drag previews) pass `false`.
    pub fn apply(&mut self, ops: Vec<Operation>, commit: bool) {
        let mut applied: Vec<Operation> = Vec::new();
        let mut structural = false;
        for op in ops {
            match self.apply_one(&op) {
                Ok(()) => {
                    structural |= op.is_structural();
                    applied.push(op);
                }
                Err(err) => log::warn!("skipping operation: {err}"),
            }
        }
        if applied.is_empty() {
            return;
        }

        if structural {
            self.selection.select_area = None;
            self.prune_stale_references();
        }

        if commit {
            self.redo_stack.clear();
            self.undo_stack.push(applied);
            if self.undo_stack.len() > MAX_UNDO_HISTORY {
                self.undo_stack.remove(0);
            }
        }
        self.notify();
    }

    fn apply_one(&mut self, op: &Operation) -> Result<(), BoardError> {
        match op {
            Operation::SetNode {
                path,
                new_properties,
                ..
            } => {
                self.replace_at(path, (**new_properties).clone())?;
            }
            Operation::InsertNode { path, node } => {
                self.insert_at(path, (**node).clone())?;
            }
            Operation::RemoveNode { path, .. } => {
                self.remove_at(path)?;
            }
            Operation::SetSelection { new_properties, .. } => {
                self.selection = new_properties.clone();
            }
        }
        Ok(())
    }

    fn replace_at(&mut self, path: &[usize], new: BoardElement) -> Result<(), BoardError> {
        let stale = || BoardError::StaleReference(path.to_vec());
        let (first, rest) = path.split_first().ok_or_else(stale)?;
        let slot = self.children.get_mut(*first).ok_or_else(stale)?;
        if rest.is_empty() {
            *slot = new;
            return Ok(());
        }
        let top = slot
            .as_mind_node_mut()
            .ok_or(BoardError::IllegalTopology("only mind nodes nest"))?;
        let target = descend_mut(top, rest).ok_or_else(stale)?;
        let BoardElement::MindNode(new_node) = new else {
            return Err(BoardError::IllegalTopology(
                "a nested slot can only hold a mind node",
            ));
        };
        *target = new_node;
        Ok(())
    }

    fn insert_at(&mut self, path: &[usize], node: BoardElement) -> Result<(), BoardError> {
        let stale = || BoardError::StaleReference(path.to_vec());
        let (&index, parent_path) = path.split_last().ok_or_else(stale)?;
        if parent_path.is_empty() {
            if index > self.children.len() {
                return Err(stale());
            }
            self.children.insert(index, node);
            return Ok(());
        }

        let (first, rest) = parent_path.split_first().ok_or_else(stale)?;
        let slot = self.children.get_mut(*first).ok_or_else(stale)?;
        let top = slot
            .as_mind_node_mut()
            .ok_or(BoardError::IllegalTopology("only mind nodes nest"))?;
        let parent = if rest.is_empty() {
            top
        } else {
            descend_mut(top, rest).ok_or_else(stale)?
        };
        let BoardElement::MindNode(child) = node else {
            return Err(BoardError::IllegalTopology(
                "a nested slot can only hold a mind node",
            ));
        };
        if index > parent.children.len() {
            return Err(stale());
        }
        parent.children.insert(index, child);
        Ok(())
    }

    fn remove_at(&mut self, path: &[usize]) -> Result<BoardElement, BoardError> {
        let stale = || BoardError::StaleReference(path.to_vec());
        let (&index, parent_path) = path.split_last().ok_or_else(stale)?;
        if parent_path.is_empty() {
            if index >= self.children.len() {
                return Err(stale());
            }
            return Ok(self.children.remove(index));
        }

        let (first, rest) = parent_path.split_first().ok_or_else(stale)?;
        let slot = self.children.get_mut(*first).ok_or_else(stale)?;
        let top = slot
            .as_mind_node_mut()
            .ok_or(BoardError::IllegalTopology("only mind nodes nest"))?;
        let parent = if rest.is_empty() {
            top
        } else {
            descend_mut(top, rest).ok_or_else(stale)?
        };
        if index >= parent.children.len() {
            return Err(stale());
        }
        Ok(BoardElement::MindNode(parent.children.remove(index)))
    }

    /// Drop selection and editing entries whose elements are gone.
    fn prune_stale_references(&mut self) {
        let mut existing: HashSet<ElementId> = HashSet::new();
        geometry::for_each_element(self, &mut |element| {
            existing.insert(element.id());
        });
        self.selection
            .selected_elements
            .retain(|id| existing.contains(id));
        self.editing_elements.retain(|id| existing.contains(id));
    }

    // ----- undo / redo -----

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Roll back the most recent committed batch.
    pub fn undo(&mut self) -> bool {
        let Some(batch) = self.undo_stack.pop() else {
            return false;
        };
        let inverse: Vec<Operation> = batch.iter().rev().map(Operation::inverse).collect();
        self.apply(inverse, false);
        self.redo_stack.push(batch);
        true
    }

    /// Replay the most recently undone batch.
    pub fn redo(&mut self) -> bool {
        let Some(batch) = self.redo_stack.pop() else {
            return false;
        };
        self.apply(batch.clone(), false);
        self.undo_stack.push(batch);
        true
    }

    // ----- observation and persistence -----

    /// Register a change listener, fired after every effective apply.
    pub fn subscribe(&mut self, listener: Box<dyn Fn()>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(key, _)| *key != id);
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener();
        }
    }

    pub fn snapshot(&self) -> PersistedDocument {
        PersistedDocument {
            children: self.children.clone(),
            view_port: self.view_port,
            selection: self.selection.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let document: PersistedDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    // ----- editing focus -----

    pub fn is_editing(&self, id: ElementId) -> bool {
        self.editing_elements.contains(&id)
    }

    pub fn begin_editing(&mut self, id: ElementId) {
        if !self.editing_elements.contains(&id) {
            self.editing_elements.push(id);
        }
    }

    pub fn end_editing(&mut self, id: ElementId) {
        self.editing_elements.retain(|e| *e != id);
    }

    // ----- plugin dispatch -----

    fn plugin_for(&self, kind: ElementKind) -> Option<&dyn ElementPlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.kind() == kind)
            .map(|plugin| plugin.as_ref())
    }

    pub fn is_hit(&self, element: ElementRef<'_>, point: Point) -> bool {
        self.plugin_for(element.kind())
            .is_some_and(|plugin| plugin.is_hit(self, element, point))
    }

    /// All elements containing the point, paint order, routed through
    /// the registered plugins.
    pub fn hit_elements(&self, point: Point) -> Vec<ElementId> {
        let mut hits = Vec::new();
        geometry::for_each_element(self, &mut |element| {
            if self.is_hit(element, point) {
                hits.push(element.id());
            }
        });
        hits
    }

    pub fn move_element(
        &self,
        element: ElementRef<'_>,
        dx: f64,
        dy: f64,
    ) -> Option<BoardElement> {
        self.plugin_for(element.kind())?
            .move_element(self, element, dx, dy)
    }

    /// Marquee test against the current selection rectangle.
    pub fn is_element_selected(&self, element: ElementRef<'_>) -> bool {
        let Some(area) = self.selection.select_area else {
            return self.selection.is_selected(element.id());
        };
        self.plugin_for(element.kind())
            .is_some_and(|plugin| plugin.is_element_selected(self, element, area))
    }

    /// Render the whole document, paint order.
    pub fn render(&self) -> Vec<RenderNode> {
        self.children
            .iter()
            .filter_map(|element| self.render_element(element.as_ref()))
            .collect()
    }

    /// Render one element; children are rendered first and handed to the
    /// plugin, which may filter them (folded sides).
    pub fn render_element(&self, element: ElementRef<'_>) -> Option<RenderNode> {
        let children = match element {
            ElementRef::MindNode(node) => node
                .children
                .iter()
                .filter_map(|child| self.render_element(ElementRef::MindNode(child)))
                .collect(),
            ElementRef::Arrow(_) => Vec::new(),
        };
        self.plugin_for(element.kind())?
            .render(self, element, children)
    }

    pub fn on_pointer_down(&mut self, event: &PointerInput) {
        self.dispatch_pointer(|plugin, board| plugin.on_pointer_down(board, event));
    }

    pub fn on_pointer_move(&mut self, event: &PointerInput) {
        self.dispatch_pointer(|plugin, board| plugin.on_pointer_move(board, event));
    }

    pub fn on_global_pointer_up(&mut self, event: &PointerInput) {
        self.dispatch_pointer(|plugin, board| plugin.on_global_pointer_up(board, event));
    }

    // Plugins are moved out for the duration of the dispatch so a hook
    // can take `&mut Board` without aliasing the registry.
    fn dispatch_pointer(
        &mut self,
        mut f: impl FnMut(&mut Box<dyn ElementPlugin>, &mut Board) -> bool,
    ) {
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in plugins.iter_mut() {
            if f(plugin, self) {
                break;
            }
        }
        plugins.extend(std::mem::take(&mut self.plugins));
        self.plugins = plugins;
    }
}

fn descend_mut<'a>(node: &'a mut MindNodeElement, path: &[usize]) -> Option<&'a mut MindNodeElement> {
    let (first, rest) = path.split_first()?;
    let child = node.children.get_mut(*first)?;
    if rest.is_empty() {
        Some(child)
    } else {
        descend_mut(child, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::ArrowElement;
    use crate::mind::tree;
    use std::cell::Cell;
    use std::rc::Rc;

    fn mind_board() -> (Board, ElementId, ElementId) {
        let mut root = MindNodeElement::new_root(Point::new(0.0, 0.0));
        root.width = 100.0;
        root.height = 40.0;
        let root = tree::add_child(&root, root.id).unwrap();
        let root_id = root.id;
        let child_id = root.children[0].id;
        let board = Board::with_children(vec![BoardElement::MindNode(root)]);
        (board, root_id, child_id)
    }

    fn arrow_element() -> BoardElement {
        ArrowElement::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]).into()
    }

    #[test]
    fn test_insert_and_remove_top_level() {
        let mut board = Board::new();
        let arrow = arrow_element();
        board.apply(vec![Operation::insert_node(vec![0], arrow.clone())], true);
        assert_eq!(board.children.len(), 1);

        board.apply(vec![Operation::remove_node(vec![0], arrow)], true);
        assert!(board.children.is_empty());
    }

    #[test]
    fn test_stale_path_is_skipped_batch_continues() {
        let mut board = Board::new();
        let good = arrow_element();
        board.apply(
            vec![
                Operation::remove_node(vec![7], arrow_element()),
                Operation::insert_node(vec![0], good),
            ],
            true,
        );
        assert_eq!(board.children.len(), 1);
    }

    #[test]
    fn test_set_node_replaces_nested_element() {
        let (mut board, _, child_id) = mind_board();
        let path = geometry::path_of(&board, child_id).unwrap();
        let old = geometry::element_at(&board, &path).unwrap().to_element();
        let mut new = old.clone();
        if let BoardElement::MindNode(node) = &mut new {
            node.width = 80.0;
        }
        board.apply(vec![Operation::set_node(path.clone(), old, new)], true);

        let updated = geometry::element_at(&board, &path).unwrap();
        assert!((updated.as_mind_node().unwrap().width - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_structural_ops_reset_selection() {
        let (mut board, _, child_id) = mind_board();
        board.selection = Selection::single(child_id);
        board.selection.select_area = Some(kurbo::Rect::new(0.0, 0.0, 5.0, 5.0));

        board.apply(vec![Operation::insert_node(vec![1], arrow_element())], true);
        assert!(board.selection.select_area.is_none());
        // the selected node still exists, so it survives pruning
        assert!(board.selection.is_selected(child_id));

        let path = geometry::path_of(&board, child_id).unwrap();
        let node = geometry::element_at(&board, &path).unwrap().to_element();
        board.apply(vec![Operation::remove_node(path, node)], true);
        assert!(!board.selection.is_selected(child_id));
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut board = Board::new();
        let arrow = arrow_element();
        board.apply(vec![Operation::insert_node(vec![0], arrow)], true);
        assert!(board.can_undo());

        assert!(board.undo());
        assert!(board.children.is_empty());
        assert!(board.can_redo());

        assert!(board.redo());
        assert_eq!(board.children.len(), 1);
        assert!(!board.undo_stack.is_empty());
    }

    #[test]
    fn test_uncommitted_apply_skips_history() {
        let mut board = Board::new();
        board.apply(vec![Operation::insert_node(vec![0], arrow_element())], false);
        assert!(!board.can_undo());
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let mut board = Board::new();
        board.apply(vec![Operation::insert_node(vec![0], arrow_element())], true);
        board.undo();
        assert!(board.can_redo());
        board.apply(vec![Operation::insert_node(vec![0], arrow_element())], true);
        assert!(!board.can_redo());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut board = Board::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let id = board.subscribe(Box::new(move || seen.set(seen.get() + 1)));

        board.apply(vec![Operation::insert_node(vec![0], arrow_element())], true);
        assert_eq!(count.get(), 1);

        // a fully skipped batch notifies nobody
        board.apply(vec![Operation::remove_node(vec![9], arrow_element())], true);
        assert_eq!(count.get(), 1);

        board.unsubscribe(id);
        board.apply(vec![Operation::insert_node(vec![0], arrow_element())], true);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_hit_elements_routes_through_plugins() {
        let (mut board, root_id, _) = mind_board();
        board.register_plugin(Box::new(crate::plugins::MindNodePlugin::new()));
        board.register_plugin(Box::new(crate::plugins::ArrowPlugin::new()));

        assert_eq!(board.hit_elements(Point::new(50.0, 20.0)), vec![root_id]);
        assert!(board.hit_elements(Point::new(999.0, 999.0)).is_empty());
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let (board, root_id, _) = mind_board();
        let json = board.to_json().unwrap();
        let restored = Board::from_json(&json).unwrap();
        assert_eq!(restored.children.len(), 1);
        assert_eq!(restored.children[0].id(), root_id);
    }

    #[test]
    fn test_editing_focus_tracking() {
        let (mut board, _, child_id) = mind_board();
        board.begin_editing(child_id);
        assert!(board.is_editing(child_id));
        board.begin_editing(child_id);
        assert_eq!(board.editing_elements.len(), 1);
        board.end_editing(child_id);
        assert!(!board.is_editing(child_id));
    }
}
