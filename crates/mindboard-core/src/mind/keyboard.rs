//! Keyboard shortcuts for mind nodes.
//!
//! Two fixed tables keyed on editing mode. Outside editing the shortcuts
//! act on the single selected node; while editing only Enter (commit)
//! and Delete (swallowed so it cannot nuke the node) are intercepted.

use crate::board::Board;
use crate::element::{BoardElement, Direction, ElementId};
use crate::geometry;
use crate::input::KeyInput;
use crate::mind::node::MindNodeElement;
use crate::mind::tree;
use crate::operation::Operation;
use crate::selection::Selection;

/// Dispatch one key press. Returns whether the event was consumed.
pub fn handle_key(board: &mut Board, input: &KeyInput) -> bool {
    // app-level chords (undo, open) stay with the host
    if input.modifiers.command() && matches!(input.key.as_str(), "z" | "o") {
        return false;
    }

    if let Some(element) = editing_mind_node(board) {
        return handle_editing_key(board, &element, input);
    }
    let Some(element) = selected_mind_node(board) else {
        return false;
    };
    handle_normal_key(board, &element, input)
}

fn selected_mind_node(board: &Board) -> Option<MindNodeElement> {
    let &[id] = board.selection.selected_elements.as_slice() else {
        return None;
    };
    resolve_node(board, id)
}

fn editing_mind_node(board: &Board) -> Option<MindNodeElement> {
    let &[id] = board.editing_elements.as_slice() else {
        return None;
    };
    resolve_node(board, id)
}

fn resolve_node(board: &Board, id: ElementId) -> Option<MindNodeElement> {
    geometry::find_element(board, id)?.as_mind_node().cloned()
}

fn handle_normal_key(board: &mut Board, element: &MindNodeElement, input: &KeyInput) -> bool {
    let command = input.modifiers.command();
    let shift = input.modifiers.shift;
    match input.key.as_str() {
        "ArrowUp" if command => reorder(board, element, tree::move_node_up),
        "ArrowDown" if command => reorder(board, element, tree::move_node_down),
        "ArrowLeft" if command => change_direction(board, element, Direction::Left),
        "ArrowRight" if command => change_direction(board, element, Direction::Right),
        "Tab" => grow(board, element, tree::add_child),
        "Enter" if shift => grow(board, element, tree::add_sibling_before),
        "Enter" => grow(board, element, tree::add_sibling),
        "Backspace" | "Delete" => delete(board, element),
        "ArrowUp" => navigate_up(board, element),
        "ArrowDown" => navigate_down(board, element),
        "ArrowLeft" => navigate_sideways(board, element, Direction::Left),
        "ArrowRight" => navigate_sideways(board, element, Direction::Right),
        " " => enter_edit_mode(board, element),
        _ => false,
    }
}

fn handle_editing_key(board: &mut Board, element: &MindNodeElement, input: &KeyInput) -> bool {
    match input.key.as_str() {
        "Enter" if !input.modifiers.shift => {
            board.end_editing(element.id);
            if let Some(root) = tree::root_of(board, element.id).cloned() {
                let relaid = tree::layout(&root);
                let mut ops = root_change(board, &root, relaid);
                ops.push(Operation::set_selection(
                    board.selection.clone(),
                    Selection::single(element.id),
                ));
                board.apply(ops, true);
            }
            true
        }
        // keep the key from bubbling into node deletion
        "Delete" => true,
        _ => false,
    }
}

fn root_change(board: &Board, old_root: &MindNodeElement, new_root: MindNodeElement) -> Vec<Operation> {
    match geometry::path_of(board, old_root.id) {
        Some(path) => vec![Operation::set_node(
            path,
            BoardElement::MindNode(old_root.clone()),
            BoardElement::MindNode(new_root),
        )],
        None => Vec::new(),
    }
}

fn grow(
    board: &mut Board,
    element: &MindNodeElement,
    edit: fn(&MindNodeElement, ElementId) -> Option<MindNodeElement>,
) -> bool {
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(new_root) = edit(&root, element.id) else {
        return true;
    };
    let mut ops = root_change(board, &root, new_root);
    ops.push(Operation::set_selection(
        board.selection.clone(),
        Selection::default(),
    ));
    board.apply(ops, true);
    true
}

fn reorder(
    board: &mut Board,
    element: &MindNodeElement,
    edit: fn(&MindNodeElement, ElementId) -> Option<MindNodeElement>,
) -> bool {
    if element.is_root() {
        return true;
    }
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(new_root) = edit(&root, element.id) else {
        return true;
    };
    let ops = root_change(board, &root, new_root);
    board.apply(ops, true);
    true
}

fn change_direction(board: &mut Board, element: &MindNodeElement, direction: Direction) -> bool {
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(new_root) = tree::toggle_direction(&root, element.id, direction) else {
        return true;
    };
    let mut ops = root_change(board, &root, new_root);
    ops.push(Operation::set_selection(
        board.selection.clone(),
        Selection::single(element.id),
    ));
    board.apply(ops, true);
    true
}

fn delete(board: &mut Board, element: &MindNodeElement) -> bool {
    if element.is_root() {
        if let Some(path) = geometry::path_of(board, element.id) {
            board.apply(
                vec![Operation::remove_node(
                    path,
                    BoardElement::MindNode(element.clone()),
                )],
                true,
            );
        }
        return true;
    }

    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(parent) = tree::find_parent(&root, element.id) else {
        return true;
    };
    let index = parent
        .children
        .iter()
        .position(|child| child.id == element.id)
        .unwrap_or(0);

    // next sibling, else previous sibling, else the parent
    let next_selected = if index + 1 < parent.children.len() {
        parent.children[index + 1].id
    } else if index > 0 {
        parent.children[index - 1].id
    } else {
        parent.id
    };

    let Some(new_root) = tree::delete_node(&root, element.id) else {
        return true;
    };
    let mut ops = root_change(board, &root, new_root);
    ops.push(Operation::set_selection(
        board.selection.clone(),
        Selection::single(next_selected),
    ));
    board.apply(ops, true);
    true
}

fn select(board: &mut Board, id: ElementId) {
    board.apply(
        vec![Operation::set_selection(
            board.selection.clone(),
            Selection::single(id),
        )],
        true,
    );
}

fn navigate_up(board: &mut Board, element: &MindNodeElement) -> bool {
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(parent) = tree::find_parent(&root, element.id) else {
        return true;
    };
    let siblings: Vec<&MindNodeElement> = parent
        .children
        .iter()
        .filter(|child| child.direction == element.direction)
        .collect();
    let Some(index) = siblings.iter().position(|child| child.id == element.id) else {
        return true;
    };
    let target = if index > 0 {
        siblings[index - 1].id
    } else {
        parent.id
    };
    select(board, target);
    true
}

fn navigate_down(board: &mut Board, element: &MindNodeElement) -> bool {
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    let Some(parent) = tree::find_parent(&root, element.id) else {
        return true;
    };
    let siblings: Vec<&MindNodeElement> = parent
        .children
        .iter()
        .filter(|child| child.direction == element.direction)
        .collect();
    let Some(index) = siblings.iter().position(|child| child.id == element.id) else {
        return true;
    };
    if index + 1 < siblings.len() {
        select(board, siblings[index + 1].id);
        return true;
    }

    // fall through to the parent's next same-side sibling
    if parent.is_root() {
        return true;
    }
    let Some(grandparent) = tree::find_parent(&root, parent.id) else {
        return true;
    };
    let parent_siblings: Vec<&MindNodeElement> = grandparent
        .children
        .iter()
        .filter(|child| child.direction == parent.direction)
        .collect();
    if let Some(parent_index) = parent_siblings.iter().position(|child| child.id == parent.id) {
        if parent_index + 1 < parent_siblings.len() {
            select(board, parent_siblings[parent_index + 1].id);
        }
    }
    true
}

/// Left/right arrows walk away from or toward the root depending on
/// which side the node grows.
fn navigate_sideways(board: &mut Board, element: &MindNodeElement, key: Direction) -> bool {
    if element.direction == Some(key) {
        if let Some(first_child) = element.children.first() {
            select(board, first_child.id);
        }
        return true;
    }
    if element.is_root() {
        return true;
    }
    let Some(root) = tree::root_of(board, element.id).cloned() else {
        return true;
    };
    if let Some(parent) = tree::find_parent(&root, element.id) {
        select(board, parent.id);
    }
    true
}

fn enter_edit_mode(board: &mut Board, element: &MindNodeElement) -> bool {
    board.begin_editing(element.id);
    board.apply(
        vec![Operation::set_selection(
            board.selection.clone(),
            Selection::default(),
        )],
        false,
    );
    true
}
