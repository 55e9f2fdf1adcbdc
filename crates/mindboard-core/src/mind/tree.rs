//! Pure mind-tree algorithms.
//!
//! Every function here takes the current root by reference and returns a
//! fresh root, leaving the input untouched. The board store applies the
//! result through a `set_node` operation, which keeps these functions
//! trivially undoable and safe to run against any snapshot.

use kurbo::Point;

use crate::board::Board;
use crate::element::{Direction, ElementId};
use crate::mind::node::{MindNodeElement, palette_for_level};

/// Horizontal gap between a parent edge and its children.
pub const MARGIN_X: f64 = 36.0;

/// Furthest edge distance at which a dragged node still attaches.
pub const DISTANCE_THRESHOLD: f64 = 20.0;

/// Vertical slack around a candidate parent's slot during drop targeting.
const DROP_BAND_PADDING: f64 = 10.0;

/// Vertical gap between siblings, keyed by the siblings' level.
fn margin_y(level: u32) -> f64 {
    match level {
        1 => 24.0,
        2 => 16.0,
        _ => 8.0,
    }
}

/// Recompute positions and layout caches for a whole tree.
///
/// Pass 1 walks bottom-up, assigning growth-axis x from the parent edge
/// and accumulating per-side stack heights into the `*_height` caches.
/// Pass 2 walks top-down and centers each side's stack on the parent's
/// vertical midpoint. Folded sides contribute nothing and keep whatever
/// coordinates they had. Running it twice yields the same tree.
pub fn layout(root: &MindNodeElement) -> MindNodeElement {
    let mut next = root.clone();
    measure(&mut next);
    position_children(&mut next);
    next
}

fn measure(node: &mut MindNodeElement) {
    let parent_x = node.x;
    let parent_width = node.width;
    let parent_direction = node.direction;
    let fold_left = node.is_left_fold;
    let fold_right = node.is_right_fold;

    for child in &mut node.children {
        // Below level 2 a child always grows the way its parent does.
        if child.level > 2 {
            child.direction = parent_direction;
        }
        match child.side() {
            Direction::Left => child.x = parent_x - child.width - MARGIN_X,
            Direction::Right => child.x = parent_x + parent_width + MARGIN_X,
        }
        let folded = match child.side() {
            Direction::Left => fold_left,
            Direction::Right => fold_right,
        };
        if !folded {
            measure(child);
        }
    }

    let gap = margin_y(node.level + 1);
    let mut left_height = 0.0;
    let mut left_count = 0usize;
    let mut right_height = 0.0;
    let mut right_count = 0usize;
    for child in &node.children {
        match child.side() {
            Direction::Left if !fold_left => {
                left_height += child.actual_height;
                left_count += 1;
            }
            Direction::Right if !fold_right => {
                right_height += child.actual_height;
                right_count += 1;
            }
            _ => {}
        }
    }
    if left_count > 0 {
        left_height += (left_count - 1) as f64 * gap;
    }
    if right_count > 0 {
        right_height += (right_count - 1) as f64 * gap;
    }

    if left_count + right_count > 0 {
        node.left_children_height = left_height;
        node.right_children_height = right_height;
        node.children_height = left_height.max(right_height);
        node.actual_height = node.children_height.max(node.height);
    } else {
        node.actual_height = node.height;
        node.children_height = 0.0;
        node.left_children_height = 0.0;
        node.right_children_height = 0.0;
    }
}

fn position_children(node: &mut MindNodeElement) {
    let mid_y = node.y + node.height / 2.0;
    let fold_left = node.is_left_fold;
    let fold_right = node.is_right_fold;

    for side in [Direction::Left, Direction::Right] {
        let folded = match side {
            Direction::Left => fold_left,
            Direction::Right => fold_right,
        };
        if folded {
            continue;
        }
        let stack_height = match side {
            Direction::Left => node.left_children_height,
            Direction::Right => node.right_children_height,
        };
        let mut cursor = mid_y - stack_height / 2.0;
        for child in node.children.iter_mut().filter(|c| c.side() == side) {
            child.y = cursor + (child.actual_height - child.height) / 2.0;
            cursor += child.actual_height + margin_y(child.level);
        }
    }

    for child in &mut node.children {
        let folded = match child.side() {
            Direction::Left => fold_left,
            Direction::Right => fold_right,
        };
        if !folded {
            position_children(child);
        }
    }
}

/// Rigid translation of a whole subtree. Does not re-layout.
pub fn move_all(root: &MindNodeElement, dx: f64, dy: f64) -> MindNodeElement {
    let mut next = root.clone();
    translate(&mut next, dx, dy);
    next
}

fn translate(node: &mut MindNodeElement, dx: f64, dy: f64) {
    node.x += dx;
    node.y += dy;
    for child in &mut node.children {
        translate(child, dx, dy);
    }
}

pub fn find_node(root: &MindNodeElement, id: ElementId) -> Option<&MindNodeElement> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_node(child, id))
}

fn find_node_mut(root: &mut MindNodeElement, id: ElementId) -> Option<&mut MindNodeElement> {
    if root.id == id {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_node_mut(child, id))
}

pub fn find_parent(root: &MindNodeElement, id: ElementId) -> Option<&MindNodeElement> {
    if root.children.iter().any(|child| child.id == id) {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_parent(child, id))
}

fn find_parent_mut(root: &mut MindNodeElement, id: ElementId) -> Option<&mut MindNodeElement> {
    if root.children.iter().any(|child| child.id == id) {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_parent_mut(child, id))
}

/// The top-level tree that contains the given node, if any.
pub fn root_of(board: &Board, id: ElementId) -> Option<&MindNodeElement> {
    board
        .children
        .iter()
        .filter_map(|element| element.as_mind_node())
        .filter(|root| root.is_root())
        .find(|root| find_node(root, id).is_some())
}

/// Whether `id` names a strict descendant of `node`.
pub fn is_descendant_of(node: &MindNodeElement, id: ElementId) -> bool {
    node.children
        .iter()
        .any(|child| child.id == id || is_descendant_of(child, id))
}

/// Total node count, folded subtrees included.
pub fn node_count(root: &MindNodeElement) -> usize {
    1 + root.children.iter().map(node_count).sum::<usize>()
}

/// A node can be re-parented if it is neither a root nor detached.
pub fn can_move_node(root: &MindNodeElement, node_id: ElementId) -> bool {
    match find_node(root, node_id) {
        Some(node) => !node.is_root() && find_parent(root, node_id).is_some(),
        None => false,
    }
}

enum Anchor {
    Append,
    Prepend,
    After(ElementId),
    Before(ElementId),
}

fn insert_new_child(
    root: &MindNodeElement,
    parent_id: ElementId,
    anchor: Anchor,
) -> Option<MindNodeElement> {
    let mut next = root.clone();
    let parent = find_node_mut(&mut next, parent_id)?;

    let direction = match &anchor {
        Anchor::After(id) | Anchor::Before(id) => parent
            .children
            .iter()
            .find(|child| child.id == *id)
            .and_then(|child| child.direction)
            .unwrap_or(Direction::Right),
        _ if parent.is_root() => balanced_root_side(parent),
        _ => parent.side(),
    };
    let child = MindNodeElement::new_child(parent.level + 1, direction);

    match anchor {
        Anchor::Append => parent.children.push(child),
        Anchor::Prepend => parent.children.insert(0, child),
        Anchor::After(id) => match parent.children.iter().position(|c| c.id == id) {
            Some(index) => parent.children.insert(index + 1, child),
            None => parent.children.push(child),
        },
        Anchor::Before(id) => match parent.children.iter().position(|c| c.id == id) {
            Some(index) => parent.children.insert(index, child),
            None => parent.children.push(child),
        },
    }
    Some(layout(&next))
}

/// Side a new root child should grow toward: the emptier side, right
/// when balanced. Successive additions alternate.
fn balanced_root_side(root: &MindNodeElement) -> Direction {
    let left = root
        .children
        .iter()
        .filter(|c| c.side() == Direction::Left)
        .count();
    let right = root
        .children
        .iter()
        .filter(|c| c.side() == Direction::Right)
        .count();
    if right > left {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Append a fresh empty child under `parent_id`.
pub fn add_child(root: &MindNodeElement, parent_id: ElementId) -> Option<MindNodeElement> {
    insert_new_child(root, parent_id, Anchor::Append)
}

/// Prepend a fresh empty child under `parent_id`.
pub fn add_child_before(root: &MindNodeElement, parent_id: ElementId) -> Option<MindNodeElement> {
    insert_new_child(root, parent_id, Anchor::Prepend)
}

/// Insert a fresh sibling right after `node_id`.
pub fn add_sibling(root: &MindNodeElement, node_id: ElementId) -> Option<MindNodeElement> {
    let parent_id = find_parent(root, node_id)?.id;
    insert_new_child(root, parent_id, Anchor::After(node_id))
}

/// Insert a fresh sibling right before `node_id`.
pub fn add_sibling_before(root: &MindNodeElement, node_id: ElementId) -> Option<MindNodeElement> {
    let parent_id = find_parent(root, node_id)?.id;
    insert_new_child(root, parent_id, Anchor::Before(node_id))
}

/// Remove a node (and its subtree). `None` when the node is the root
/// itself or not in this tree.
pub fn delete_node(root: &MindNodeElement, id: ElementId) -> Option<MindNodeElement> {
    if root.id == id {
        return None;
    }
    let mut next = root.clone();
    let parent = find_parent_mut(&mut next, id)?;
    parent.children.retain(|child| child.id != id);
    Some(layout(&next))
}

/// Swap a node with its previous sibling. `None` at the top.
pub fn move_node_up(root: &MindNodeElement, id: ElementId) -> Option<MindNodeElement> {
    let mut next = root.clone();
    let parent = find_parent_mut(&mut next, id)?;
    let index = parent.children.iter().position(|c| c.id == id)?;
    if index == 0 {
        return None;
    }
    parent.children.swap(index, index - 1);
    Some(layout(&next))
}

/// Swap a node with its next sibling. `None` at the bottom.
pub fn move_node_down(root: &MindNodeElement, id: ElementId) -> Option<MindNodeElement> {
    let mut next = root.clone();
    let parent = find_parent_mut(&mut next, id)?;
    let index = parent.children.iter().position(|c| c.id == id)?;
    if index + 1 >= parent.children.len() {
        return None;
    }
    parent.children.swap(index, index + 1);
    Some(layout(&next))
}

/// Flip the fold flag for one side of a node. Children keep their data.
pub fn toggle_fold(
    root: &MindNodeElement,
    id: ElementId,
    side: Direction,
) -> Option<MindNodeElement> {
    let mut next = root.clone();
    let node = find_node_mut(&mut next, id)?;
    match side {
        Direction::Left => node.is_left_fold = !node.is_left_fold,
        Direction::Right => node.is_right_fold = !node.is_right_fold,
    }
    Some(layout(&next))
}

/// Move a level-2 node (and its subtree) to the other side of the root.
/// Refused anywhere deeper, where direction is inherited.
pub fn toggle_direction(
    root: &MindNodeElement,
    id: ElementId,
    direction: Direction,
) -> Option<MindNodeElement> {
    let mut next = root.clone();
    let node = find_node_mut(&mut next, id)?;
    if node.level != 2 || node.direction == Some(direction) {
        return None;
    }
    node.direction = Some(direction);
    Some(layout(&next))
}

/// Recursively rewrite direction, level and per-level colors after a
/// node changes parents.
pub fn update_direction_and_level(
    node: &mut MindNodeElement,
    direction: Direction,
    parent_level: u32,
) {
    let palette = palette_for_level(parent_level + 1);
    node.direction = Some(direction);
    node.level = parent_level + 1;
    node.text_color = palette.text_color;
    node.background = palette.background;
    for child in &mut node.children {
        update_direction_and_level(child, direction, parent_level + 1);
    }
}

/// Splice the node out of `source_root` (when both roots are the same
/// tree) and under `new_parent_id` in `target_root`, renumbering the
/// subtree. Returns the new target root, not yet laid out. `None` when
/// the move would put a node under its own subtree.
pub fn move_node_to_new_parent(
    source_root: &MindNodeElement,
    target_root: &MindNodeElement,
    node_id: ElementId,
    new_parent_id: ElementId,
    insert_index: usize,
    direction: Direction,
) -> Option<MindNodeElement> {
    let node = find_node(source_root, node_id)?;
    if node.id == new_parent_id || is_descendant_of(node, new_parent_id) {
        return None;
    }
    let mut moved = node.clone();

    let mut next = target_root.clone();
    if source_root.id == target_root.id {
        if let Some(parent) = find_parent_mut(&mut next, node_id) {
            parent.children.retain(|child| child.id != node_id);
        }
    }
    let parent = find_node_mut(&mut next, new_parent_id)?;
    update_direction_and_level(&mut moved, direction, parent.level);
    let index = insert_index.min(parent.children.len());
    parent.children.insert(index, moved);
    Some(next)
}

/// Promote a subtree to a standalone root at `position`: level renumbered
/// from 1, root direction cleared, laid out in place. Colors are left
/// alone until the root is made permanent.
pub fn create_new_root_node(node: &MindNodeElement, position: Point) -> MindNodeElement {
    let mut next = node.clone();
    next.direction = None;
    next.x = position.x;
    next.y = position.y;
    renumber_levels(&mut next, 1);
    layout(&next)
}

fn renumber_levels(node: &mut MindNodeElement, level: u32) {
    node.level = level;
    for child in &mut node.children {
        renumber_levels(child, level + 1);
    }
}

/// Where a dragged subtree would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub parent_id: ElementId,
    pub insert_index: usize,
    pub direction: Direction,
}

/// Edge distance between a dragged node and a candidate parent.
///
/// The dragged node's vertical center must fall inside the candidate's
/// slot band (its `actual_height` plus a little slack); outside it the
/// candidate is not attachable at all. Within the band only the x
/// distance to the direction-facing edge counts; roots test both edges
/// and report the nearer side.
pub fn distance_to_attach_edge(
    dragged: &MindNodeElement,
    candidate: &MindNodeElement,
) -> Option<(f64, Direction)> {
    let dragged_mid_y = dragged.y + dragged.height / 2.0;
    let mid_y = candidate.y + candidate.height / 2.0;
    let half_slot = candidate.actual_height / 2.0;
    if dragged_mid_y < mid_y - half_slot - DROP_BAND_PADDING
        || dragged_mid_y > mid_y + half_slot + DROP_BAND_PADDING
    {
        return None;
    }

    let right_distance = (dragged.x - (candidate.x + candidate.width)).abs();
    let left_distance = ((dragged.x + dragged.width) - candidate.x).abs();

    if candidate.is_root() {
        if right_distance <= left_distance {
            Some((right_distance, Direction::Right))
        } else {
            Some((left_distance, Direction::Left))
        }
    } else {
        match candidate.side() {
            Direction::Right => Some((right_distance, Direction::Right)),
            Direction::Left => Some((left_distance, Direction::Left)),
        }
    }
}

/// The nearest attachable parent for a dragged subtree, or `None` when
/// everything is farther than the attach threshold (blank-canvas drop).
/// The dragged node and its descendants are never candidates.
pub fn find_nearest_mind_node(
    board: &Board,
    point: Point,
    dragged: &MindNodeElement,
) -> Option<DropTarget> {
    let mut nearest: Option<(&MindNodeElement, f64, Direction)> = None;
    for element in &board.children {
        let Some(tree_root) = element.as_mind_node() else {
            continue;
        };
        visit_candidates(tree_root, dragged, &mut nearest);
    }

    let (parent, distance, direction) = nearest?;
    if distance > DISTANCE_THRESHOLD {
        return None;
    }
    Some(insert_position(parent, point, direction))
}

fn visit_candidates<'a>(
    node: &'a MindNodeElement,
    dragged: &MindNodeElement,
    nearest: &mut Option<(&'a MindNodeElement, f64, Direction)>,
) {
    if node.id != dragged.id && !is_descendant_of(dragged, node.id) {
        if let Some((distance, direction)) = distance_to_attach_edge(dragged, node) {
            let better = nearest.map_or(true, |(_, best, _)| distance < best);
            if better {
                *nearest = Some((node, distance, direction));
            }
        }
    }
    for child in &node.children {
        visit_candidates(child, dragged, nearest);
    }
}

/// Pick the child slot under `parent` for a drop at `mouse`, scanning
/// same-side sibling midpoints from top to bottom.
pub fn insert_position(parent: &MindNodeElement, mouse: Point, direction: Direction) -> DropTarget {
    let children = &parent.children;
    if children.is_empty() {
        return DropTarget {
            parent_id: parent.id,
            insert_index: 0,
            direction,
        };
    }

    let same_side: Vec<&MindNodeElement> = children
        .iter()
        .filter(|child| child.direction == Some(direction))
        .collect();
    if same_side.is_empty() {
        return DropTarget {
            parent_id: parent.id,
            insert_index: children.len(),
            direction,
        };
    }

    for sibling in &same_side {
        let center_y = sibling.y + sibling.height / 2.0;
        if mouse.y < center_y {
            let index = children
                .iter()
                .position(|child| child.id == sibling.id)
                .unwrap_or(children.len());
            return DropTarget {
                parent_id: parent.id,
                insert_index: index,
                direction,
            };
        }
    }

    let last = same_side[same_side.len() - 1];
    let index = children
        .iter()
        .position(|child| child.id == last.id)
        .map(|i| i + 1)
        .unwrap_or(children.len());
    DropTarget {
        parent_id: parent.id,
        insert_index: index,
        direction,
    }
}
