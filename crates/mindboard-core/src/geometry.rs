//! Geometry helpers: traversal, path resolution, hit testing math.

use kurbo::{Point, Rect};

use crate::board::Board;
use crate::element::{ElementId, ElementRef};
use crate::operation::Path;

/// Axis-aligned rectangle overlap, closed edges.
pub fn is_rect_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Depth-first walk over every element, parents before children.
pub fn for_each_element<'a>(board: &'a Board, f: &mut impl FnMut(ElementRef<'a>)) {
    for element in &board.children {
        visit(element.as_ref(), f);
    }
}

fn visit<'a>(element: ElementRef<'a>, f: &mut impl FnMut(ElementRef<'a>)) {
    f(element);
    if let ElementRef::MindNode(node) = element {
        for child in &node.children {
            visit(ElementRef::MindNode(child), f);
        }
    }
}

/// Find an element anywhere in the document by id.
pub fn find_element(board: &Board, id: ElementId) -> Option<ElementRef<'_>> {
    let mut found = None;
    for_each_element(board, &mut |element| {
        if found.is_none() && element.id() == id {
            found = Some(element);
        }
    });
    found
}

/// The index path of an element, resolved against the current tree.
/// Positional, so it is stale the moment siblings shift.
pub fn path_of(board: &Board, id: ElementId) -> Option<Path> {
    for (index, element) in board.children.iter().enumerate() {
        if element.id() == id {
            return Some(vec![index]);
        }
        if let Some(node) = element.as_mind_node() {
            let mut path = vec![index];
            if path_in_subtree(node, id, &mut path) {
                return Some(path);
            }
        }
    }
    None
}

fn path_in_subtree(
    node: &crate::mind::node::MindNodeElement,
    id: ElementId,
    path: &mut Path,
) -> bool {
    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        if child.id == id || path_in_subtree(child, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Resolve a path against the current tree.
pub fn element_at<'a>(board: &'a Board, path: &[usize]) -> Option<ElementRef<'a>> {
    let (first, rest) = path.split_first()?;
    let mut current = board.children.get(*first)?.as_ref();
    for index in rest {
        let node = current.as_mind_node()?;
        current = ElementRef::MindNode(node.children.get(*index)?);
    }
    Some(current)
}

/// All elements containing the given document point, in paint order.
/// The last entry is the topmost; callers that want a single element
/// take it.
pub fn hit_elements(board: &Board, point: Point) -> Vec<ElementId> {
    let mut hits = Vec::new();
    for_each_element(board, &mut |element| {
        let hit = match element {
            ElementRef::MindNode(node) => node.hit_test(point),
            ElementRef::Arrow(arrow) => arrow.hit_test(point, crate::arrow::ARROW_HIT_TOLERANCE),
        };
        if hit {
            hits.push(element.id());
        }
    });
    hits
}

/// Distance from a point to a line segment.
pub fn point_to_segment_distance(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let len2 = seg.hypot2();
    if len2 < f64::EPSILON {
        return (point - a).hypot();
    }
    let t = ((point - a).dot(seg) / len2).clamp(0.0, 1.0);
    let projection = a + seg * t;
    (point - projection).hypot()
}

/// Whether the segment `a..b` touches the rectangle.
pub fn segment_intersects_rect(a: Point, b: Point, rect: Rect) -> bool {
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    for i in 0..4 {
        if segments_intersect(a, b, corners[i], corners[(i + 1) % 4]) {
            return true;
        }
    }
    false
}

fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1.abs() < f64::EPSILON && on_segment(p3, p4, p1))
        || (d2.abs() < f64::EPSILON && on_segment(p3, p4, p2))
        || (d3.abs() < f64::EPSILON && on_segment(p1, p2, p3))
        || (d4.abs() < f64::EPSILON && on_segment(p1, p2, p4))
}

fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
