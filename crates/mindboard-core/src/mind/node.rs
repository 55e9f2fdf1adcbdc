//! Mind node element.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{Direction, ElementId, SerializableColor};

/// Default size of a freshly created, empty node.
pub const NEW_NODE_WIDTH: f64 = 24.0;
pub const NEW_NODE_HEIGHT: f64 = 48.0;

/// Per-level color pair for node background and text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MindPalette {
    pub background: SerializableColor,
    pub text_color: SerializableColor,
}

/// Colors assigned by depth; entry 0 styles roots, deeper levels reuse
/// the last entry.
pub const MIND_COLORS: &[MindPalette] = &[
    MindPalette {
        background: SerializableColor::rgb(80, 110, 228),
        text_color: SerializableColor::WHITE,
    },
    MindPalette {
        background: SerializableColor::rgb(189, 210, 253),
        text_color: SerializableColor::rgb(38, 38, 38),
    },
    MindPalette {
        background: SerializableColor::rgb(234, 240, 254),
        text_color: SerializableColor::rgb(38, 38, 38),
    },
    MindPalette {
        background: SerializableColor::rgb(245, 245, 245),
        text_color: SerializableColor::rgb(89, 89, 89),
    },
];

/// The palette entry for a node at the given level (roots are level 1).
pub fn palette_for_level(level: u32) -> &'static MindPalette {
    let index = (level.saturating_sub(1) as usize).min(MIND_COLORS.len() - 1);
    &MIND_COLORS[index]
}

/// A node in a mind tree.
///
/// `x`/`y` is the top-left corner in document space. The `*_height`
/// fields are layout caches committed by `tree::layout`; they are stored
/// on the node so hit testing and drop targeting can read them without
/// re-running layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindNodeElement {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Opaque rich-text value owned by the embedded editor.
    pub text: serde_json::Value,
    pub text_color: SerializableColor,
    pub background: SerializableColor,
    pub border: SerializableColor,
    /// `None` on roots; roots grow both ways.
    pub direction: Option<Direction>,
    /// Depth in the tree, roots are 1.
    pub level: u32,
    pub is_left_fold: bool,
    pub is_right_fold: bool,
    /// One-shot flag: the editor focuses this node on mount, then clears it.
    #[serde(default)]
    pub default_focus: bool,
    /// Height of this node's subtree slot (max of own height and the
    /// taller side's children stack).
    #[serde(default)]
    pub actual_height: f64,
    /// Taller of the two side stacks.
    #[serde(default)]
    pub children_height: f64,
    #[serde(default)]
    pub left_children_height: f64,
    #[serde(default)]
    pub right_children_height: f64,
    pub children: Vec<MindNodeElement>,
}

/// The rich-text value of an empty node.
pub fn empty_text() -> serde_json::Value {
    serde_json::json!([{
        "type": "paragraph",
        "children": [{ "type": "formatted", "text": "" }]
    }])
}

impl MindNodeElement {
    /// A standalone root at the given position.
    pub fn new_root(position: Point) -> Self {
        let palette = palette_for_level(1);
        Self {
            id: Uuid::new_v4(),
            x: position.x,
            y: position.y,
            width: NEW_NODE_WIDTH,
            height: NEW_NODE_HEIGHT,
            text: empty_text(),
            text_color: palette.text_color,
            background: palette.background,
            border: SerializableColor::TRANSPARENT,
            direction: None,
            level: 1,
            is_left_fold: false,
            is_right_fold: false,
            default_focus: true,
            actual_height: NEW_NODE_HEIGHT,
            children_height: 0.0,
            left_children_height: 0.0,
            right_children_height: 0.0,
            children: Vec::new(),
        }
    }

    /// A fresh empty child at `level` growing toward `direction`,
    /// positioned by the next layout pass.
    pub fn new_child(level: u32, direction: Direction) -> Self {
        let palette = palette_for_level(level);
        Self {
            id: Uuid::new_v4(),
            x: 0.0,
            y: 0.0,
            width: NEW_NODE_WIDTH,
            height: NEW_NODE_HEIGHT,
            text: empty_text(),
            text_color: palette.text_color,
            background: palette.background,
            border: SerializableColor::TRANSPARENT,
            direction: Some(direction),
            level,
            is_left_fold: false,
            is_right_fold: false,
            default_focus: true,
            actual_height: NEW_NODE_HEIGHT,
            children_height: 0.0,
            left_children_height: 0.0,
            right_children_height: 0.0,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.level == 1
    }

    /// Effective growth side; roots report `Right` for geometry that
    /// needs a single answer.
    pub fn side(&self) -> Direction {
        self.direction.unwrap_or(Direction::Right)
    }

    /// Whether children on the given side are folded away.
    pub fn fold_for(&self, side: Direction) -> bool {
        match side {
            Direction::Left => self.is_left_fold,
            Direction::Right => self.is_right_fold,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_clamps_deep_levels() {
        assert_eq!(palette_for_level(1), &MIND_COLORS[0]);
        assert_eq!(palette_for_level(2), &MIND_COLORS[1]);
        assert_eq!(palette_for_level(99), &MIND_COLORS[MIND_COLORS.len() - 1]);
    }

    #[test]
    fn test_root_has_no_direction() {
        let root = MindNodeElement::new_root(Point::new(10.0, 20.0));
        assert!(root.is_root());
        assert!(root.direction.is_none());
        assert_eq!(root.side(), Direction::Right);
    }

    #[test]
    fn test_hit_test() {
        let mut node = MindNodeElement::new_root(Point::new(0.0, 0.0));
        node.width = 100.0;
        node.height = 40.0;
        assert!(node.hit_test(Point::new(50.0, 20.0)));
        assert!(!node.hit_test(Point::new(150.0, 20.0)));
    }
}
