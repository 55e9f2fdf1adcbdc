//! Board element model.
//!
//! The document is a tree of elements. Mind-map nodes form nested
//! subtrees; arrows are flat. Every element carries a stable id that
//! survives structural edits, so references held across operations
//! (selection, drag state) stay meaningful.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arrow::ArrowElement;
use crate::mind::node::MindNodeElement;

/// Stable identity of an element, independent of its position in the tree.
pub type ElementId = Uuid;

/// Which side of its root a mind node grows toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// The opposite side.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Discriminant used by the plugin registry to route element queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    MindNode,
    Arrow,
}

/// A top-level document element.
///
/// Mind nodes nest through their own typed children; the board only ever
/// stores roots (and arrows) directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BoardElement {
    MindNode(MindNodeElement),
    Arrow(ArrowElement),
}

impl BoardElement {
    pub fn id(&self) -> ElementId {
        match self {
            BoardElement::MindNode(node) => node.id,
            BoardElement::Arrow(arrow) => arrow.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            BoardElement::MindNode(_) => ElementKind::MindNode,
            BoardElement::Arrow(_) => ElementKind::Arrow,
        }
    }

    /// Borrowed view usable for both top-level and nested elements.
    pub fn as_ref(&self) -> ElementRef<'_> {
        match self {
            BoardElement::MindNode(node) => ElementRef::MindNode(node),
            BoardElement::Arrow(arrow) => ElementRef::Arrow(arrow),
        }
    }

    pub fn as_mind_node(&self) -> Option<&MindNodeElement> {
        match self {
            BoardElement::MindNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_mind_node_mut(&mut self) -> Option<&mut MindNodeElement> {
        match self {
            BoardElement::MindNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_arrow(&self) -> Option<&ArrowElement> {
        match self {
            BoardElement::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }
}

impl From<MindNodeElement> for BoardElement {
    fn from(node: MindNodeElement) -> Self {
        BoardElement::MindNode(node)
    }
}

impl From<ArrowElement> for BoardElement {
    fn from(arrow: ArrowElement) -> Self {
        BoardElement::Arrow(arrow)
    }
}

/// Borrowed element view.
///
/// Nested mind nodes are not `BoardElement`s, so traversals and the
/// plugin contract speak in terms of this view instead.
#[derive(Debug, Clone, Copy)]
pub enum ElementRef<'a> {
    MindNode(&'a MindNodeElement),
    Arrow(&'a ArrowElement),
}

impl<'a> ElementRef<'a> {
    pub fn id(&self) -> ElementId {
        match self {
            ElementRef::MindNode(node) => node.id,
            ElementRef::Arrow(arrow) => arrow.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementRef::MindNode(_) => ElementKind::MindNode,
            ElementRef::Arrow(_) => ElementKind::Arrow,
        }
    }

    pub fn as_mind_node(&self) -> Option<&'a MindNodeElement> {
        match self {
            ElementRef::MindNode(node) => Some(node),
            _ => None,
        }
    }

    /// Owned copy, re-wrapped as a board element.
    pub fn to_element(&self) -> BoardElement {
        match self {
            ElementRef::MindNode(node) => BoardElement::MindNode((*node).clone()),
            ElementRef::Arrow(arrow) => BoardElement::Arrow((*arrow).clone()),
        }
    }
}

/// A serializable RGBA color that can convert to/from peniko colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl From<peniko::Color> for SerializableColor {
    fn from(color: peniko::Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for peniko::Color {
    fn from(color: SerializableColor) -> Self {
        peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_roundtrip() {
        let original = SerializableColor::new(120, 40, 200, 128);
        let peniko: peniko::Color = original.into();
        let back: SerializableColor = peniko.into();
        assert_eq!(original, back);
    }

    #[test]
    fn test_transparent() {
        assert!(SerializableColor::TRANSPARENT.is_transparent());
        assert!(!SerializableColor::BLACK.is_transparent());
    }

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
    }
}
