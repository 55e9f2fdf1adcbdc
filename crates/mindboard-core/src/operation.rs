//! Document operations.
//!
//! Every mutation of the board flows through these as data. Each carries
//! enough of the prior state to be inverted, which is what the undo
//! stack stores and what remote sync would ship.

use serde::{Deserialize, Serialize};

use crate::element::BoardElement;
use crate::selection::Selection;

/// Address of an element as child indices from the board root.
///
/// Paths are positional and go stale the moment siblings shift; they are
/// always resolved at apply time, never cached across edits.
pub type Path = Vec<usize>;

/// A single atomic document edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Whole-element replacement at `path`. Carries the old value so the
    /// operation can be inverted without consulting the document.
    SetNode {
        path: Path,
        properties: Box<BoardElement>,
        new_properties: Box<BoardElement>,
    },
    /// Insert `node` so that it ends up at `path` (the last index is the
    /// insertion position within the parent's children).
    InsertNode { path: Path, node: Box<BoardElement> },
    /// Remove the element at `path`; `node` is the removed value.
    RemoveNode { path: Path, node: Box<BoardElement> },
    /// Replace the selection wholesale.
    SetSelection {
        properties: Selection,
        new_properties: Selection,
    },
}

impl Operation {
    pub fn set_node(path: Path, old: BoardElement, new: BoardElement) -> Self {
        Operation::SetNode {
            path,
            properties: Box::new(old),
            new_properties: Box::new(new),
        }
    }

    pub fn insert_node(path: Path, node: BoardElement) -> Self {
        Operation::InsertNode {
            path,
            node: Box::new(node),
        }
    }

    pub fn remove_node(path: Path, node: BoardElement) -> Self {
        Operation::RemoveNode {
            path,
            node: Box::new(node),
        }
    }

    pub fn set_selection(old: Selection, new: Selection) -> Self {
        Operation::SetSelection {
            properties: old,
            new_properties: new,
        }
    }

    /// Whether applying this operation changes the tree shape.
    pub fn is_structural(&self) -> bool {
        matches!(self, Operation::InsertNode { .. } | Operation::RemoveNode { .. })
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => Operation::SetNode {
                path: path.clone(),
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
            Operation::InsertNode { path, node } => Operation::RemoveNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::RemoveNode { path, node } => Operation::InsertNode {
                path: path.clone(),
                node: node.clone(),
            },
            Operation::SetSelection {
                properties,
                new_properties,
            } => Operation::SetSelection {
                properties: new_properties.clone(),
                new_properties: properties.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrow::ArrowElement;
    use kurbo::Point;

    fn sample_arrow() -> BoardElement {
        ArrowElement::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]).into()
    }

    #[test]
    fn test_inverse_is_involutive() {
        let op = Operation::insert_node(vec![2], sample_arrow());
        assert_eq!(op.inverse().inverse(), op);
    }

    #[test]
    fn test_insert_inverts_to_remove() {
        let op = Operation::insert_node(vec![0], sample_arrow());
        assert!(matches!(op.inverse(), Operation::RemoveNode { .. }));
    }

    #[test]
    fn test_set_node_inverse_swaps_values() {
        let a = sample_arrow();
        let b = sample_arrow();
        let op = Operation::set_node(vec![1], a.clone(), b.clone());
        match op.inverse() {
            Operation::SetNode {
                properties,
                new_properties,
                ..
            } => {
                assert_eq!(*properties, b);
                assert_eq!(*new_properties, a);
            }
            other => panic!("unexpected inverse: {other:?}"),
        }
    }

    #[test]
    fn test_structural_classification() {
        let op = Operation::insert_node(vec![0], sample_arrow());
        assert!(op.is_structural());
        let op = Operation::set_selection(Selection::default(), Selection::default());
        assert!(!op.is_structural());
    }

    #[test]
    fn test_serde_roundtrip() {
        let op = Operation::remove_node(vec![0, 2], sample_arrow());
        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
