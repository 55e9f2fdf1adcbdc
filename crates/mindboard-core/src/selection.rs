//! Selection state.

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::element::ElementId;

/// The board's current selection.
///
/// `select_area` is the marquee rectangle while the user is rubber-band
/// selecting; it is cleared by any structural document change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub select_area: Option<Rect>,
    pub selected_elements: Vec<ElementId>,
}

impl Selection {
    pub fn single(id: ElementId) -> Self {
        Self {
            select_area: None,
            selected_elements: vec![id],
        }
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected_elements.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_elements.is_empty() && self.select_area.is_none()
    }

    pub fn clear(&mut self) {
        self.select_area = None;
        self.selected_elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_single_selection() {
        let id = Uuid::new_v4();
        let selection = Selection::single(id);
        assert!(selection.is_selected(id));
        assert!(!selection.is_selected(Uuid::new_v4()));
    }

    #[test]
    fn test_clear() {
        let mut selection = Selection::single(Uuid::new_v4());
        selection.select_area = Some(Rect::new(0.0, 0.0, 10.0, 10.0));
        selection.clear();
        assert!(selection.is_empty());
    }
}
