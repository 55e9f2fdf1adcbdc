//! Mind-map engine: node model, pure tree algorithms, drag-and-drop
//! re-parenting and keyboard handling.

pub mod drag;
pub mod keyboard;
pub mod node;
pub mod tree;
