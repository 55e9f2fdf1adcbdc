//! Built-in element plugins.

pub mod arrow;
pub mod mind_node;

pub use arrow::ArrowPlugin;
pub use mind_node::MindNodePlugin;
