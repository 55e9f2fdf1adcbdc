//! Mindboard Core Library
//!
//! Platform-agnostic document model, plugin system and mind-map engine
//! for the mindboard whiteboard. Rendering and the embedded rich-text
//! editor are collaborators that sit on top of this crate.

pub mod arrow;
pub mod board;
pub mod content;
pub mod element;
pub mod error;
pub mod geometry;
pub mod input;
pub mod mind;
pub mod operation;
pub mod plugin;
pub mod plugins;
pub mod selection;
pub mod viewport;

pub use arrow::{ArrowElement, MarkerKind, ARROW_SIZE};
pub use board::{Board, PersistedDocument, SubscriptionId};
pub use content::{ContentBridge, MAX_NODE_WIDTH};
pub use element::{BoardElement, Direction, ElementId, ElementKind, ElementRef, SerializableColor};
pub use error::BoardError;
pub use input::{KeyInput, Modifiers, MouseButton, PointerInput};
pub use mind::drag::{DragController, DragPhase, DragSnapshot};
pub use mind::node::MindNodeElement;
pub use operation::{Operation, Path};
pub use plugin::{ElementPlugin, RenderNode};
pub use plugins::{ArrowPlugin, MindNodePlugin};
pub use selection::Selection;
pub use viewport::ViewPort;
