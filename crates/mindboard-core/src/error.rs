//! Error types for document mutation and tree edits.

use thiserror::Error;

use crate::operation::Path;

/// Failure modes of board and tree edits.
///
/// The board boundary is fail-soft: `Board::apply` logs these and skips
/// the offending operation instead of propagating. They surface as
/// `Result`s only on the internal resolution helpers.
#[derive(Debug, Error)]
pub enum BoardError {
    /// A path or id no longer resolves against the current tree.
    #[error("stale reference: path {0:?} does not resolve")]
    StaleReference(Path),

    /// The edit would produce an illegal tree shape.
    #[error("illegal topology: {0}")]
    IllegalTopology(&'static str),
}
