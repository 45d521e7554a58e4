//! Error taxonomy for the graph core.
//!
//! Typed errors stop at the command/TUI boundary, where they become
//! status-line messages; nothing here is fatal to the process.

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// A flat node list that does not describe a single rooted tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("node with empty id")]
    EmptyId,

    #[error("duplicate node id '{id}'")]
    DuplicateId { id: String },

    #[error("no root node: every node declares a parent")]
    NoRoot,

    #[error("multiple root nodes: '{first}' and '{second}'")]
    MultipleRoots { first: String, second: String },

    #[error("node '{child}' references missing parent '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("node '{id}' is not reachable from the root (cycle)")]
    Unreachable { id: String },
}

/// Bad user input to an edit operation. The operation is not performed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("select at least two nodes to add a line")]
    InsufficientSelection,

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("parent node '{id}' not found")]
    UnknownParent { id: String },

    #[error("a node with id '{id}' already exists")]
    DuplicateId { id: String },

    #[error("node '{id}' not found")]
    UnknownNode { id: String },

    #[error("no line between '{src}' and '{target}'")]
    UnknownEdge { src: String, target: String },

    #[error("node '{id}' still has children")]
    HasChildren { id: String },

    #[error("the root node cannot be removed")]
    CannotRemoveRoot,
}

/// An interchange document that is not well-formed JSON for our shape.
#[derive(Debug, thiserror::Error)]
#[error("not a valid graph document: {0}")]
pub struct FormatError(#[from] pub serde_json::Error);

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Format(#[from] FormatError),
}
