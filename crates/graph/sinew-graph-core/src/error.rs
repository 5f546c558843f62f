//! Graph errors. "Not found" is deliberately distinct from "wrong type":
//! callers branch on the difference (e.g. insert-if-absent flows).

use sinew_api_core::{Time, ValueError, ValueType};
use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("no node with id {0:?} in this canvas")]
    NodeNotFound(NodeId),

    #[error("no value node is exported under \"{0}\"")]
    IdNotFound(String),

    #[error("a value node is already exported under \"{0}\"")]
    IdAlreadyExists(String),

    #[error(transparent)]
    BadType(#[from] ValueError),

    #[error("node kind {kind} cannot carry a {ty:?} value")]
    UnsupportedType { kind: &'static str, ty: ValueType },

    #[error("no link named \"{0}\"")]
    BadLinkName(String),

    #[error("link index {index} out of range ({count} links)")]
    BadLinkIndex { index: usize, count: usize },

    #[error("a waypoint already exists at {0:?}")]
    WaypointExists(Time),

    #[error("no waypoint at {0:?}")]
    WaypointNotFound(Time),

    #[error("no waypoint with id {0}")]
    WaypointIdNotFound(u64),

    #[error("no activepoint at {0:?}")]
    ActivepointNotFound(Time),

    #[error("no activepoint with id {0}")]
    ActivepointIdNotFound(u64),

    #[error("list entry index {index} out of range ({count} entries)")]
    BadListIndex { index: usize, count: usize },

    #[error("node is not of the kind this operation expects")]
    WrongNodeKind,

    #[error("evaluation recursed past the configured depth limit")]
    RecursionLimit,

    #[error("operation is not invertible: {0}")]
    NotInvertible(&'static str),
}
