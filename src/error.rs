//! Rejections returned by graph mutations.

use thiserror::Error;

use crate::models::node_graph::{InputCoordinate, NodeId, OutputCoordinate};
use crate::models::node_kind::NodeKind;
use crate::models::node_type::NodeType;

/// Errors that can occur while mutating a graph.
///
/// A mutation that returns an error leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Node with the given id was not found.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Input port does not exist on its node.
    #[error("input not found: {0}")]
    InputNotFound(InputCoordinate),

    /// Output port does not exist on its node.
    #[error("output not found: {0}")]
    OutputNotFound(OutputCoordinate),

    /// The connection would close a cycle.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Source node of the rejected edge.
        from: NodeId,
        /// Destination node of the rejected edge.
        to: NodeId,
    },

    /// The node kind cannot take the requested type.
    #[error("{kind} does not support node type {node_type}")]
    UnsupportedNodeType {
        /// Kind of the node.
        kind: NodeKind,
        /// Requested type.
        node_type: NodeType,
    },

    /// A node with this id is already in the graph.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An imported connection references a missing node or port.
    #[error("dangling connection: {input} <- {output}")]
    DanglingConnection {
        /// Destination input.
        input: InputCoordinate,
        /// Source output.
        output: OutputCoordinate,
    },

    /// An imported snapshot could not be parsed.
    #[error("invalid graph snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for graph mutations.
pub type GraphResult<T> = Result<T, GraphError>;
