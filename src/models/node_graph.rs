use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::node_kind::{LayerInputPort, NodeKind};
use super::node_type::NodeType;
use super::values::Loop;

pub type NodeId = Uuid;

/// Addresses an input: patches by position, layers by named port.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PortId {
    Index(usize),
    Layer(LayerInputPort),
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Index(i) => write!(f, "{i}"),
            PortId::Layer(port) => write!(f, "{port:?}"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct InputCoordinate {
    pub node_id: NodeId,
    pub port: PortId,
}

impl InputCoordinate {
    pub fn new(node_id: NodeId, port: PortId) -> Self {
        Self { node_id, port }
    }

    pub fn index(node_id: NodeId, index: usize) -> Self {
        Self::new(node_id, PortId::Index(index))
    }

    pub fn layer(node_id: NodeId, port: LayerInputPort) -> Self {
        Self::new(node_id, PortId::Layer(port))
    }
}

impl fmt::Display for InputCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:in[{}]", self.node_id, self.port)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct OutputCoordinate {
    pub node_id: NodeId,
    pub port_index: usize,
}

impl OutputCoordinate {
    pub fn new(node_id: NodeId, port_index: usize) -> Self {
        Self {
            node_id,
            port_index,
        }
    }
}

impl fmt::Display for OutputCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:out[{}]", self.node_id, self.port_index)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    /// Local (unconnected) values per input row, in row order.
    #[serde(default)]
    pub inputs: Vec<Loop>,
    #[serde(default)]
    pub outputs: Vec<Loop>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub input: InputCoordinate,
    pub output: OutputCoordinate,
}

/// Persistable view of a graph: nodes in insertion order plus the connection table.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    #[serde(default)]
    pub connections: Vec<ConnectionSnapshot>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
