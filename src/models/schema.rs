use serde::{Deserialize, Serialize};

use super::node_graph::PortId;
use super::node_kind::NodeKind;
use super::node_type::NodeType;
use super::values::{Loop, PortValue};

#[derive(Clone, Debug, PartialEq)]
pub struct InputDefinition {
    pub port: PortId,
    pub label: String,
    pub default_values: Loop,
    /// Static rows keep their type when the node's type changes.
    pub is_type_static: bool,
    /// Takes upstream values verbatim instead of coercing them into the row type.
    pub copies_upstream: bool,
}

impl InputDefinition {
    pub fn new(index: usize, label: &str, default: PortValue) -> Self {
        Self {
            port: PortId::Index(index),
            label: label.to_string(),
            default_values: vec![default],
            is_type_static: false,
            copies_upstream: false,
        }
    }

    pub fn fixed(index: usize, label: &str, default: PortValue) -> Self {
        Self {
            is_type_static: true,
            ..Self::new(index, label, default)
        }
    }

    pub fn copying(mut self) -> Self {
        self.copies_upstream = true;
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.default_values
            .first()
            .map(PortValue::node_type)
            .unwrap_or(NodeType::None)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputDefinition {
    pub label: String,
    pub node_type: NodeType,
}

impl OutputDefinition {
    pub fn new(label: &str, node_type: NodeType) -> Self {
        Self {
            label: label.to_string(),
            node_type,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeRowDefinitions {
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortDef {
    pub id: PortId,
    pub name: String,
    pub node_type: NodeType,
    pub is_type_static: bool,
}

/// Catalog entry for a node kind, as shown in an insert-node menu.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeKindDef {
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub default_type: Option<NodeType>,
    pub supported_types: Vec<NodeType>,
    pub inputs: Vec<PortDef>,
    pub outputs: Vec<PortDef>,
}
