use crate::error::{GraphError, GraphResult};
use crate::models::node_graph::{
    InputCoordinate, NodeId, NodeSnapshot, OutputCoordinate, PortId,
};
use crate::models::node_kind::NodeKind;
use crate::models::node_type::NodeType;
use crate::models::values::Loop;

use super::coercion::coerce_loop;
use super::rows::{InputRow, OutputRow};

/// Rows dropped by a node-type change; their connections must be severed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowsRemoved {
    pub inputs: Vec<InputCoordinate>,
    pub outputs: Vec<OutputCoordinate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    node_type: Option<NodeType>,
    inputs: Vec<InputRow>,
    outputs: Vec<OutputRow>,
}

impl Node {
    /// Builds a node with the rows its kind defines for `node_type`.
    ///
    /// Polymorphic kinds fall back to their default type when `node_type` is `None`.
    pub fn new(id: NodeId, kind: NodeKind, node_type: Option<NodeType>) -> GraphResult<Self> {
        let node_type = resolve_node_type(kind, node_type)?;
        let definitions = kind.row_definitions(node_type);
        let inputs = definitions
            .inputs
            .iter()
            .map(|def| InputRow::from_definition(InputCoordinate::new(id, def.port), def))
            .collect();
        let outputs = definitions
            .outputs
            .iter()
            .enumerate()
            .map(|(i, def)| OutputRow::from_definition(OutputCoordinate::new(id, i), def))
            .collect();
        Ok(Self {
            id,
            kind,
            node_type,
            inputs,
            outputs,
        })
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.node_type
    }

    pub fn inputs(&self) -> &[InputRow] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputRow] {
        &self.outputs
    }

    pub fn input_index(&self, port: PortId) -> Option<usize> {
        match port {
            PortId::Index(i) if i < self.inputs.len() && self.inputs[i].id.port == port => Some(i),
            _ => self.inputs.iter().position(|row| row.id.port == port),
        }
    }

    pub fn input(&self, port: PortId) -> Option<&InputRow> {
        self.input_index(port).map(|i| &self.inputs[i])
    }

    pub fn output(&self, port_index: usize) -> Option<&OutputRow> {
        self.outputs.get(port_index)
    }

    pub(crate) fn input_mut(&mut self, port: PortId) -> Option<&mut InputRow> {
        let index = self.input_index(port)?;
        self.inputs.get_mut(index)
    }

    pub(crate) fn input_at_mut(&mut self, index: usize) -> Option<&mut InputRow> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn output_mut(&mut self, port_index: usize) -> Option<&mut OutputRow> {
        self.outputs.get_mut(port_index)
    }

    pub fn input_loops(&self) -> Vec<Loop> {
        self.inputs
            .iter()
            .map(|row| row.all_looped_values().to_vec())
            .collect()
    }

    pub fn output_loops(&self) -> Vec<Loop> {
        self.outputs
            .iter()
            .map(|row| row.all_looped_values().to_vec())
            .collect()
    }

    /// Re-queries the row definitions for `node_type` and reshapes the rows.
    ///
    /// Surviving dynamic rows are coerced into their new types; static rows keep theirs.
    pub(crate) fn set_node_type(
        &mut self,
        node_type: NodeType,
        graph_time: f64,
    ) -> GraphResult<RowsRemoved> {
        let resolved = resolve_node_type(self.kind, Some(node_type))?;
        let definitions = self.kind.row_definitions(resolved);
        let mut removed = RowsRemoved::default();

        for (i, def) in definitions.inputs.iter().enumerate() {
            match self.inputs.get_mut(i) {
                Some(row) if row.id.port == def.port => {
                    row.label = def.label.clone();
                    row.copies_upstream = def.copies_upstream;
                    if !row.is_type_static {
                        row.retype(def.node_type(), graph_time);
                    }
                    row.is_type_static = def.is_type_static;
                }
                Some(row) => {
                    removed.inputs.push(row.id);
                    *row = InputRow::from_definition(InputCoordinate::new(self.id, def.port), def);
                }
                None => self.inputs.push(InputRow::from_definition(
                    InputCoordinate::new(self.id, def.port),
                    def,
                )),
            }
        }
        removed.inputs.extend(
            self.inputs
                .drain(definitions.inputs.len()..)
                .map(|row| row.id),
        );

        for (i, def) in definitions.outputs.iter().enumerate() {
            match self.outputs.get_mut(i) {
                Some(row) => {
                    row.label = def.label.clone();
                    row.retype(def.node_type, graph_time);
                }
                None => self.outputs.push(OutputRow::from_definition(
                    OutputCoordinate::new(self.id, i),
                    def,
                )),
            }
        }
        removed.outputs.extend(
            self.outputs
                .drain(definitions.outputs.len()..)
                .map(|row| row.id),
        );

        self.node_type = resolved;
        Ok(removed)
    }

    pub(crate) fn reset_outputs(&mut self) {
        for row in &mut self.outputs {
            row.reset();
        }
    }

    pub fn to_snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id,
            kind: self.kind,
            node_type: self.node_type,
            inputs: self
                .inputs
                .iter()
                .map(|row| row.local_values().to_vec())
                .collect(),
            outputs: self.output_loops(),
        }
    }

    pub fn from_snapshot(snapshot: &NodeSnapshot) -> GraphResult<Self> {
        let mut node = Node::new(snapshot.id, snapshot.kind, snapshot.node_type)?;
        for (row, values) in node.inputs.iter_mut().zip(&snapshot.inputs) {
            row.set_local_values(values, 0.0);
        }
        for (row, values) in node.outputs.iter_mut().zip(&snapshot.outputs) {
            let values = coerce_loop(values, row.node_type, 0.0);
            row.set_values(values);
        }
        Ok(node)
    }
}

fn resolve_node_type(kind: NodeKind, requested: Option<NodeType>) -> GraphResult<Option<NodeType>> {
    let supported = kind.supported_types();
    match requested {
        None => Ok(kind.default_type()),
        Some(node_type) if supported.contains(&node_type) => Ok(Some(node_type)),
        Some(node_type) => Err(GraphError::UnsupportedNodeType { kind, node_type }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node_kind::{Layer, LayerInputPort, Patch};
    use crate::models::values::PortValue;
    use uuid::Uuid;

    #[test]
    fn polymorphic_kinds_default_their_type() {
        let node = Node::new(Uuid::new_v4(), Patch::Add.into(), None).expect("add node");
        assert_eq!(node.node_type(), Some(NodeType::Number));
        assert_eq!(node.inputs().len(), 2);
        assert_eq!(node.outputs().len(), 1);
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let err = Node::new(Uuid::new_v4(), Patch::Subtract.into(), Some(NodeType::String))
            .expect_err("subtract has no string form");
        assert!(matches!(err, GraphError::UnsupportedNodeType { .. }));

        let err = Node::new(Uuid::new_v4(), Layer::Text.into(), Some(NodeType::Number))
            .expect_err("layers are not polymorphic");
        assert!(matches!(err, GraphError::UnsupportedNodeType { .. }));
    }

    #[test]
    fn type_change_retypes_dynamic_rows_and_keeps_static_ones() {
        let mut node = Node::new(Uuid::new_v4(), Patch::Delay.into(), Some(NodeType::Number))
            .expect("delay node");
        node.input_mut(PortId::Index(0))
            .expect("value row")
            .set_local_values(&[PortValue::Number(3.0)], 0.0);

        let removed = node
            .set_node_type(NodeType::String, 0.0)
            .expect("delay supports strings");
        assert_eq!(removed, RowsRemoved::default());
        assert_eq!(node.inputs()[0].node_type, NodeType::String);
        assert_eq!(
            node.inputs()[0].all_looped_values(),
            &[PortValue::from("3")]
        );
        assert_eq!(node.inputs()[1].node_type, NodeType::Number);
        assert_eq!(node.outputs()[0].node_type, NodeType::String);
    }

    #[test]
    fn type_change_can_shrink_rows() {
        let mut node = Node::new(Uuid::new_v4(), Patch::Unpack.into(), Some(NodeType::Point3D))
            .expect("unpack node");
        assert_eq!(node.outputs().len(), 3);
        let removed = node
            .set_node_type(NodeType::Position, 0.0)
            .expect("unpack supports positions");
        assert_eq!(node.outputs().len(), 2);
        assert_eq!(removed.outputs, vec![OutputCoordinate::new(node.id, 2)]);
    }

    #[test]
    fn layer_rows_are_addressed_by_port() {
        let node = Node::new(Uuid::new_v4(), Layer::Rectangle.into(), None).expect("rectangle");
        let row = node
            .input(PortId::Layer(LayerInputPort::Size))
            .expect("size row");
        assert_eq!(row.node_type, NodeType::Size);
        assert!(node.outputs().is_empty());
    }

    #[test]
    fn snapshot_restores_local_values() {
        let mut node = Node::new(Uuid::new_v4(), Patch::Add.into(), None).expect("add node");
        node.input_mut(PortId::Index(1))
            .expect("second input")
            .set_local_values(&[PortValue::Number(3.0)], 0.0);

        let restored = Node::from_snapshot(&node.to_snapshot()).expect("restore");
        assert_eq!(restored, node);
    }
}
