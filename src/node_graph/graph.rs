//! Node map plus connection table, with adjacency derived lazily from the table.

use std::collections::{HashMap, HashSet, VecDeque};

use once_cell::unsync::OnceCell;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{GraphError, GraphResult};
use crate::models::node_graph::{
    ConnectionSnapshot, GraphSnapshot, InputCoordinate, NodeId, OutputCoordinate,
};
use crate::models::node_type::NodeType;
use crate::models::values::{Loop, PortValue};

use super::coercion::coerce_loop;
use super::invariant_violated;
use super::node::{Node, RowsRemoved};
use super::state::EphemeralState;

/// Dependency view of the connection table. Rebuilt on first use after any edge change.
#[derive(Debug)]
struct Topology {
    dependency_graph: DiGraph<NodeId, ()>,
    indices: HashMap<NodeId, NodeIndex>,
    upstream: HashMap<NodeId, Vec<NodeId>>,
    downstream: HashMap<NodeId, Vec<NodeId>>,
    sorted: Vec<NodeId>,
}

impl Topology {
    fn build(order: &[NodeId], connections: &HashMap<InputCoordinate, OutputCoordinate>) -> Self {
        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut dependency_graph = DiGraph::new();
        let mut indices = HashMap::new();
        for id in order {
            indices.insert(*id, dependency_graph.add_node(*id));
        }

        let mut edges: Vec<(usize, usize)> = connections
            .iter()
            .filter_map(|(input, output)| {
                Some((*position.get(&output.node_id)?, *position.get(&input.node_id)?))
            })
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        edges.sort_unstable();

        let mut upstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut downstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (from, to) in &edges {
            let (from_id, to_id) = (order[*from], order[*to]);
            dependency_graph.add_edge(indices[&from_id], indices[&to_id], ());
            downstream.entry(from_id).or_default().push(to_id);
            upstream.entry(to_id).or_default().push(from_id);
        }
        for list in upstream.values_mut() {
            list.sort_by_key(|id| position[id]);
        }

        let sorted = match toposort(&dependency_graph, None) {
            Ok(sorted) => sorted.into_iter().map(|idx| dependency_graph[idx]).collect(),
            Err(_) => {
                invariant_violated("connection table contains a cycle");
                order.to_vec()
            }
        };

        Self {
            dependency_graph,
            indices,
            upstream,
            downstream,
            sorted,
        }
    }

    /// Whether `from` already depends on `to`, so an edge `from -> to` would close a loop.
    fn would_cycle(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        match (self.indices.get(&to), self.indices.get(&from)) {
            (Some(to), Some(from)) => has_path_connecting(&self.dependency_graph, *to, *from, None),
            _ => false,
        }
    }
}

/// The dataflow graph: nodes, the connection table, and the runtime side-table.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    /// Insertion order, used to break ties deterministically.
    order: Vec<NodeId>,
    connections: HashMap<InputCoordinate, OutputCoordinate>,
    pending: HashSet<NodeId>,
    pub(crate) ephemeral: EphemeralState,
    topology: OnceCell<Topology>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    fn topology(&self) -> &Topology {
        self.topology
            .get_or_init(|| Topology::build(&self.order, &self.connections))
    }

    fn invalidate_topology(&mut self) {
        self.topology.take();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn connection(&self, input: InputCoordinate) -> Option<OutputCoordinate> {
        self.connections.get(&input).copied()
    }

    pub fn connections(&self) -> impl Iterator<Item = (InputCoordinate, OutputCoordinate)> + '_ {
        self.connections.iter().map(|(i, o)| (*i, *o))
    }

    /// Every input fed by `output`.
    pub fn connections_from(&self, output: OutputCoordinate) -> Vec<InputCoordinate> {
        let mut inputs: Vec<InputCoordinate> = self
            .connections
            .iter()
            .filter(|(_, o)| **o == output)
            .map(|(i, _)| *i)
            .collect();
        inputs.sort_by_key(|i| (i.node_id, i.port));
        inputs
    }

    pub fn immediately_upstream_nodes(&self, id: NodeId) -> HashSet<NodeId> {
        self.upstream_ordered(id).iter().copied().collect()
    }

    pub fn immediately_downstream_nodes(&self, id: NodeId) -> HashSet<NodeId> {
        self.downstream_ordered(id).iter().copied().collect()
    }

    pub(crate) fn upstream_ordered(&self, id: NodeId) -> &[NodeId] {
        self.topology()
            .upstream
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn downstream_ordered(&self, id: NodeId) -> &[NodeId] {
        self.topology()
            .downstream
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Seeds plus everything reachable downstream of them. Unknown ids are dropped.
    pub fn downstream_closure(&self, seeds: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
        let mut closure = HashSet::new();
        let mut queue: VecDeque<NodeId> = seeds
            .into_iter()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        while let Some(id) = queue.pop_front() {
            if !closure.insert(id) {
                continue;
            }
            queue.extend(self.downstream_ordered(id).iter().copied());
        }
        closure
    }

    /// `subset` in dependency order.
    pub fn topological_order(&self, subset: &HashSet<NodeId>) -> Vec<NodeId> {
        self.topology()
            .sorted
            .iter()
            .filter(|id| subset.contains(id))
            .copied()
            .collect()
    }

    pub fn insert_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        self.order.push(id);
        self.invalidate_topology();
        Ok(id)
    }

    /// Removes the node and every edge touching it. Returns the nodes that lost an input.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Vec<NodeId>> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let affected = self.downstream_ordered(id).to_vec();

        let severed: Vec<InputCoordinate> = self
            .connections
            .iter()
            .filter(|(input, output)| input.node_id == id || output.node_id == id)
            .map(|(input, _)| *input)
            .collect();
        for input in severed {
            self.connections.remove(&input);
            if input.node_id != id {
                self.restore_input(input);
            }
        }

        self.nodes.remove(&id);
        self.order.retain(|other| *other != id);
        self.pending.remove(&id);
        self.ephemeral.forget_node(id);
        self.invalidate_topology();
        Ok(affected.into_iter().filter(|other| *other != id).collect())
    }

    fn validate_output(&self, output: OutputCoordinate) -> GraphResult<()> {
        let node = self
            .nodes
            .get(&output.node_id)
            .ok_or(GraphError::NodeNotFound(output.node_id))?;
        node.output(output.port_index)
            .map(|_| ())
            .ok_or(GraphError::OutputNotFound(output))
    }

    fn validate_input(&self, input: InputCoordinate) -> GraphResult<()> {
        let node = self
            .nodes
            .get(&input.node_id)
            .ok_or(GraphError::NodeNotFound(input.node_id))?;
        node.input(input.port)
            .map(|_| ())
            .ok_or(GraphError::InputNotFound(input))
    }

    /// Connects `output` to `input`, replacing any previous upstream of `input`.
    ///
    /// Returns the replaced connection. Rejects edges that would close a cycle.
    pub fn set_connection(
        &mut self,
        output: OutputCoordinate,
        input: InputCoordinate,
    ) -> GraphResult<Option<OutputCoordinate>> {
        self.validate_output(output)?;
        self.validate_input(input)?;
        if self.connections.get(&input) == Some(&output) {
            return Ok(Some(output));
        }
        if self.topology().would_cycle(output.node_id, input.node_id) {
            return Err(GraphError::CycleDetected {
                from: output.node_id,
                to: input.node_id,
            });
        }
        let previous = self.connections.insert(input, output);
        self.invalidate_topology();
        Ok(previous)
    }

    /// Drops the upstream of `input`; the input falls back to its last local value.
    ///
    /// Returns the removed connection, `None` when the input was not connected.
    pub fn remove_connection(
        &mut self,
        input: InputCoordinate,
    ) -> GraphResult<Option<OutputCoordinate>> {
        self.validate_input(input)?;
        let Some(removed) = self.connections.remove(&input) else {
            return Ok(None);
        };
        self.restore_input(input);
        self.invalidate_topology();
        Ok(Some(removed))
    }

    /// Severs every fan-out edge from `output`. Returns the inputs that were disconnected.
    pub fn remove_connections_from(
        &mut self,
        output: OutputCoordinate,
    ) -> GraphResult<Vec<InputCoordinate>> {
        self.validate_output(output)?;
        Ok(self.sever_connections_from(output))
    }

    fn sever_connections_from(&mut self, output: OutputCoordinate) -> Vec<InputCoordinate> {
        let inputs = self.connections_from(output);
        for input in &inputs {
            self.connections.remove(input);
            self.restore_input(*input);
        }
        if !inputs.is_empty() {
            self.invalidate_topology();
        }
        inputs
    }

    fn restore_input(&mut self, input: InputCoordinate) {
        if let Some(row) = self
            .nodes
            .get_mut(&input.node_id)
            .and_then(|node| node.input_mut(input.port))
        {
            row.restore_local_values();
        }
    }

    /// Records a local edit, detaching any upstream connection first.
    pub fn set_input_values(
        &mut self,
        input: InputCoordinate,
        values: &[PortValue],
        graph_time: f64,
    ) -> GraphResult<bool> {
        self.validate_input(input)?;
        if self.connections.remove(&input).is_some() {
            self.invalidate_topology();
        }
        let row = self
            .nodes
            .get_mut(&input.node_id)
            .and_then(|node| node.input_mut(input.port))
            .ok_or(GraphError::InputNotFound(input))?;
        Ok(row.set_local_values(values, graph_time))
    }

    /// Overwrites an output loop, coercing into the row's type.
    pub fn set_output_values(
        &mut self,
        output: OutputCoordinate,
        values: &[PortValue],
        graph_time: f64,
    ) -> GraphResult<bool> {
        let row = self
            .nodes
            .get_mut(&output.node_id)
            .ok_or(GraphError::NodeNotFound(output.node_id))?
            .output_mut(output.port_index)
            .ok_or(GraphError::OutputNotFound(output))?;
        let values = coerce_loop(values, row.node_type, graph_time);
        Ok(row.set_values(values))
    }

    /// Reshapes the node's rows for `node_type` and severs edges on rows that went away.
    pub fn change_node_type(
        &mut self,
        id: NodeId,
        node_type: NodeType,
        graph_time: f64,
    ) -> GraphResult<RowsRemoved> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        let removed = node.set_node_type(node_type, graph_time)?;
        for input in &removed.inputs {
            self.connections.remove(input);
        }
        for output in &removed.outputs {
            self.sever_connections_from(*output);
        }
        self.invalidate_topology();
        Ok(removed)
    }

    /// Marks nodes for the next graph step without computing anything now.
    pub fn mark_pending(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            if self.nodes.contains_key(&id) {
                self.pending.insert(id);
            }
        }
    }

    pub fn pending(&self) -> &HashSet<NodeId> {
        &self.pending
    }

    pub(crate) fn take_pending(&mut self) -> HashSet<NodeId> {
        std::mem::take(&mut self.pending)
    }

    /// Current loop of the output feeding `input`, if connected.
    pub(crate) fn upstream_values(&self, input: InputCoordinate) -> Option<Loop> {
        let output = self.connections.get(&input)?;
        let row = self.nodes.get(&output.node_id)?.output(output.port_index)?;
        Some(row.all_looped_values().to_vec())
    }

    /// Disjoint borrows of a node and the ephemeral side-table.
    pub(crate) fn eval_parts(&mut self, id: NodeId) -> Option<(&mut Node, &mut EphemeralState)> {
        let node = self.nodes.get_mut(&id)?;
        Some((node, &mut self.ephemeral))
    }

    pub fn ephemeral(&self) -> &EphemeralState {
        &self.ephemeral
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        let position: HashMap<NodeId, usize> =
            self.order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut connections: Vec<ConnectionSnapshot> = self
            .connections
            .iter()
            .map(|(input, output)| ConnectionSnapshot {
                input: *input,
                output: *output,
            })
            .collect();
        connections.sort_by_key(|c| (position.get(&c.input.node_id).copied(), c.input.port));
        GraphSnapshot {
            nodes: self.nodes().map(Node::to_snapshot).collect(),
            connections,
        }
    }

    /// Builds a graph from a snapshot, rejecting duplicates, dangling edges and cycles.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> GraphResult<Self> {
        let mut graph = Graph::new();
        for node in &snapshot.nodes {
            graph.insert_node(Node::from_snapshot(node)?)?;
        }
        for connection in &snapshot.connections {
            match graph.set_connection(connection.output, connection.input) {
                Ok(_) => {}
                Err(err @ GraphError::CycleDetected { .. }) => return Err(err),
                Err(_) => {
                    return Err(GraphError::DanglingConnection {
                        input: connection.input,
                        output: connection.output,
                    })
                }
            }
        }
        Ok(graph)
    }
}
