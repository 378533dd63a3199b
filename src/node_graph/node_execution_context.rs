use crate::models::node_graph::NodeId;
use crate::models::node_type::NodeType;
use crate::models::values::{Loop, PortValue};

use super::context::GraphStepState;
use super::effects::EffectRequest;
use super::loops::adjusted_index;
use super::state::EphemeralState;

/// Everything an impure eval may read or mutate for one node.
pub struct NodeExecutionContext<'a> {
    pub node_id: NodeId,
    pub node_type: Option<NodeType>,
    pub inputs: &'a [Loop],
    /// Outputs as they stood before this evaluation.
    pub previous_outputs: &'a [Loop],
    pub step: &'a GraphStepState,
    pub state: &'a mut EphemeralState,
    pub(crate) effects: &'a mut Vec<EffectRequest>,
}

impl NodeExecutionContext<'_> {
    pub fn graph_time(&self) -> f64 {
        self.step.graph_time
    }

    /// Previous output at `index`, if the port had one of the expected type.
    pub fn previous_output(&self, port: usize, index: usize, expected: NodeType) -> Option<PortValue> {
        let values = self.previous_outputs.get(port)?;
        let value = values.get(adjusted_index(index, values.len()))?;
        (value.node_type() == expected).then(|| value.clone())
    }

    pub fn request(&mut self, effect: EffectRequest) {
        self.effects.push(effect);
    }
}
