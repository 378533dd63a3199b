use std::collections::HashMap;
use uuid::Uuid;

use crate::models::node_graph::NodeId;
use crate::models::values::{MediaRef, PortValue};

/// Pending and fired delay timers of one node.
#[derive(Clone, Debug, Default)]
pub struct TimerBank {
    /// Timer id to the loop index it will write.
    pub pending: HashMap<Uuid, usize>,
    /// Values delivered by fired timers, not yet emitted by the node.
    pub fired: HashMap<usize, PortValue>,
    /// Last input value seen per loop index.
    pub last_inputs: HashMap<usize, PortValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTrack {
    pub from: PortValue,
    pub to: PortValue,
    pub start_time: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaSlot {
    pub key: String,
    pub media: Option<MediaRef>,
    pub loading: bool,
}

/// Runtime-only per-node state, keyed by node id (and loop index where it varies per index).
///
/// Never persisted. [`EphemeralState::reset`] returns every node to rest.
#[derive(Clone, Debug, Default)]
pub struct EphemeralState {
    pub timers: HashMap<NodeId, TimerBank>,
    pub animations: HashMap<(NodeId, usize), AnimationTrack>,
    pub media: HashMap<(NodeId, usize), MediaSlot>,
    pub previous_values: HashMap<(NodeId, usize), PortValue>,
    pub last_pulses: HashMap<(NodeId, usize), f64>,
    /// Graph time of the last pulse a node counted, per loop index and input port.
    pub consumed_pulses: HashMap<(NodeId, usize, usize), f64>,
}

impl EphemeralState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.timers.clear();
        self.animations.clear();
        self.media.clear();
        self.previous_values.clear();
        self.last_pulses.clear();
        self.consumed_pulses.clear();
    }

    pub fn forget_node(&mut self, node_id: NodeId) {
        self.timers.remove(&node_id);
        self.animations.retain(|(id, _), _| *id != node_id);
        self.media.retain(|(id, _), _| *id != node_id);
        self.previous_values.retain(|(id, _), _| *id != node_id);
        self.last_pulses.retain(|(id, _), _| *id != node_id);
        self.consumed_pulses.retain(|(id, _, _), _| *id != node_id);
    }

    pub fn is_at_rest(&self) -> bool {
        self.timers.is_empty()
            && self.animations.is_empty()
            && self.media.is_empty()
            && self.previous_values.is_empty()
            && self.last_pulses.is_empty()
            && self.consumed_pulses.is_empty()
    }

    pub fn pending_timer_count(&self, node_id: NodeId) -> usize {
        self.timers
            .get(&node_id)
            .map(|bank| bank.pending.len())
            .unwrap_or(0)
    }
}
