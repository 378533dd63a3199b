//! Single-threaded owner of a graph: applies intents, ticks frames, and folds
//! asynchronous completions back in through `calculate`.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::runtime::Handle;
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};
use crate::models::node_graph::{GraphSnapshot, InputCoordinate, NodeId, OutputCoordinate};
use crate::models::node_kind::{NodeKind, Patch};
use crate::models::node_type::NodeType;
use crate::models::values::{Loop, PortValue};
use crate::settings::{EngineSettings, TimerDriverKind};

use super::context::{FieldRefreshThrottle, GraphStepState};
use super::effects::{
    EffectEvent, EffectKind, EffectQueue, EffectRequest, EffectSender, Generation, MediaLoader,
    TimerDriver,
};
use super::executor::{self, RunSummary};
use super::graph::Graph;
use super::node::Node;

/// An edit forwarded by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphIntent {
    SetInput {
        input: InputCoordinate,
        values: Loop,
    },
    Connect {
        output: OutputCoordinate,
        input: InputCoordinate,
    },
    Disconnect {
        input: InputCoordinate,
    },
    RemoveConnectionsFrom {
        output: OutputCoordinate,
    },
    ChangeNodeType {
        node: NodeId,
        node_type: NodeType,
    },
    InsertNode {
        /// Generated when `None`.
        id: Option<NodeId>,
        kind: NodeKind,
        node_type: Option<NodeType>,
    },
    DeleteNode {
        node: NodeId,
    },
    /// A value produced outside the graph (media, location, AR) for a node's output.
    ProvideOutput {
        output: OutputCoordinate,
        values: Loop,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntentOutcome {
    /// The inserted node, for `InsertNode`.
    pub node: Option<NodeId>,
    pub summary: RunSummary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub summary: RunSummary,
    /// Whether auxiliary UI fields should refresh on this frame.
    pub refresh_fields: bool,
    pub estimated_fps: f64,
}

pub struct GraphEngine {
    graph: Graph,
    step: GraphStepState,
    settings: EngineSettings,
    effects: EffectQueue,
    /// Bumped on prototype restart and graph import; older completions are stale.
    epoch: u64,
    throttle: FieldRefreshThrottle,
}

fn resolve_driver(kind: TimerDriverKind) -> TimerDriver {
    match (kind, Handle::try_current()) {
        (TimerDriverKind::GraphClock, _) => TimerDriver::GraphClock,
        (_, Ok(handle)) => TimerDriver::Runtime(handle),
        (TimerDriverKind::Runtime, Err(_)) => {
            log::warn!("no tokio runtime available; delay timers will follow the graph clock");
            TimerDriver::GraphClock
        }
        (TimerDriverKind::Auto, Err(_)) => TimerDriver::GraphClock,
    }
}

impl GraphEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let driver = resolve_driver(settings.timer_driver);
        Self::with_timer_driver(settings, driver)
    }

    pub fn with_timer_driver(settings: EngineSettings, driver: TimerDriver) -> Self {
        Self {
            graph: Graph::new(),
            step: GraphStepState::new(settings.default_fps),
            throttle: FieldRefreshThrottle::new(settings.field_refresh.clone()),
            effects: EffectQueue::new(driver),
            epoch: 0,
            settings,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn step_state(&self) -> &GraphStepState {
        &self.step
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn uses_graph_clock(&self) -> bool {
        matches!(self.effects.driver(), TimerDriver::GraphClock)
    }

    /// Applies to timers started after the call.
    pub fn set_timer_driver(&mut self, driver: TimerDriver) {
        self.effects.set_driver(driver);
    }

    /// Media import nodes are rescheduled so keys requested before the loader existed load now.
    pub fn set_media_loader(&mut self, loader: Arc<dyn MediaLoader>) {
        self.effects.set_media_loader(Some(loader));
        let importers: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|node| node.kind == NodeKind::Patch(Patch::MediaImport))
            .map(|node| node.id)
            .collect();
        self.graph.mark_pending(importers);
    }

    pub fn clear_media_loader(&mut self) {
        self.effects.set_media_loader(None);
    }

    /// Thread-safe handle for posting completions and host-provided outputs.
    pub fn effect_sender(&self) -> EffectSender {
        self.effects.sender()
    }

    pub fn pending_clock_timers(&self) -> usize {
        self.effects.pending_clock_timers()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.throttle.set_zoom(zoom);
    }

    pub fn input_values(&self, input: InputCoordinate) -> Option<&[PortValue]> {
        self.graph
            .node(input.node_id)?
            .input(input.port)
            .map(|row| row.all_looped_values())
    }

    pub fn output_values(&self, output: OutputCoordinate) -> Option<&[PortValue]> {
        self.graph
            .node(output.node_id)?
            .output(output.port_index)
            .map(|row| row.all_looped_values())
    }

    /// Resolves `intent` into a graph mutation and recalculates what it touched.
    ///
    /// A rejected intent leaves the graph unchanged.
    pub fn apply(&mut self, intent: GraphIntent) -> GraphResult<IntentOutcome> {
        let graph_time = self.step.graph_time;
        let mut inserted = None;
        let seeds: Vec<NodeId> = match intent {
            GraphIntent::SetInput { input, values } => {
                self.graph.set_input_values(input, &values, graph_time)?;
                vec![input.node_id]
            }
            GraphIntent::Connect { output, input } => {
                self.graph.set_connection(output, input)?;
                vec![input.node_id]
            }
            GraphIntent::Disconnect { input } => {
                self.graph.remove_connection(input)?;
                vec![input.node_id]
            }
            GraphIntent::RemoveConnectionsFrom { output } => self
                .graph
                .remove_connections_from(output)?
                .into_iter()
                .map(|input| input.node_id)
                .collect(),
            GraphIntent::ChangeNodeType { node, node_type } => {
                let mut seeds = self.graph.upstream_ordered(node).to_vec();
                self.graph.change_node_type(node, node_type, graph_time)?;
                self.graph.ephemeral.forget_node(node);
                seeds.push(node);
                seeds
            }
            GraphIntent::InsertNode {
                id,
                kind,
                node_type,
            } => {
                let node = Node::new(id.unwrap_or_else(Uuid::new_v4), kind, node_type)?;
                let id = self.graph.insert_node(node)?;
                inserted = Some(id);
                vec![id]
            }
            GraphIntent::DeleteNode { node } => self.graph.remove_node(node)?,
            GraphIntent::ProvideOutput { output, values } => {
                self.graph.set_output_values(output, &values, graph_time)?;
                self.graph.downstream_ordered(output.node_id).to_vec()
            }
        };
        Ok(IntentOutcome {
            node: inserted,
            summary: self.calculate(seeds),
        })
    }

    /// Evaluates `seeds` and their downstream closure now, then dispatches any
    /// effects the evals requested.
    pub fn calculate(&mut self, seeds: impl IntoIterator<Item = NodeId>) -> RunSummary {
        let outcome = executor::calculate(&mut self.graph, seeds, &self.step, &self.settings);
        for effect in outcome.effects {
            let generation = Generation {
                node_type: effect.node_type,
                epoch: self.epoch,
            };
            let media_index = match &effect.request {
                EffectRequest::LoadMedia { loop_index, .. } => Some(*loop_index),
                EffectRequest::StartTimer { .. } => None,
            };
            let dispatched = self.effects.dispatch(
                effect.node_id,
                generation,
                effect.request,
                self.step.graph_time,
            );
            // An undelivered load must be asked for again once a loader exists.
            if let (false, Some(index)) = (dispatched, media_index) {
                self.graph.ephemeral.media.remove(&(effect.node_id, index));
            }
        }
        self.graph.mark_pending(outcome.run_again);
        self.graph.mark_pending(outcome.pulse_consumers);
        outcome.summary
    }

    /// Defers nodes to the next `graph_step`.
    pub fn schedule_for_next_graph_step(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.graph.mark_pending(ids);
    }

    /// Per-frame tick from the host.
    pub fn graph_step(&mut self, elapsed_time: f64, frame_count: u64) -> StepReport {
        self.step.advance(elapsed_time, frame_count);
        self.effects.fire_due_timers(self.step.graph_time);

        let mut seeds = self.apply_effect_events();
        seeds.extend(self.graph.take_pending());
        seeds.extend(
            self.graph
                .nodes()
                .filter(|node| node.kind.runs_every_graph_step())
                .map(|node| node.id),
        );

        let summary = self.calculate(seeds);
        StepReport {
            summary,
            refresh_fields: self.throttle.should_refresh(frame_count),
            estimated_fps: self.step.estimated_fps,
        }
    }

    /// Applies queued completions outside of a frame tick.
    pub fn drain_effects(&mut self) -> RunSummary {
        let seeds = self.apply_effect_events();
        self.calculate(seeds)
    }

    fn apply_effect_events(&mut self) -> HashSet<NodeId> {
        let mut seeds = HashSet::new();
        for _ in 0..self.settings.max_effects_per_drain {
            let Some(event) = self.effects.try_next() else {
                break;
            };
            seeds.extend(self.accept_event(event));
        }
        seeds
    }

    /// Guards one completion and folds it into ephemeral state. Returns the nodes to recalculate.
    fn accept_event(&mut self, event: EffectEvent) -> Vec<NodeId> {
        let id = event.node_id;
        let Some(node) = self.graph.node(id) else {
            log::debug!("discarding effect for removed node {id}");
            return Vec::new();
        };
        if let Some(generation) = event.generation {
            if generation.epoch != self.epoch {
                log::debug!(
                    "discarding effect for {id} from epoch {} (now {})",
                    generation.epoch,
                    self.epoch
                );
                return Vec::new();
            }
            if generation.node_type != node.node_type() {
                log::debug!(
                    "discarding stale effect for {id}: issued as {:?}, node is now {:?}",
                    generation.node_type,
                    node.node_type()
                );
                return Vec::new();
            }
        }

        match event.kind {
            EffectKind::TimerFired {
                timer_id,
                loop_index,
                value,
            } => {
                let Some(bank) = self.graph.ephemeral.timers.get_mut(&id) else {
                    log::debug!("discarding timer {timer_id} for {id}: no timers running");
                    return Vec::new();
                };
                if bank.pending.remove(&timer_id).is_none() {
                    log::debug!("discarding timer {timer_id} for {id}: no longer pending");
                    return Vec::new();
                }
                bank.fired.insert(loop_index, value);
                vec![id]
            }
            EffectKind::MediaLoaded {
                loop_index,
                key,
                media,
            } => match self.graph.ephemeral.media.get_mut(&(id, loop_index)) {
                Some(slot) if slot.key == key => {
                    slot.media = media;
                    slot.loading = false;
                    vec![id]
                }
                _ => {
                    log::debug!("discarding media '{key}' for {id}[{loop_index}]: key changed");
                    Vec::new()
                }
            },
            EffectKind::OutputDelivered { port_index, values } => {
                let output = OutputCoordinate::new(id, port_index);
                match self
                    .graph
                    .set_output_values(output, &values, self.step.graph_time)
                {
                    Ok(_) => self.graph.downstream_ordered(id).to_vec(),
                    Err(err) => {
                        log::warn!("dropping delivered output: {err}");
                        Vec::new()
                    }
                }
            }
        }
    }

    pub fn export_graph(&self) -> GraphSnapshot {
        self.graph.to_snapshot()
    }

    /// Replaces the graph after validating `snapshot`, then recalculates every node.
    pub fn import_graph(&mut self, snapshot: &GraphSnapshot) -> GraphResult<RunSummary> {
        let graph = Graph::from_snapshot(snapshot)?;
        log::info!(
            "importing graph nodes={} connections={}",
            snapshot.nodes.len(),
            snapshot.connections.len()
        );
        self.graph = graph;
        self.epoch += 1;
        self.effects.clear_clock_timers();
        let all = self.graph.node_ids().to_vec();
        Ok(self.calculate(all))
    }

    pub fn import_json(&mut self, json: &str) -> GraphResult<RunSummary> {
        let snapshot =
            GraphSnapshot::from_json(json).map_err(|e| GraphError::InvalidSnapshot(e.to_string()))?;
        self.import_graph(&snapshot)
    }

    /// Restarts the prototype: ephemeral state back to rest, in-flight completions
    /// invalidated, time-driven outputs cleared, every node recalculated.
    pub fn reset_prototype(&mut self) -> RunSummary {
        self.graph.ephemeral.reset();
        self.graph.take_pending();
        self.epoch += 1;
        self.effects.clear_clock_timers();
        self.step.restart();

        let all = self.graph.node_ids().to_vec();
        for id in &all {
            if let Some(node) = self.graph.node_mut(*id) {
                if node.kind.is_impure() {
                    node.reset_outputs();
                }
            }
        }
        log::info!("prototype restarted at epoch {}", self.epoch);
        self.calculate(all)
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
