use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::models::node_graph::NodeId;
use crate::models::node_kind::NodeKind;
use crate::models::node_type::NodeType;
use crate::models::values::{Loop, PortValue};
use crate::settings::EngineSettings;

use super::coercion::coerce_loop;
use super::context::GraphStepState;
use super::effects::EffectRequest;
use super::graph::Graph;
use super::invariant_violated;
use super::node::Node;
use super::nodes;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// What one `calculate` pass did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub run_id: u64,
    pub seeds: usize,
    pub evaluated: usize,
    pub changed_outputs: usize,
    pub total_ms: f64,
}

/// An effect request tagged with the node type it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IssuedEffect {
    pub node_id: NodeId,
    pub node_type: Option<NodeType>,
    pub request: EffectRequest,
}

#[derive(Debug, Default)]
pub(crate) struct CalculationOutcome {
    pub summary: RunSummary,
    pub effects: Vec<IssuedEffect>,
    /// Nodes that asked to be evaluated again on the next graph step.
    pub run_again: Vec<NodeId>,
    /// Immediate consumers of a pulse fired during this pass.
    pub pulse_consumers: Vec<NodeId>,
}

struct NodeTiming {
    id: NodeId,
    kind: NodeKind,
    ms: f64,
}

/// Evaluates `seeds` and everything downstream of them in dependency order.
///
/// Seeds always run. Other nodes in the closure run only when an upstream output they
/// read changed during this pass.
pub(crate) fn calculate(
    graph: &mut Graph,
    seeds: impl IntoIterator<Item = NodeId>,
    step: &GraphStepState,
    settings: &EngineSettings,
) -> CalculationOutcome {
    let run_id = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let run_start = Instant::now();

    let seeds: HashSet<NodeId> = seeds
        .into_iter()
        .filter(|id| graph.node(*id).is_some())
        .collect();
    let closure = graph.downstream_closure(seeds.iter().copied());
    let order = graph.topological_order(&closure);

    if settings.log_summary {
        log::info!(
            "[calculate #{run_id}] start seeds={} closure={} t={:.3}",
            seeds.len(),
            order.len(),
            step.graph_time
        );
    }

    let mut outcome = CalculationOutcome::default();
    let mut dirty = seeds.clone();
    let mut timings: Vec<NodeTiming> = Vec::new();

    for id in order {
        let inputs_changed = refresh_inputs(graph, id, step.graph_time);
        if !inputs_changed && !dirty.contains(&id) {
            continue;
        }

        let node_start = Instant::now();
        let Some((node, state)) = graph.eval_parts(id) else {
            continue;
        };
        let mut requests = Vec::new();
        let result = nodes::evaluate(node, step, state, &mut requests);
        let outputs_changed = write_outputs(node, result.outputs, step.graph_time);
        let pulsed = outputs_changed && fired_pulse(node, step.graph_time);
        let node_type = node.node_type();
        let kind = node.kind;

        outcome
            .effects
            .extend(requests.into_iter().map(|request| IssuedEffect {
                node_id: id,
                node_type,
                request,
            }));
        if result.run_again {
            outcome.run_again.push(id);
        }
        if outputs_changed {
            outcome.summary.changed_outputs += 1;
            dirty.extend(graph.downstream_ordered(id).iter().copied());
        }
        if pulsed {
            outcome
                .pulse_consumers
                .extend(graph.downstream_ordered(id).iter().copied());
        }

        let ms = node_start.elapsed().as_secs_f64() * 1000.0;
        if settings.log_node_timings {
            log::debug!("[calculate #{run_id}] {id} ({kind}) {ms:.3}ms changed={outputs_changed}");
        }
        timings.push(NodeTiming { id, kind, ms });
    }

    outcome.summary.run_id = run_id;
    outcome.summary.seeds = seeds.len();
    outcome.summary.evaluated = timings.len();
    outcome.summary.total_ms = run_start.elapsed().as_secs_f64() * 1000.0;

    if settings.log_summary {
        log::info!(
            "[calculate #{run_id}] done evaluated={} changed={} effects={} total_ms={:.2}",
            outcome.summary.evaluated,
            outcome.summary.changed_outputs,
            outcome.effects.len(),
            outcome.summary.total_ms
        );
        timings.sort_by(|a, b| b.ms.partial_cmp(&a.ms).unwrap_or(std::cmp::Ordering::Equal));
        let top_nodes: Vec<String> = timings
            .iter()
            .take(5)
            .map(|n| format!("{} ({}) {:.2}ms", n.id, n.kind, n.ms))
            .collect();
        if !top_nodes.is_empty() {
            log::info!(
                "[calculate #{run_id}] slowest_nodes: {}",
                top_nodes.join(", ")
            );
        }
    }

    outcome
}

/// Pulls connected inputs from their upstream outputs. Returns whether any input changed.
fn refresh_inputs(graph: &mut Graph, id: NodeId, graph_time: f64) -> bool {
    let Some(node) = graph.node(id) else {
        return false;
    };
    let updates: Vec<(usize, Loop)> = node
        .inputs()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let upstream = graph.upstream_values(row.id)?;
            let values = if row.copies_upstream {
                upstream
            } else {
                coerce_loop(&upstream, row.node_type, graph_time)
            };
            Some((i, values))
        })
        .collect();

    let Some(node) = graph.node_mut(id) else {
        return false;
    };
    let mut changed = false;
    for (i, values) in updates {
        if let Some(row) = node.input_at_mut(i) {
            changed |= row.set_values_in_input(values);
        }
    }
    changed
}

/// Writes eval results into the output rows. Returns whether any output changed.
fn write_outputs(node: &mut Node, mut outputs: Vec<Loop>, graph_time: f64) -> bool {
    let expected = node.outputs().len();
    if outputs.len() != expected {
        invariant_violated(&format!(
            "{} produced {} output loops for {} output rows",
            node.kind,
            outputs.len(),
            expected
        ));
        outputs.resize(expected, Vec::new());
    }

    let mut changed = false;
    for (i, values) in outputs.into_iter().enumerate() {
        let Some(row) = node.output_mut(i) else {
            continue;
        };
        let values = if values.iter().all(|v| v.node_type() == row.node_type) {
            values
        } else {
            coerce_loop(&values, row.node_type, graph_time)
        };
        changed |= row.set_values(values);
    }
    changed
}

fn fired_pulse(node: &Node, graph_time: f64) -> bool {
    graph_time != 0.0
        && node.outputs().iter().any(|row| {
            row.all_looped_values()
                .iter()
                .any(|v| matches!(v, PortValue::Pulse(t) if *t == graph_time))
        })
}
