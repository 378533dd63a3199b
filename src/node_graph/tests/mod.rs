use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{
    EffectEvent, EffectKind, GraphEngine, GraphIntent, InputCoordinate, MediaLoader, MediaReply,
    MediaRequest, NodeId, OutputCoordinate, TimerDriver,
};
use crate::error::GraphError;
use crate::models::node_graph::GraphSnapshot;
use crate::models::node_kind::{Layer, LayerInputPort, NodeKind, Patch};
use crate::models::node_type::NodeType;
use crate::models::values::{MediaRef, PortValue};
use crate::node_graph::effects::Generation;
use crate::settings::EngineSettings;

fn engine() -> GraphEngine {
    GraphEngine::with_timer_driver(EngineSettings::default(), TimerDriver::GraphClock)
}

fn insert(engine: &mut GraphEngine, kind: impl Into<NodeKind>, node_type: Option<NodeType>) -> NodeId {
    engine
        .apply(GraphIntent::InsertNode {
            id: None,
            kind: kind.into(),
            node_type,
        })
        .expect("insert node")
        .node
        .expect("inserted id")
}

fn set(engine: &mut GraphEngine, node: NodeId, port: usize, values: Vec<PortValue>) {
    engine
        .apply(GraphIntent::SetInput {
            input: InputCoordinate::index(node, port),
            values,
        })
        .expect("set input");
}

fn connect(engine: &mut GraphEngine, from: NodeId, from_port: usize, to: NodeId, to_port: usize) {
    engine
        .apply(GraphIntent::Connect {
            output: OutputCoordinate::new(from, from_port),
            input: InputCoordinate::index(to, to_port),
        })
        .expect("connect");
}

fn out(engine: &GraphEngine, node: NodeId, port: usize) -> Vec<PortValue> {
    engine
        .output_values(OutputCoordinate::new(node, port))
        .expect("output row")
        .to_vec()
}

fn num(n: f64) -> Vec<PortValue> {
    vec![PortValue::Number(n)]
}

#[test_log::test]
fn arithmetic_chain_propagates_downstream() {
    let mut engine = engine();
    let a = insert(&mut engine, Patch::Value, Some(NodeType::Number));
    let b = insert(&mut engine, Patch::Add, None);
    let c = insert(&mut engine, Patch::Multiply, None);
    set(&mut engine, a, 0, num(2.0));
    connect(&mut engine, a, 0, b, 0);
    set(&mut engine, b, 1, num(3.0));
    connect(&mut engine, b, 0, c, 0);
    set(&mut engine, c, 1, num(10.0));

    engine.calculate([a]);
    assert_eq!(out(&engine, c, 0), num(50.0));

    set(&mut engine, a, 0, num(4.0));
    assert_eq!(out(&engine, b, 0), num(7.0));
    assert_eq!(out(&engine, c, 0), num(70.0));
}

#[test_log::test]
fn loops_broadcast_through_the_engine() {
    let mut engine = engine();
    let add = insert(&mut engine, Patch::Add, None);
    set(
        &mut engine,
        add,
        0,
        vec![PortValue::Number(1.0), PortValue::Number(2.0), PortValue::Number(3.0)],
    );
    set(&mut engine, add, 1, num(10.0));
    assert_eq!(
        out(&engine, add, 0),
        vec![PortValue::Number(11.0), PortValue::Number(12.0), PortValue::Number(13.0)]
    );
}

#[test_log::test]
fn delay_always_holds_until_the_timer_fires() {
    let mut engine = engine();
    let delay = insert(&mut engine, Patch::Delay, Some(NodeType::Number));
    assert_eq!(engine.pending_clock_timers(), 0);

    set(&mut engine, delay, 0, num(1.0));
    assert_eq!(out(&engine, delay, 0), num(0.0));
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 1);

    engine.graph_step(0.5, 30);
    assert_eq!(out(&engine, delay, 0), num(0.0));

    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, delay, 0), num(1.0));
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 0);

    engine.graph_step(1.5, 90);
    assert_eq!(out(&engine, delay, 0), num(1.0));
}

#[test_log::test]
fn shrinking_a_delay_loop_drops_its_trailing_timers() {
    let mut engine = engine();
    let delay = insert(&mut engine, Patch::Delay, Some(NodeType::Number));
    set(&mut engine, delay, 0, vec![PortValue::Number(1.0), PortValue::Number(2.0)]);
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 2);

    set(&mut engine, delay, 0, num(1.0));
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 1);
    assert_eq!(out(&engine, delay, 0), num(0.0));

    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, delay, 0), num(1.0));
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 0);
}

#[test_log::test]
fn type_change_reflows_the_graph() {
    let mut engine = engine();
    let a = insert(&mut engine, Patch::Value, Some(NodeType::Number));
    let splitter = insert(&mut engine, Patch::Splitter, Some(NodeType::Number));
    set(&mut engine, a, 0, num(5.0));
    connect(&mut engine, a, 0, splitter, 0);
    assert_eq!(out(&engine, splitter, 0), num(5.0));

    engine
        .apply(GraphIntent::ChangeNodeType {
            node: splitter,
            node_type: NodeType::String,
        })
        .expect("splitters take any type");

    let node = engine.graph().node(splitter).expect("splitter");
    assert_eq!(node.node_type(), Some(NodeType::String));
    assert_eq!(node.inputs()[0].node_type, NodeType::String);
    assert_eq!(
        engine.graph().connection(InputCoordinate::index(splitter, 0)),
        Some(OutputCoordinate::new(a, 0))
    );
    assert_eq!(out(&engine, splitter, 0), vec![PortValue::from("5")]);

    set(&mut engine, a, 0, num(7.0));
    assert_eq!(out(&engine, splitter, 0), vec![PortValue::from("7")]);
}

#[test_log::test]
fn unsupported_type_change_leaves_the_node_alone() {
    let mut engine = engine();
    let sub = insert(&mut engine, Patch::Subtract, None);
    let err = engine
        .apply(GraphIntent::ChangeNodeType {
            node: sub,
            node_type: NodeType::String,
        })
        .expect_err("subtract has no string form");
    assert!(matches!(err, GraphError::UnsupportedNodeType { .. }));
    assert_eq!(
        engine.graph().node(sub).and_then(|n| n.node_type()),
        Some(NodeType::Number)
    );
}

#[test_log::test]
fn cycles_are_rejected() {
    let mut engine = engine();
    let a = insert(&mut engine, Patch::Splitter, None);
    let b = insert(&mut engine, Patch::Splitter, None);
    let c = insert(&mut engine, Patch::Splitter, None);
    connect(&mut engine, a, 0, b, 0);
    connect(&mut engine, b, 0, c, 0);

    let err = engine
        .apply(GraphIntent::Connect {
            output: OutputCoordinate::new(c, 0),
            input: InputCoordinate::index(a, 0),
        })
        .expect_err("c -> a closes a cycle");
    assert_eq!(err, GraphError::CycleDetected { from: c, to: a });
    assert_eq!(engine.graph().connections().count(), 2);

    let summary = engine.calculate([a, b, c]);
    assert_eq!(summary.evaluated, 3);
}

#[test_log::test]
fn connection_replaces_and_disconnect_restores_the_local_value() {
    let mut engine = engine();
    let first = insert(&mut engine, Patch::Value, None);
    let second = insert(&mut engine, Patch::Value, None);
    let sink = insert(&mut engine, Patch::Splitter, None);
    set(&mut engine, first, 0, num(1.0));
    set(&mut engine, second, 0, num(2.0));
    set(&mut engine, sink, 0, num(9.0));

    connect(&mut engine, first, 0, sink, 0);
    assert_eq!(out(&engine, sink, 0), num(1.0));
    connect(&mut engine, second, 0, sink, 0);
    assert_eq!(out(&engine, sink, 0), num(2.0));

    let input = InputCoordinate::index(sink, 0);
    assert_eq!(
        engine.graph().connection(input),
        Some(OutputCoordinate::new(second, 0))
    );
    assert_eq!(engine.graph().connections().count(), 1);

    engine
        .apply(GraphIntent::Disconnect { input })
        .expect("disconnect");
    assert_eq!(engine.graph().connection(input), None);
    assert_eq!(out(&engine, sink, 0), num(9.0));
}

#[test_log::test]
fn editing_a_connected_input_detaches_it() {
    let mut engine = engine();
    let source = insert(&mut engine, Patch::Value, None);
    let sink = insert(&mut engine, Patch::Splitter, None);
    set(&mut engine, source, 0, num(3.0));
    connect(&mut engine, source, 0, sink, 0);

    set(&mut engine, sink, 0, num(4.0));
    assert_eq!(engine.graph().connection(InputCoordinate::index(sink, 0)), None);
    assert_eq!(out(&engine, sink, 0), num(4.0));
}

#[test_log::test]
fn disconnect_intents_reject_missing_ports() {
    let mut engine = engine();
    let source = insert(&mut engine, Patch::Value, None);
    let add = insert(&mut engine, Patch::Add, None);
    connect(&mut engine, source, 0, add, 0);

    let missing_input = InputCoordinate::index(add, 9);
    let err = engine
        .apply(GraphIntent::Disconnect {
            input: missing_input,
        })
        .expect_err("add has two inputs");
    assert_eq!(err, GraphError::InputNotFound(missing_input));

    let missing_output = OutputCoordinate::new(source, 3);
    let err = engine
        .apply(GraphIntent::RemoveConnectionsFrom {
            output: missing_output,
        })
        .expect_err("value has one output");
    assert_eq!(err, GraphError::OutputNotFound(missing_output));

    let gone = Uuid::new_v4();
    let err = engine
        .apply(GraphIntent::RemoveConnectionsFrom {
            output: OutputCoordinate::new(gone, 0),
        })
        .expect_err("no such node");
    assert_eq!(err, GraphError::NodeNotFound(gone));
    assert_eq!(engine.graph().connections().count(), 1);
}

#[test_log::test]
fn deleting_a_node_falls_back_downstream() {
    let mut engine = engine();
    let source = insert(&mut engine, Patch::Value, None);
    let add = insert(&mut engine, Patch::Add, None);
    set(&mut engine, source, 0, num(5.0));
    connect(&mut engine, source, 0, add, 0);
    assert_eq!(out(&engine, add, 0), num(5.0));

    engine
        .apply(GraphIntent::DeleteNode { node: source })
        .expect("delete");
    assert!(engine.graph().node(source).is_none());
    assert_eq!(engine.graph().connections().count(), 0);
    assert_eq!(out(&engine, add, 0), num(0.0));
}

#[test_log::test]
fn stale_timer_completions_are_discarded() {
    let mut engine = engine();
    let delay = insert(&mut engine, Patch::Delay, Some(NodeType::Number));
    engine
        .apply(GraphIntent::ChangeNodeType {
            node: delay,
            node_type: NodeType::String,
        })
        .expect("delay takes strings");
    assert_eq!(out(&engine, delay, 0), vec![PortValue::from("0")]);

    let sender = engine.effect_sender();
    let fired = |node_type, epoch| EffectEvent {
        node_id: delay,
        generation: Some(Generation { node_type, epoch }),
        kind: EffectKind::TimerFired {
            timer_id: Uuid::new_v4(),
            loop_index: 0,
            value: PortValue::from("late"),
        },
    };
    // Issued before the type change.
    assert!(sender.send(fired(Some(NodeType::Number), engine.epoch())));
    // Right type, wrong prototype run.
    assert!(sender.send(fired(Some(NodeType::String), engine.epoch() + 1)));
    // Right generation, but no such timer is pending.
    assert!(sender.send(fired(Some(NodeType::String), engine.epoch())));

    let summary = engine.drain_effects();
    assert_eq!(summary.evaluated, 0);
    assert_eq!(out(&engine, delay, 0), vec![PortValue::from("0")]);
}

#[test_log::test]
fn type_change_cancels_running_timers() {
    let mut engine = engine();
    let delay = insert(&mut engine, Patch::Delay, Some(NodeType::Number));
    set(&mut engine, delay, 0, num(0.0));
    set(&mut engine, delay, 0, num(4.0));
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 1);

    engine
        .apply(GraphIntent::ChangeNodeType {
            node: delay,
            node_type: NodeType::Bool,
        })
        .expect("delay takes bools");

    // The number timer's completion is stale; the new bool input starts its own.
    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, delay, 0), vec![PortValue::Bool(true)]);
    assert_eq!(engine.graph().ephemeral().pending_timer_count(delay), 0);
}

#[test_log::test]
fn repeating_pulse_drives_a_counter() {
    let mut engine = engine();
    let pulse = insert(&mut engine, Patch::RepeatingPulse, None);
    let counter = insert(&mut engine, Patch::Counter, None);
    set(&mut engine, pulse, 0, num(1.0));
    connect(&mut engine, pulse, 0, counter, 0);
    assert_eq!(out(&engine, counter, 0), num(0.0));

    engine.graph_step(0.5, 30);
    assert_eq!(out(&engine, counter, 0), num(0.0));

    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, pulse, 0), vec![PortValue::Pulse(1.0)]);
    assert_eq!(out(&engine, counter, 0), num(1.0));
    assert!(engine.graph().pending().contains(&counter));

    engine.graph_step(1.5, 90);
    assert_eq!(out(&engine, counter, 0), num(1.0));

    engine.graph_step(2.0, 120);
    assert_eq!(out(&engine, counter, 0), num(2.0));
}

#[test_log::test]
fn counter_counts_each_pulse_once_per_frame() {
    let mut engine = engine();
    let pulse = insert(&mut engine, Patch::RepeatingPulse, None);
    let counter = insert(&mut engine, Patch::Counter, None);
    set(&mut engine, pulse, 0, num(1.0));
    connect(&mut engine, pulse, 0, counter, 0);

    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, counter, 0), num(1.0));

    // Same frame: the counter re-runs but the pulse was already counted.
    set(&mut engine, counter, 4, num(100.0));
    assert_eq!(out(&engine, counter, 0), num(1.0));

    engine.graph_step(2.0, 120);
    assert_eq!(out(&engine, counter, 0), num(2.0));
}

#[test_log::test]
fn time_node_follows_the_graph_clock() {
    let mut engine = engine();
    let time = insert(&mut engine, Patch::Time, None);
    engine.graph_step(2.5, 150);
    assert_eq!(out(&engine, time, 0), num(2.5));
    assert_eq!(out(&engine, time, 1), num(150.0));
}

#[test_log::test]
fn classic_animation_eases_to_its_target() {
    let mut engine = engine();
    let anim = insert(&mut engine, Patch::ClassicAnimation, None);
    set(&mut engine, anim, 0, num(10.0));
    assert_eq!(out(&engine, anim, 0), num(0.0));
    assert!(engine.graph().pending().contains(&anim));

    engine.graph_step(0.5, 30);
    assert_eq!(out(&engine, anim, 0), num(5.0));

    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, anim, 0), num(10.0));
    assert!(engine.graph().ephemeral().animations.is_empty());
    assert!(engine.graph().pending().is_empty());
}

#[derive(Default)]
struct DeferredLoader {
    calls: Mutex<Vec<(MediaRequest, MediaReply)>>,
}

impl MediaLoader for DeferredLoader {
    fn load(&self, request: MediaRequest, reply: MediaReply) {
        self.calls
            .lock()
            .expect("loader lock")
            .push((request, reply));
    }
}

impl DeferredLoader {
    fn complete(&self, key: &str) {
        let mut calls = self.calls.lock().expect("loader lock");
        let index = calls
            .iter()
            .position(|(request, _)| request.key == key)
            .expect("requested key");
        let (request, reply) = calls.remove(index);
        assert!(reply.complete(Some(MediaRef::new(request.key))));
    }
}

#[test_log::test]
fn media_import_outputs_loaded_media() {
    let mut engine = engine();
    let loader = Arc::new(DeferredLoader::default());
    engine.set_media_loader(loader.clone());
    let media = insert(&mut engine, Patch::MediaImport, None);

    set(&mut engine, media, 0, vec![PortValue::from("cat.png")]);
    assert_eq!(out(&engine, media, 0), vec![PortValue::AsyncMedia(None)]);

    loader.complete("cat.png");
    engine.drain_effects();
    match &out(&engine, media, 0)[0] {
        PortValue::AsyncMedia(Some(media)) => assert_eq!(media.key, "cat.png"),
        other => panic!("expected loaded media, got {other:?}"),
    }
}

#[test_log::test]
fn media_for_a_replaced_key_is_discarded() {
    let mut engine = engine();
    let loader = Arc::new(DeferredLoader::default());
    engine.set_media_loader(loader.clone());
    let media = insert(&mut engine, Patch::MediaImport, None);

    set(&mut engine, media, 0, vec![PortValue::from("a.png")]);
    set(&mut engine, media, 0, vec![PortValue::from("b.png")]);
    loader.complete("a.png");
    engine.drain_effects();
    assert_eq!(out(&engine, media, 0), vec![PortValue::AsyncMedia(None)]);

    loader.complete("b.png");
    engine.drain_effects();
    assert!(matches!(
        &out(&engine, media, 0)[0],
        PortValue::AsyncMedia(Some(m)) if m.key == "b.png"
    ));
}

#[test_log::test]
fn media_requested_before_a_loader_exists_loads_once_installed() {
    let mut engine = engine();
    let media = insert(&mut engine, Patch::MediaImport, None);
    set(&mut engine, media, 0, vec![PortValue::from("clip.mov")]);
    assert!(engine.graph().ephemeral().media.is_empty());

    let loader = Arc::new(DeferredLoader::default());
    engine.set_media_loader(loader.clone());
    engine.graph_step(0.1, 6);
    set(&mut engine, media, 0, vec![PortValue::from("clip.mov")]);
    assert_eq!(loader.calls.lock().expect("loader lock").len(), 1);

    loader.complete("clip.mov");
    engine.drain_effects();
    assert!(matches!(
        &out(&engine, media, 0)[0],
        PortValue::AsyncMedia(Some(m)) if m.key == "clip.mov"
    ));
}

#[test_log::test]
fn provided_outputs_flow_downstream() {
    let mut engine = engine();
    let source = insert(&mut engine, Patch::Value, Some(NodeType::Position));
    let unpack = insert(&mut engine, Patch::Unpack, None);
    connect(&mut engine, source, 0, unpack, 0);

    let sender = engine.effect_sender();
    assert!(sender.deliver_output(
        OutputCoordinate::new(source, 0),
        vec![PortValue::Position(crate::models::values::Position::new(3.0, 4.0))],
    ));
    engine.drain_effects();
    assert_eq!(out(&engine, unpack, 0), num(3.0));
    assert_eq!(out(&engine, unpack, 1), num(4.0));
}

#[test_log::test]
fn layer_inputs_are_addressed_by_port() {
    let mut engine = engine();
    let value = insert(&mut engine, Patch::Value, None);
    let rect = insert(&mut engine, Layer::Rectangle, None);
    set(&mut engine, value, 0, num(0.5));
    let opacity = InputCoordinate::layer(rect, LayerInputPort::Opacity);
    engine
        .apply(GraphIntent::Connect {
            output: OutputCoordinate::new(value, 0),
            input: opacity,
        })
        .expect("connect to layer");
    assert_eq!(engine.input_values(opacity), Some(num(0.5).as_slice()));

    let missing = InputCoordinate::layer(rect, LayerInputPort::FontSize);
    let err = engine
        .apply(GraphIntent::Connect {
            output: OutputCoordinate::new(value, 0),
            input: missing,
        })
        .expect_err("rectangles have no font size");
    assert_eq!(err, GraphError::InputNotFound(missing));
}

#[test_log::test]
fn snapshots_round_trip_through_json() {
    let mut engine = engine();
    let a = insert(&mut engine, Patch::Value, None);
    let b = insert(&mut engine, Patch::Add, None);
    set(&mut engine, a, 0, num(2.0));
    set(&mut engine, b, 1, num(3.0));
    connect(&mut engine, a, 0, b, 0);
    let snapshot = engine.export_graph();
    let json = snapshot.to_json().expect("serialize");

    let mut restored = self::engine();
    restored.import_json(&json).expect("import");
    assert_eq!(out(&restored, b, 0), num(5.0));
    assert_eq!(restored.export_graph(), snapshot);
}

#[test_log::test]
fn invalid_snapshots_leave_the_graph_unchanged() {
    let mut engine = engine();
    let a = insert(&mut engine, Patch::Splitter, None);
    let b = insert(&mut engine, Patch::Splitter, None);
    connect(&mut engine, a, 0, b, 0);
    let good = engine.export_graph();

    let mut duplicated = good.clone();
    duplicated.nodes.push(duplicated.nodes[0].clone());
    assert_eq!(
        engine.import_graph(&duplicated),
        Err(GraphError::DuplicateNode(a))
    );

    let mut dangling = good.clone();
    dangling.connections[0].output.node_id = Uuid::new_v4();
    assert!(matches!(
        engine.import_graph(&dangling),
        Err(GraphError::DanglingConnection { .. })
    ));

    let mut cyclic: GraphSnapshot = good.clone();
    let mut back = cyclic.connections[0];
    back.input = InputCoordinate::index(a, 0);
    back.output = OutputCoordinate::new(b, 0);
    cyclic.connections.push(back);
    assert!(matches!(
        engine.import_graph(&cyclic),
        Err(GraphError::CycleDetected { .. })
    ));

    assert!(matches!(
        engine.import_json("{not json"),
        Err(GraphError::InvalidSnapshot(_))
    ));
    assert_eq!(engine.export_graph(), good);
}

#[test_log::test]
fn reset_prototype_returns_to_rest() {
    let mut engine = engine();
    let pulse = insert(&mut engine, Patch::RepeatingPulse, None);
    let counter = insert(&mut engine, Patch::Counter, None);
    set(&mut engine, pulse, 0, num(1.0));
    connect(&mut engine, pulse, 0, counter, 0);
    engine.graph_step(1.0, 60);
    assert_eq!(out(&engine, counter, 0), num(1.0));

    let epoch = engine.epoch();
    engine.reset_prototype();
    assert_eq!(engine.epoch(), epoch + 1);
    assert_eq!(engine.step_state().graph_time, 0.0);
    assert_eq!(out(&engine, counter, 0), num(0.0));
    assert_eq!(out(&engine, pulse, 0), vec![PortValue::Pulse(0.0)]);
}

#[test_log::test]
fn field_refresh_is_throttled_by_zoom() {
    let mut engine = engine();
    engine.set_zoom(0.5);
    let refreshed: Vec<bool> = (0..4)
        .map(|frame| engine.graph_step(frame as f64 / 60.0, frame).refresh_fields)
        .collect();
    assert_eq!(refreshed, vec![true, false, false, true]);
}
