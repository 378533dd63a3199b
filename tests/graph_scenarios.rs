use std::time::Duration;

use patchflow::node_graph::{GraphEngine, GraphIntent, InputCoordinate, OutputCoordinate};
use patchflow::settings::TimerDriverKind;
use patchflow::{EngineSettings, NodeKind, NodeType, Patch, PortValue};

fn runtime_engine() -> GraphEngine {
    GraphEngine::new(EngineSettings {
        timer_driver: TimerDriverKind::Runtime,
        log_summary: true,
        ..EngineSettings::default()
    })
}

fn insert(engine: &mut GraphEngine, patch: Patch, node_type: Option<NodeType>) -> uuid::Uuid {
    engine
        .apply(GraphIntent::InsertNode {
            id: None,
            kind: NodeKind::Patch(patch),
            node_type,
        })
        .expect("insert")
        .node
        .expect("inserted id")
}

fn set_number(engine: &mut GraphEngine, node: uuid::Uuid, port: usize, value: f64) {
    engine
        .apply(GraphIntent::SetInput {
            input: InputCoordinate::index(node, port),
            values: vec![PortValue::Number(value)],
        })
        .expect("set input");
}

fn output(engine: &GraphEngine, node: uuid::Uuid) -> Vec<PortValue> {
    engine
        .output_values(OutputCoordinate::new(node, 0))
        .expect("output")
        .to_vec()
}

#[tokio::test(start_paused = true)]
async fn runtime_timers_post_back_through_the_channel() {
    let mut engine = runtime_engine();
    assert!(!engine.uses_graph_clock());

    let delay = insert(&mut engine, Patch::Delay, None);
    set_number(&mut engine, delay, 1, 0.25);
    set_number(&mut engine, delay, 0, 8.0);
    assert_eq!(output(&engine, delay), vec![PortValue::Number(0.0)]);

    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.drain_effects();
    assert_eq!(output(&engine, delay), vec![PortValue::Number(0.0)]);

    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.drain_effects();
    assert_eq!(output(&engine, delay), vec![PortValue::Number(8.0)]);
}

#[tokio::test(start_paused = true)]
async fn completions_for_deleted_nodes_are_dropped() {
    let mut engine = runtime_engine();
    let delay = insert(&mut engine, Patch::Delay, None);
    let sink = insert(&mut engine, Patch::Splitter, None);
    engine
        .apply(GraphIntent::Connect {
            output: OutputCoordinate::new(delay, 0),
            input: InputCoordinate::index(sink, 0),
        })
        .expect("connect");
    set_number(&mut engine, delay, 0, 3.0);
    engine
        .apply(GraphIntent::DeleteNode { node: delay })
        .expect("delete");

    tokio::time::sleep(Duration::from_secs(2)).await;
    let summary = engine.drain_effects();
    assert_eq!(summary.evaluated, 0);
    assert_eq!(output(&engine, sink), vec![PortValue::Number(0.0)]);
}

#[test]
fn auto_driver_without_a_runtime_uses_the_graph_clock() {
    let engine = GraphEngine::new(EngineSettings::default());
    assert!(engine.uses_graph_clock());
}

#[test]
fn increasing_delay_passes_drops_through() {
    let mut engine = GraphEngine::new(EngineSettings {
        timer_driver: TimerDriverKind::GraphClock,
        ..EngineSettings::default()
    });
    let delay = insert(&mut engine, Patch::Delay, None);
    engine
        .apply(GraphIntent::SetInput {
            input: InputCoordinate::index(delay, 2),
            values: vec![PortValue::Number(1.0)],
        })
        .expect("style");

    set_number(&mut engine, delay, 0, 5.0);
    assert_eq!(output(&engine, delay), vec![PortValue::Number(0.0)]);
    engine.graph_step(1.0, 60);
    assert_eq!(output(&engine, delay), vec![PortValue::Number(5.0)]);

    set_number(&mut engine, delay, 0, 2.0);
    assert_eq!(output(&engine, delay), vec![PortValue::Number(2.0)]);
}

#[test]
fn node_catalog_lists_every_kind() {
    let catalog = patchflow::node_graph::nodes::get_node_types();
    assert_eq!(
        catalog.len(),
        Patch::ALL.len() + patchflow::Layer::ALL.len()
    );
    let add = catalog
        .iter()
        .find(|def| def.kind == NodeKind::Patch(Patch::Add))
        .expect("add is listed");
    assert_eq!(add.default_type, Some(NodeType::Number));
    assert!(add.supported_types.contains(&NodeType::String));
    assert_eq!(add.inputs.len(), 2);
}
