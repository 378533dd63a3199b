//! Nodes that operate on whole loops rather than per index.

use super::*;
use crate::models::schema::{InputDefinition, OutputDefinition};

const LOOP_BUILDER_INPUTS: usize = 3;

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match patch {
        Patch::LoopSelect => (
            "Loop Select",
            "Picks values out of a loop by index; negative indices count from the end.",
            "Loop",
        ),
        Patch::LoopBuilder => ("Loop Builder", "Builds a loop from its inputs.", "Loop"),
        Patch::LoopCount => ("Loop Count", "Number of values in a loop.", "Loop"),
        _ => return None,
    };
    Some(entry)
}

pub(super) fn row_definitions(patch: Patch, node_type: NodeType) -> NodeRowDefinitions {
    match patch {
        Patch::LoopSelect => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::new(0, "Input", node_type.default_value()),
                InputDefinition::fixed(1, "Index Loop", PortValue::Number(0.0)),
            ],
            outputs: vec![
                OutputDefinition::new("Loop", node_type),
                OutputDefinition::new("Index", NodeType::Number),
            ],
        },
        Patch::LoopBuilder => NodeRowDefinitions {
            inputs: (0..LOOP_BUILDER_INPUTS)
                .map(|i| InputDefinition::new(i, "", node_type.default_value()))
                .collect(),
            outputs: vec![
                OutputDefinition::new("Index", NodeType::Number),
                OutputDefinition::new("Values", node_type),
            ],
        },
        _ => NodeRowDefinitions {
            inputs: vec![InputDefinition::fixed(0, "Loop", PortValue::Number(0.0)).copying()],
            outputs: vec![OutputDefinition::new("Count", NodeType::Number)],
        },
    }
}

fn index_loop(len: usize) -> Loop {
    (0..len.max(1)).map(|i| PortValue::Number(i as f64)).collect()
}

pub(super) fn loop_select_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    let source = inputs.first().cloned().unwrap_or_default();
    let indices = inputs.get(1).cloned().unwrap_or_default();
    if source.is_empty() {
        return vec![Vec::new(), index_loop(1)];
    }
    let len = source.len() as i64;
    let selected: Loop = indices
        .iter()
        .map(|index| {
            let raw = index.to_number(0.0);
            let raw = if raw.is_finite() { raw.trunc() as i64 } else { 0 };
            source[raw.rem_euclid(len) as usize].clone()
        })
        .collect();
    let count = selected.len();
    vec![selected, index_loop(count)]
}

pub(super) fn loop_builder_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    let values: Loop = (0..inputs.len()).map(|port| value_at(inputs, port, 0)).collect();
    vec![index_loop(values.len()), values]
}

pub(super) fn loop_count_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    let count = inputs.first().map(Vec::len).unwrap_or(0);
    vec![vec![PortValue::Number(count as f64)]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Loop {
        values.iter().copied().map(PortValue::Number).collect()
    }

    #[test]
    fn loop_select_wraps_negative_indices() {
        let source = vec![PortValue::from("a"), PortValue::from("b"), PortValue::from("c")];
        let out = loop_select_eval(&[source, numbers(&[0.0, -1.0, 4.0, 2.0])], None);
        assert_eq!(
            out[0],
            vec![
                PortValue::from("a"),
                PortValue::from("c"),
                PortValue::from("b"),
                PortValue::from("c"),
            ]
        );
        assert_eq!(out[1], numbers(&[0.0, 1.0, 2.0, 3.0]));
    }

    #[test]
    fn loop_builder_collects_first_values() {
        let out = loop_builder_eval(
            &[numbers(&[1.0, 9.0]), numbers(&[2.0]), numbers(&[3.0])],
            Some(NodeType::Number),
        );
        assert_eq!(out[0], numbers(&[0.0, 1.0, 2.0]));
        assert_eq!(out[1], numbers(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn loop_count_reports_length() {
        let out = loop_count_eval(&[vec![PortValue::from("x"); 4]], None);
        assert_eq!(out, vec![numbers(&[4.0])]);
    }
}
