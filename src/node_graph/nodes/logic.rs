use std::cmp::Ordering;

use super::*;
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::node_graph::coercion::compare_values;

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match patch {
        Patch::Equals => ("Equals", "True when both values are equal.", "Logic"),
        Patch::GreaterThan => ("Greater Than", "True when the first number is larger.", "Logic"),
        Patch::LessThan => ("Less Than", "True when the first number is smaller.", "Logic"),
        Patch::Not => ("NOT", "Inverts a boolean.", "Logic"),
        Patch::And => ("AND", "True when both inputs are true.", "Logic"),
        Patch::Or => ("OR", "True when either input is true.", "Logic"),
        _ => return None,
    };
    Some(entry)
}

pub(super) fn row_definitions(patch: Patch, node_type: NodeType) -> NodeRowDefinitions {
    let inputs = match patch {
        Patch::Equals => vec![
            InputDefinition::new(0, "", node_type.default_value()),
            InputDefinition::new(1, "", node_type.default_value()),
        ],
        Patch::GreaterThan | Patch::LessThan => vec![
            InputDefinition::fixed(0, "", PortValue::Number(0.0)),
            InputDefinition::fixed(1, "", PortValue::Number(0.0)),
        ],
        Patch::Not => vec![InputDefinition::fixed(0, "", PortValue::Bool(false))],
        _ => vec![
            InputDefinition::fixed(0, "", PortValue::Bool(false)),
            InputDefinition::fixed(1, "", PortValue::Bool(false)),
        ],
    };
    NodeRowDefinitions {
        inputs,
        outputs: vec![OutputDefinition::new("", NodeType::Bool)],
    }
}

fn compare(inputs: &[Loop], accept: fn(Ordering) -> bool) -> Vec<Loop> {
    looped_single(inputs, |args| {
        let ordering = compare_values(&arg(args, 0), &arg(args, 1));
        PortValue::Bool(ordering.map(accept).unwrap_or(false))
    })
}

pub(super) fn equals_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| PortValue::Bool(arg(args, 0) == arg(args, 1)))
}

pub(super) fn greater_than_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    compare(inputs, Ordering::is_gt)
}

pub(super) fn less_than_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    compare(inputs, Ordering::is_lt)
}

pub(super) fn not_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| PortValue::Bool(!arg(args, 0).is_truthy(0.0)))
}

pub(super) fn and_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| {
        PortValue::Bool(args.iter().all(|v| v.is_truthy(0.0)))
    })
}

pub(super) fn or_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| {
        PortValue::Bool(args.iter().any(|v| v.is_truthy(0.0)))
    })
}
