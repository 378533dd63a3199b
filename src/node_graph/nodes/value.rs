use super::*;
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::models::values::{Color, LayerSize, Point3D, Point4D, Position};

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match patch {
        Patch::Value => ("Value", "Holds a value of any type.", "General"),
        Patch::Splitter => (
            "Splitter",
            "Relays a value across a group boundary.",
            "General",
        ),
        Patch::OptionPicker => (
            "Option Picker",
            "Chooses one of its inputs by index.",
            "General",
        ),
        Patch::Pack => ("Pack", "Builds a geometric value from numbers.", "General"),
        Patch::Unpack => ("Unpack", "Splits a geometric value into numbers.", "General"),
        Patch::ColorToHex => ("Color to Hex", "Formats a color as #RRGGBBAA.", "General"),
        Patch::HexToColor => ("Hex to Color", "Parses a hex string into a color.", "General"),
        _ => return None,
    };
    Some(entry)
}

/// Labels of the number components of a packable type.
fn components(node_type: NodeType) -> &'static [&'static str] {
    match node_type {
        NodeType::Size => &["W", "H"],
        NodeType::Point3D => &["X", "Y", "Z"],
        NodeType::Point4D => &["X", "Y", "Z", "W"],
        _ => &["X", "Y"],
    }
}

pub(super) fn row_definitions(patch: Patch, node_type: NodeType) -> NodeRowDefinitions {
    match patch {
        Patch::OptionPicker => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::fixed(0, "Option", PortValue::Number(0.0)),
                InputDefinition::new(1, "", node_type.default_value()),
                InputDefinition::new(2, "", node_type.default_value()),
            ],
            outputs: vec![OutputDefinition::new("", node_type)],
        },
        Patch::Pack => NodeRowDefinitions {
            inputs: components(node_type)
                .iter()
                .enumerate()
                .map(|(i, label)| InputDefinition::fixed(i, label, PortValue::Number(0.0)))
                .collect(),
            outputs: vec![OutputDefinition::new("", node_type)],
        },
        Patch::Unpack => NodeRowDefinitions {
            inputs: vec![InputDefinition::new(0, "", node_type.default_value())],
            outputs: components(node_type)
                .iter()
                .map(|label| OutputDefinition::new(label, NodeType::Number))
                .collect(),
        },
        Patch::ColorToHex => NodeRowDefinitions {
            inputs: vec![InputDefinition::fixed(0, "Color", PortValue::Color(Color::WHITE))],
            outputs: vec![OutputDefinition::new("Hex", NodeType::String)],
        },
        Patch::HexToColor => NodeRowDefinitions {
            inputs: vec![InputDefinition::fixed(
                0,
                "Hex",
                PortValue::String("#FFFFFFFF".to_string()),
            )],
            outputs: vec![OutputDefinition::new("Color", NodeType::Color)],
        },
        _ => NodeRowDefinitions {
            inputs: vec![InputDefinition::new(0, "", node_type.default_value())],
            outputs: vec![OutputDefinition::new("", node_type)],
        },
    }
}

pub(super) fn identity_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    vec![inputs.first().cloned().unwrap_or_default()]
}

pub(super) fn option_picker_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    let option_count = inputs.len().saturating_sub(1).max(1);
    looped_single(inputs, |args| {
        let option = number(args, 0);
        let choice = if option.is_nan() || option <= 0.0 {
            0
        } else {
            (option.trunc() as usize).min(option_count - 1)
        };
        arg(args, choice + 1)
    })
}

pub(super) fn pack_eval(inputs: &[Loop], node_type: Option<NodeType>) -> Vec<Loop> {
    let node_type = node_type.unwrap_or(NodeType::Position);
    looped_single(inputs, |args| {
        let c = |i| number(args, i);
        match node_type {
            NodeType::Size => PortValue::Size(LayerSize::new(c(0), c(1))),
            NodeType::Point3D => PortValue::Point3D(Point3D::new(c(0), c(1), c(2))),
            NodeType::Point4D => PortValue::Point4D(Point4D::new(c(0), c(1), c(2), c(3))),
            _ => PortValue::Position(Position::new(c(0), c(1))),
        }
    })
}

pub(super) fn unpack_eval(inputs: &[Loop], node_type: Option<NodeType>) -> Vec<Loop> {
    let node_type = node_type.unwrap_or(NodeType::Position);
    let count = components(node_type).len();
    looped(inputs, count, |args, _| {
        let parts = match arg(args, 0).coerce(node_type, 0.0) {
            PortValue::Size(s) => vec![s.width, s.height],
            PortValue::Position(p) => vec![p.x, p.y],
            PortValue::Point3D(p) => vec![p.x, p.y, p.z],
            PortValue::Point4D(p) => vec![p.x, p.y, p.z, p.w],
            _ => vec![0.0; count],
        };
        parts.into_iter().map(PortValue::Number).collect()
    })
}

pub(super) fn color_to_hex_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| match arg(args, 0) {
        PortValue::Color(color) => PortValue::String(color.to_hex()),
        _ => PortValue::String(Color::FALSE.to_hex()),
    })
}

pub(super) fn hex_to_color_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| {
        let color = match arg(args, 0) {
            PortValue::String(hex) => Color::from_hex(&hex).unwrap_or(Color::FALSE),
            _ => Color::FALSE,
        };
        PortValue::Color(color)
    })
}
