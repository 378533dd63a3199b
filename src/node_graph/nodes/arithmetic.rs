use super::*;
use crate::models::schema::{InputDefinition, OutputDefinition};
use crate::models::values::{Color, LayerSize, Point3D, Position};

pub(super) fn describe(patch: Patch) -> Option<(&'static str, &'static str, &'static str)> {
    let entry = match patch {
        Patch::Add => ("Add", "Adds values; strings concatenate.", "Math"),
        Patch::Subtract => ("Subtract", "Subtracts the second value from the first.", "Math"),
        Patch::Multiply => ("Multiply", "Multiplies values component-wise.", "Math"),
        Patch::Divide => ("Divide", "Divides values; division by zero yields 0.", "Math"),
        Patch::Modulo => ("Mod", "Remainder after division; zero divisor yields 0.", "Math"),
        Patch::Power => ("Power", "Raises the first value to the second.", "Math"),
        Patch::Max => ("Max", "Larger of two values.", "Math"),
        Patch::Min => ("Min", "Smaller of two values.", "Math"),
        Patch::Absolute => ("Absolute Value", "Distance from zero.", "Math"),
        Patch::Round => ("Round", "Rounds to a number of decimal places.", "Math"),
        Patch::Clip => ("Clip", "Clamps a value between a minimum and maximum.", "Math"),
        _ => return None,
    };
    Some(entry)
}

pub(super) fn row_definitions(patch: Patch, node_type: NodeType) -> NodeRowDefinitions {
    match patch {
        Patch::Absolute => NodeRowDefinitions {
            inputs: vec![InputDefinition::fixed(0, "Value", PortValue::Number(0.0))],
            outputs: vec![OutputDefinition::new("Value", NodeType::Number)],
        },
        Patch::Round => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::fixed(0, "Value", PortValue::Number(0.0)),
                InputDefinition::fixed(1, "Places", PortValue::Number(0.0)),
                InputDefinition::fixed(2, "Rounded Up", PortValue::Bool(false)),
            ],
            outputs: vec![OutputDefinition::new("Value", NodeType::Number)],
        },
        Patch::Clip => NodeRowDefinitions {
            inputs: vec![
                InputDefinition::fixed(0, "Value", PortValue::Number(0.0)),
                InputDefinition::fixed(1, "Min", PortValue::Number(-5.0)),
                InputDefinition::fixed(2, "Max", PortValue::Number(5.0)),
            ],
            outputs: vec![OutputDefinition::new("Value", NodeType::Number)],
        },
        _ => {
            let second = match patch {
                Patch::Multiply | Patch::Divide | Patch::Power => identity_value(node_type),
                _ => node_type.default_value(),
            };
            NodeRowDefinitions {
                inputs: vec![
                    InputDefinition::new(0, "", node_type.default_value()),
                    InputDefinition::new(1, "", second),
                ],
                outputs: vec![OutputDefinition::new("", node_type)],
            }
        }
    }
}

/// Multiplicative identity for the arithmetic types.
fn identity_value(node_type: NodeType) -> PortValue {
    match node_type {
        NodeType::Size => PortValue::Size(LayerSize::new(1.0, 1.0)),
        NodeType::Position => PortValue::Position(Position::new(1.0, 1.0)),
        NodeType::Point3D => PortValue::Point3D(Point3D::new(1.0, 1.0, 1.0)),
        NodeType::Number => PortValue::Number(1.0),
        other => other.default_value(),
    }
}

/// Applies `f` per component when both sides share a geometric type,
/// otherwise on their numeric readings.
fn componentwise(a: &PortValue, b: &PortValue, f: impl Fn(f64, f64) -> f64) -> PortValue {
    match (a, b) {
        (PortValue::Number(x), PortValue::Number(y)) => PortValue::Number(f(*x, *y)),
        (PortValue::Size(x), PortValue::Size(y)) => {
            PortValue::Size(LayerSize::new(f(x.width, y.width), f(x.height, y.height)))
        }
        (PortValue::Position(x), PortValue::Position(y)) => {
            PortValue::Position(Position::new(f(x.x, y.x), f(x.y, y.y)))
        }
        (PortValue::Point3D(x), PortValue::Point3D(y)) => {
            PortValue::Point3D(Point3D::new(f(x.x, y.x), f(x.y, y.y), f(x.z, y.z)))
        }
        (PortValue::Color(x), PortValue::Color(y)) => PortValue::Color(Color::new(
            f(x.r, y.r).clamp(0.0, 1.0),
            f(x.g, y.g).clamp(0.0, 1.0),
            f(x.b, y.b).clamp(0.0, 1.0),
            f(x.a, y.a).clamp(0.0, 1.0),
        )),
        _ => PortValue::Number(f(a.to_number(0.0), b.to_number(0.0))),
    }
}

fn binary(inputs: &[Loop], f: fn(f64, f64) -> f64) -> Vec<Loop> {
    looped_single(inputs, |args| componentwise(&arg(args, 0), &arg(args, 1), f))
}

fn safe_divide(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

fn safe_modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a % b
    }
}

pub(super) fn add_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| match (arg(args, 0), arg(args, 1)) {
        (PortValue::String(a), b) => PortValue::String(format!("{a}{b}")),
        (a, PortValue::String(b)) => PortValue::String(format!("{a}{b}")),
        (a, b) => componentwise(&a, &b, |x, y| x + y),
    })
}

pub(super) fn subtract_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, |a, b| a - b)
}

pub(super) fn multiply_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, |a, b| a * b)
}

pub(super) fn divide_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, safe_divide)
}

pub(super) fn modulo_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, safe_modulo)
}

pub(super) fn power_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, |a, b| {
        let result = a.powf(b);
        if result.is_finite() {
            result
        } else {
            0.0
        }
    })
}

pub(super) fn max_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, f64::max)
}

pub(super) fn min_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    binary(inputs, f64::min)
}

pub(super) fn absolute_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| PortValue::Number(number(args, 0).abs()))
}

pub(super) fn round_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| {
        let value = number(args, 0);
        let places = number(args, 1).clamp(0.0, 15.0).trunc() as i32;
        let rounded_up = arg(args, 2).is_truthy(0.0);
        let scale = 10f64.powi(places);
        let scaled = value * scale;
        let rounded = if rounded_up {
            scaled.ceil()
        } else {
            scaled.round()
        };
        PortValue::Number(rounded / scale)
    })
}

pub(super) fn clip_eval(inputs: &[Loop], _node_type: Option<NodeType>) -> Vec<Loop> {
    looped_single(inputs, |args| {
        let value = number(args, 0);
        let min = number(args, 1);
        let max = number(args, 2);
        // Inverted bounds clamp to the lower one.
        PortValue::Number(value.max(min).min(max.max(min)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Loop {
        values.iter().copied().map(PortValue::Number).collect()
    }

    #[test]
    fn add_broadcasts_over_loops() {
        let out = add_eval(&[numbers(&[1.0, 2.0, 3.0]), numbers(&[10.0])], None);
        assert_eq!(out, vec![numbers(&[11.0, 12.0, 13.0])]);
    }

    #[test]
    fn add_concatenates_strings() {
        let out = add_eval(
            &[vec![PortValue::from("foo")], vec![PortValue::from("bar")]],
            Some(NodeType::String),
        );
        assert_eq!(out, vec![vec![PortValue::from("foobar")]]);
    }

    #[test]
    fn add_works_per_component() {
        let out = add_eval(
            &[
                vec![PortValue::Position(Position::new(1.0, 2.0))],
                vec![PortValue::Position(Position::new(3.0, 4.0))],
            ],
            Some(NodeType::Position),
        );
        assert_eq!(out, vec![vec![PortValue::Position(Position::new(4.0, 6.0))]]);
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let out = divide_eval(&[numbers(&[6.0, 6.0]), numbers(&[3.0, 0.0])], None);
        assert_eq!(out, vec![numbers(&[2.0, 0.0])]);

        let out = modulo_eval(&[numbers(&[7.0]), numbers(&[0.0])], None);
        assert_eq!(out, vec![numbers(&[0.0])]);
    }

    #[test]
    fn round_respects_places_and_direction() {
        let out = round_eval(
            &[numbers(&[1.234, 1.231]), numbers(&[2.0]), vec![PortValue::Bool(true)]],
            None,
        );
        assert_eq!(out, vec![numbers(&[1.24, 1.24])]);
    }

    #[test]
    fn clip_clamps_into_range() {
        let out = clip_eval(&[numbers(&[-10.0, 0.5, 10.0]), numbers(&[0.0]), numbers(&[1.0])], None);
        assert_eq!(out, vec![numbers(&[0.0, 0.5, 1.0])]);
    }

    #[test]
    fn multiply_defaults_its_second_input_to_one() {
        let rows = row_definitions(Patch::Multiply, NodeType::Size);
        assert_eq!(
            rows.inputs[1].default_values,
            vec![PortValue::Size(LayerSize::new(1.0, 1.0))]
        );
        assert_eq!(rows.outputs[0].node_type, NodeType::Size);
    }
}
