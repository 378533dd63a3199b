use std::cmp::Ordering;

use crate::models::enums::{
    AnimationCurve, Anchoring, BlendMode, DelayStyle, FitStyle, LayerStroke, LightType,
    NetworkRequestType, Orientation, PortValueEnum, ShapeCoordinates, TextAlignment,
    TextVerticalAlignment,
};
use crate::models::node_type::NodeType;
use crate::models::values::{
    Color, Comparable, LayerSize, Point3D, Point4D, PortValue, Position, Transform,
};

impl PortValue {
    /// Converts into `to`. Total: unconvertible values yield the target's default.
    pub fn coerce(&self, to: NodeType, graph_time: f64) -> PortValue {
        if self.node_type() == to {
            return self.clone();
        }
        match to {
            NodeType::Number => PortValue::Number(self.to_number(graph_time)),
            NodeType::Int => PortValue::Int(truncate_to_int(self.to_number(graph_time))),
            NodeType::String => PortValue::String(self.to_string()),
            NodeType::Bool => PortValue::Bool(self.is_truthy(graph_time)),
            NodeType::Pulse => {
                if self.is_truthy(graph_time) {
                    PortValue::Pulse(graph_time)
                } else {
                    PortValue::Pulse(0.0)
                }
            }
            NodeType::Color => PortValue::Color(self.to_color()),
            NodeType::Size => {
                let (width, height) = self.planar().unwrap_or_default();
                PortValue::Size(LayerSize::new(width, height))
            }
            NodeType::Position => {
                let (x, y) = self.planar().unwrap_or_default();
                PortValue::Position(Position::new(x, y))
            }
            NodeType::Point3D => PortValue::Point3D(self.spatial().unwrap_or_default()),
            NodeType::Point4D => PortValue::Point4D(match self {
                PortValue::Number(n) => Point4D::new(*n, *n, *n, *n),
                PortValue::Int(n) => {
                    let n = *n as f64;
                    Point4D::new(n, n, n, n)
                }
                _ => match self.spatial() {
                    Some(p) => Point4D::new(p.x, p.y, p.z, 0.0),
                    None => Point4D::default(),
                },
            }),
            NodeType::Transform => PortValue::Transform(match self {
                PortValue::Position(_) | PortValue::Point3D(_) | PortValue::Point4D(_) => {
                    Transform {
                        position: self.spatial().unwrap_or_default(),
                        ..Transform::default()
                    }
                }
                _ => Transform::default(),
            }),
            NodeType::Json => PortValue::Json(match self {
                PortValue::String(s) => serde_json::from_str(s)
                    .unwrap_or_else(|_| serde_json::Value::Object(Default::default())),
                PortValue::Number(n) => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
                PortValue::Int(n) => serde_json::Value::from(*n),
                PortValue::Bool(b) => serde_json::Value::Bool(*b),
                _ => serde_json::Value::Object(Default::default()),
            }),
            NodeType::Comparable => PortValue::Comparable(match self {
                PortValue::Number(n) => Some(Comparable::Number(*n)),
                PortValue::Int(n) => Some(Comparable::Number(*n as f64)),
                PortValue::String(s) => Some(Comparable::String(s.clone())),
                PortValue::Bool(b) => Some(Comparable::Bool(*b)),
                _ => None,
            }),
            NodeType::Anchoring => coerce_enum::<Anchoring>(self, graph_time),
            NodeType::BlendMode => coerce_enum::<BlendMode>(self, graph_time),
            NodeType::TextAlignment => coerce_enum::<TextAlignment>(self, graph_time),
            NodeType::TextVerticalAlignment => {
                coerce_enum::<TextVerticalAlignment>(self, graph_time)
            }
            NodeType::DelayStyle => coerce_enum::<DelayStyle>(self, graph_time),
            NodeType::LightType => coerce_enum::<LightType>(self, graph_time),
            NodeType::AnimationCurve => coerce_enum::<AnimationCurve>(self, graph_time),
            NodeType::FitStyle => coerce_enum::<FitStyle>(self, graph_time),
            NodeType::ShapeCoordinates => coerce_enum::<ShapeCoordinates>(self, graph_time),
            NodeType::NetworkRequestType => coerce_enum::<NetworkRequestType>(self, graph_time),
            NodeType::Orientation => coerce_enum::<Orientation>(self, graph_time),
            NodeType::LayerStroke => coerce_enum::<LayerStroke>(self, graph_time),
            NodeType::AsyncMedia
            | NodeType::AssignedLayer
            | NodeType::ShapeCommand
            | NodeType::None => to.default_value(),
        }
    }

    /// A pulse is only truthy on the graph step it fired in.
    pub fn is_truthy(&self, graph_time: f64) -> bool {
        match self {
            PortValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PortValue::Int(n) => *n != 0,
            PortValue::String(s) => !s.is_empty(),
            PortValue::Bool(b) => *b,
            PortValue::Color(c) => *c != Color::FALSE,
            PortValue::Size(s) => s.width != 0.0 || s.height != 0.0,
            PortValue::Position(p) => p.x != 0.0 || p.y != 0.0,
            PortValue::Point3D(p) => p.x != 0.0 || p.y != 0.0 || p.z != 0.0,
            PortValue::Point4D(p) => p.x != 0.0 || p.y != 0.0 || p.z != 0.0 || p.w != 0.0,
            PortValue::Pulse(t) => *t == graph_time && graph_time != 0.0,
            PortValue::Json(v) => !v.is_null(),
            PortValue::AsyncMedia(media) => media.is_some(),
            PortValue::AssignedLayer(layer) => layer.is_some(),
            PortValue::Comparable(c) => c.is_some(),
            PortValue::None => false,
            _ => true,
        }
    }

    pub fn to_number(&self, graph_time: f64) -> f64 {
        match self {
            PortValue::Number(n) => *n,
            PortValue::Int(n) => *n as f64,
            PortValue::Bool(b) => bool_to_number(*b),
            PortValue::Size(s) => s.width,
            PortValue::Position(p) => p.x,
            PortValue::Point3D(p) => p.x,
            PortValue::Point4D(p) => p.x,
            PortValue::Color(c) => c.luminance(),
            PortValue::String(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<f64>() {
                    Ok(n) => n,
                    Err(_) => bool_to_number(!trimmed.is_empty()),
                }
            }
            PortValue::Comparable(Some(Comparable::Number(n))) => *n,
            PortValue::Anchoring(v) => v.index() as f64,
            PortValue::BlendMode(v) => v.index() as f64,
            PortValue::TextAlignment(v) => v.index() as f64,
            PortValue::TextVerticalAlignment(v) => v.index() as f64,
            PortValue::DelayStyle(v) => v.index() as f64,
            PortValue::LightType(v) => v.index() as f64,
            PortValue::AnimationCurve(v) => v.index() as f64,
            PortValue::FitStyle(v) => v.index() as f64,
            PortValue::ShapeCoordinates(v) => v.index() as f64,
            PortValue::NetworkRequestType(v) => v.index() as f64,
            PortValue::Orientation(v) => v.index() as f64,
            PortValue::LayerStroke(v) => v.index() as f64,
            other => bool_to_number(other.is_truthy(graph_time)),
        }
    }

    fn to_color(&self) -> Color {
        match self {
            PortValue::Color(c) => *c,
            PortValue::String(s) => Color::from_hex(s).unwrap_or(Color::FALSE),
            PortValue::Number(n) => Color::gray(*n),
            PortValue::Int(n) => Color::gray(*n as f64),
            PortValue::Bool(true) => Color::WHITE,
            PortValue::Point4D(p) => Color::new(p.x, p.y, p.z, p.w),
            _ => Color::FALSE,
        }
    }

    /// Two-component reading shared by size and position.
    fn planar(&self) -> Option<(f64, f64)> {
        match self {
            PortValue::Number(n) => Some((*n, *n)),
            PortValue::Int(n) => Some((*n as f64, *n as f64)),
            PortValue::Size(s) => Some((s.width, s.height)),
            PortValue::Position(p) => Some((p.x, p.y)),
            PortValue::Point3D(p) => Some((p.x, p.y)),
            PortValue::Point4D(p) => Some((p.x, p.y)),
            PortValue::Transform(t) => Some((t.position.x, t.position.y)),
            _ => None,
        }
    }

    fn spatial(&self) -> Option<Point3D> {
        match self {
            PortValue::Number(n) => Some(Point3D::new(*n, *n, *n)),
            PortValue::Int(n) => {
                let n = *n as f64;
                Some(Point3D::new(n, n, n))
            }
            PortValue::Point3D(p) => Some(*p),
            PortValue::Point4D(p) => Some(Point3D::new(p.x, p.y, p.z)),
            PortValue::Transform(t) => Some(t.position),
            _ => self.planar().map(|(x, y)| Point3D::new(x, y, 0.0)),
        }
    }
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn truncate_to_int(n: f64) -> i64 {
    if n.is_nan() {
        0
    } else {
        n.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64
    }
}

fn coerce_enum<E: PortValueEnum>(value: &PortValue, graph_time: f64) -> PortValue {
    match value {
        PortValue::Number(_) | PortValue::Int(_) | PortValue::Bool(_) => {
            E::from_number(value.to_number(graph_time)).into_port_value()
        }
        _ => E::default().into_port_value(),
    }
}

/// Coerces every value of a loop. An empty loop becomes the target's default.
pub fn coerce_loop(values: &[PortValue], to: NodeType, graph_time: f64) -> Vec<PortValue> {
    if values.is_empty() {
        return vec![to.default_value()];
    }
    values.iter().map(|v| v.coerce(to, graph_time)).collect()
}

/// Ordering used by comparison nodes and directional delays.
///
/// Values of different types compare by their numeric reading.
pub fn compare_values(a: &PortValue, b: &PortValue) -> Option<Ordering> {
    match (a, b) {
        (PortValue::String(a), PortValue::String(b)) => Some(a.cmp(b)),
        (PortValue::Bool(a), PortValue::Bool(b)) => Some(a.cmp(b)),
        (PortValue::Int(a), PortValue::Int(b)) => Some(a.cmp(b)),
        _ if is_numeric(a) && is_numeric(b) => a.to_number(0.0).partial_cmp(&b.to_number(0.0)),
        _ => None,
    }
}

fn is_numeric(value: &PortValue) -> bool {
    matches!(
        value,
        PortValue::Number(_) | PortValue::Int(_) | PortValue::Bool(_)
    )
}
