use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::enums::{
    AnimationCurve, Anchoring, BlendMode, DelayStyle, FitStyle, LayerStroke, LightType,
    NetworkRequestType, Orientation, PortValueEnum, ShapeCoordinates, TextAlignment,
    TextVerticalAlignment,
};
use super::node_graph::NodeId;

/// One loop of values flowing through a single port.
pub type Loop = Vec<PortValue>;

/// RGBA color with normalized channels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    /// The color every falsy coercion lands on.
    pub const FALSE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn gray(level: f64) -> Self {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        Self::new(level, level, level, 1.0)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .ok()
                .map(|v| v as f64 / 255.0)
        };
        let r = channel(0..2)?;
        let g = channel(2..4)?;
        let b = channel(4..6)?;
        let a = if hex.len() == 8 { channel(6..8)? } else { 1.0 };
        Some(Self::new(r, g, b, a))
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }

    /// Rec. 709 luma, weighted by alpha.
    pub fn luminance(&self) -> f64 {
        (0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b) * self.a
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct LayerSize {
    pub width: f64,
    pub height: f64,
}

impl LayerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Point4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Point4D {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub position: Point3D,
    pub scale: Point3D,
    pub rotation: Point3D,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3D::default(),
            scale: Point3D::new(1.0, 1.0, 1.0),
            rotation: Point3D::default(),
        }
    }
}

/// Handle to media loaded by the host; the engine never decodes media itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub id: Uuid,
    pub key: String,
}

impl MediaRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Comparable {
    Number(f64),
    String(String),
    Bool(bool),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeCommand {
    #[default]
    ClosePath,
    MoveTo {
        point: Position,
    },
    LineTo {
        point: Position,
    },
    #[serde(rename_all = "camelCase")]
    CurveTo {
        point: Position,
        control_point1: Position,
        control_point2: Position,
    },
}

/// Every value that can sit in a port.
///
/// Each variant corresponds to exactly one [`super::node_type::NodeType`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PortValue {
    Number(f64),
    Int(i64),
    String(String),
    Bool(bool),
    Color(Color),
    Size(LayerSize),
    Position(Position),
    #[serde(rename = "point3D")]
    Point3D(Point3D),
    #[serde(rename = "point4D")]
    Point4D(Point4D),
    Transform(Transform),
    /// Time at which the pulse fired.
    Pulse(f64),
    Json(serde_json::Value),
    AsyncMedia(Option<MediaRef>),
    AssignedLayer(Option<NodeId>),
    Comparable(Option<Comparable>),
    ShapeCommand(ShapeCommand),
    Anchoring(Anchoring),
    BlendMode(BlendMode),
    TextAlignment(TextAlignment),
    TextVerticalAlignment(TextVerticalAlignment),
    DelayStyle(DelayStyle),
    LightType(LightType),
    AnimationCurve(AnimationCurve),
    FitStyle(FitStyle),
    ShapeCoordinates(ShapeCoordinates),
    NetworkRequestType(NetworkRequestType),
    Orientation(Orientation),
    LayerStroke(LayerStroke),
    None,
}

impl From<f64> for PortValue {
    fn from(value: f64) -> Self {
        PortValue::Number(value)
    }
}

impl From<bool> for PortValue {
    fn from(value: bool) -> Self {
        PortValue::Bool(value)
    }
}

impl From<&str> for PortValue {
    fn from(value: &str) -> Self {
        PortValue::String(value.to_string())
    }
}

impl From<String> for PortValue {
    fn from(value: String) -> Self {
        PortValue::String(value)
    }
}

impl From<Color> for PortValue {
    fn from(value: Color) -> Self {
        PortValue::Color(value)
    }
}

impl From<Position> for PortValue {
    fn from(value: Position) -> Self {
        PortValue::Position(value)
    }
}

impl From<LayerSize> for PortValue {
    fn from(value: LayerSize) -> Self {
        PortValue::Size(value)
    }
}

impl From<Point3D> for PortValue {
    fn from(value: Point3D) -> Self {
        PortValue::Point3D(value)
    }
}

/// Compact number formatting: integral values drop the fraction.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(v) => f.write_str(&format_number(*v)),
            PortValue::Int(v) => write!(f, "{v}"),
            PortValue::String(s) => f.write_str(s),
            PortValue::Bool(b) => write!(f, "{b}"),
            PortValue::Color(c) => f.write_str(&c.to_hex()),
            PortValue::Size(s) => write!(
                f,
                "{}, {}",
                format_number(s.width),
                format_number(s.height)
            ),
            PortValue::Position(p) => {
                write!(f, "{}, {}", format_number(p.x), format_number(p.y))
            }
            PortValue::Point3D(p) => write!(
                f,
                "{}, {}, {}",
                format_number(p.x),
                format_number(p.y),
                format_number(p.z)
            ),
            PortValue::Point4D(p) => write!(
                f,
                "{}, {}, {}, {}",
                format_number(p.x),
                format_number(p.y),
                format_number(p.z),
                format_number(p.w)
            ),
            PortValue::Transform(t) => write!(
                f,
                "position({}, {}, {}) scale({}, {}, {}) rotation({}, {}, {})",
                format_number(t.position.x),
                format_number(t.position.y),
                format_number(t.position.z),
                format_number(t.scale.x),
                format_number(t.scale.y),
                format_number(t.scale.z),
                format_number(t.rotation.x),
                format_number(t.rotation.y),
                format_number(t.rotation.z)
            ),
            PortValue::Pulse(t) => f.write_str(&format_number(*t)),
            PortValue::Json(v) => write!(f, "{v}"),
            PortValue::AsyncMedia(Some(media)) => f.write_str(&media.key),
            PortValue::AssignedLayer(Some(id)) => write!(f, "{id}"),
            PortValue::AsyncMedia(None) | PortValue::AssignedLayer(None) => f.write_str("None"),
            PortValue::Comparable(Some(Comparable::Number(v))) => {
                f.write_str(&format_number(*v))
            }
            PortValue::Comparable(Some(Comparable::String(s))) => f.write_str(s),
            PortValue::Comparable(Some(Comparable::Bool(b))) => write!(f, "{b}"),
            PortValue::Comparable(None) => f.write_str("None"),
            PortValue::ShapeCommand(command) => match command {
                ShapeCommand::ClosePath => f.write_str("closePath"),
                ShapeCommand::MoveTo { .. } => f.write_str("moveTo"),
                ShapeCommand::LineTo { .. } => f.write_str("lineTo"),
                ShapeCommand::CurveTo { .. } => f.write_str("curveTo"),
            },
            PortValue::Anchoring(v) => f.write_str(v.as_str()),
            PortValue::BlendMode(v) => f.write_str(v.as_str()),
            PortValue::TextAlignment(v) => f.write_str(v.as_str()),
            PortValue::TextVerticalAlignment(v) => f.write_str(v.as_str()),
            PortValue::DelayStyle(v) => f.write_str(v.as_str()),
            PortValue::LightType(v) => f.write_str(v.as_str()),
            PortValue::AnimationCurve(v) => f.write_str(v.as_str()),
            PortValue::FitStyle(v) => f.write_str(v.as_str()),
            PortValue::ShapeCoordinates(v) => f.write_str(v.as_str()),
            PortValue::NetworkRequestType(v) => f.write_str(v.as_str()),
            PortValue::Orientation(v) => f.write_str(v.as_str()),
            PortValue::LayerStroke(v) => f.write_str(v.as_str()),
            PortValue::None => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_through_color() {
        let color = Color::from_hex("#FF8000").expect("valid hex");
        assert_eq!(color.r, 1.0);
        assert!((color.g - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(color.a, 1.0);
        assert_eq!(color.to_hex(), "#FF8000FF");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(Color::from_hex("#FFF").is_none());
        assert!(Color::from_hex("zzzzzz").is_none());
        assert!(Color::from_hex("").is_none());
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(PortValue::Number(5.0).to_string(), "5");
        assert_eq!(PortValue::Number(2.5).to_string(), "2.5");
        assert_eq!(PortValue::Number(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn port_values_serialize_adjacently_tagged() {
        let json = serde_json::to_value(PortValue::Position(Position::new(1.0, 2.0)))
            .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "type": "position", "value": { "x": 1.0, "y": 2.0 } })
        );
        let back: PortValue = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, PortValue::Position(Position::new(1.0, 2.0)));
    }

    #[test]
    fn enum_values_display_their_case_name() {
        assert_eq!(PortValue::DelayStyle(DelayStyle::Always).to_string(), "always");
    }
}
