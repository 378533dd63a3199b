use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::{
    AnimationCurve, Anchoring, BlendMode, DelayStyle, FitStyle, LayerStroke, LightType,
    NetworkRequestType, Orientation, ShapeCoordinates, TextAlignment, TextVerticalAlignment,
};
use super::values::{
    Color, LayerSize, Point3D, Point4D, PortValue, Position, ShapeCommand, Transform,
};

/// User-visible type tag. One per [`PortValue`] variant.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Number,
    Int,
    String,
    Bool,
    Color,
    Size,
    Position,
    #[serde(rename = "point3D")]
    Point3D,
    #[serde(rename = "point4D")]
    Point4D,
    Transform,
    Pulse,
    Json,
    AsyncMedia,
    AssignedLayer,
    Comparable,
    ShapeCommand,
    Anchoring,
    BlendMode,
    TextAlignment,
    TextVerticalAlignment,
    DelayStyle,
    LightType,
    AnimationCurve,
    FitStyle,
    ShapeCoordinates,
    NetworkRequestType,
    Orientation,
    LayerStroke,
    None,
}

impl NodeType {
    pub const ALL: &'static [NodeType] = &[
        NodeType::Number,
        NodeType::Int,
        NodeType::String,
        NodeType::Bool,
        NodeType::Color,
        NodeType::Size,
        NodeType::Position,
        NodeType::Point3D,
        NodeType::Point4D,
        NodeType::Transform,
        NodeType::Pulse,
        NodeType::Json,
        NodeType::AsyncMedia,
        NodeType::AssignedLayer,
        NodeType::Comparable,
        NodeType::ShapeCommand,
        NodeType::Anchoring,
        NodeType::BlendMode,
        NodeType::TextAlignment,
        NodeType::TextVerticalAlignment,
        NodeType::DelayStyle,
        NodeType::LightType,
        NodeType::AnimationCurve,
        NodeType::FitStyle,
        NodeType::ShapeCoordinates,
        NodeType::NetworkRequestType,
        NodeType::Orientation,
        NodeType::LayerStroke,
        NodeType::None,
    ];

    /// The value every failed coercion into this type produces.
    pub fn default_value(self) -> PortValue {
        match self {
            NodeType::Number => PortValue::Number(0.0),
            NodeType::Int => PortValue::Int(0),
            NodeType::String => PortValue::String(String::new()),
            NodeType::Bool => PortValue::Bool(false),
            NodeType::Color => PortValue::Color(Color::FALSE),
            NodeType::Size => PortValue::Size(LayerSize::default()),
            NodeType::Position => PortValue::Position(Position::default()),
            NodeType::Point3D => PortValue::Point3D(Point3D::default()),
            NodeType::Point4D => PortValue::Point4D(Point4D::default()),
            NodeType::Transform => PortValue::Transform(Transform::default()),
            NodeType::Pulse => PortValue::Pulse(0.0),
            NodeType::Json => PortValue::Json(serde_json::Value::Object(Default::default())),
            NodeType::AsyncMedia => PortValue::AsyncMedia(None),
            NodeType::AssignedLayer => PortValue::AssignedLayer(None),
            NodeType::Comparable => PortValue::Comparable(None),
            NodeType::ShapeCommand => PortValue::ShapeCommand(ShapeCommand::default()),
            NodeType::Anchoring => PortValue::Anchoring(Anchoring::default()),
            NodeType::BlendMode => PortValue::BlendMode(BlendMode::default()),
            NodeType::TextAlignment => PortValue::TextAlignment(TextAlignment::default()),
            NodeType::TextVerticalAlignment => {
                PortValue::TextVerticalAlignment(TextVerticalAlignment::default())
            }
            NodeType::DelayStyle => PortValue::DelayStyle(DelayStyle::default()),
            NodeType::LightType => PortValue::LightType(LightType::default()),
            NodeType::AnimationCurve => PortValue::AnimationCurve(AnimationCurve::default()),
            NodeType::FitStyle => PortValue::FitStyle(FitStyle::default()),
            NodeType::ShapeCoordinates => PortValue::ShapeCoordinates(ShapeCoordinates::default()),
            NodeType::NetworkRequestType => {
                PortValue::NetworkRequestType(NetworkRequestType::default())
            }
            NodeType::Orientation => PortValue::Orientation(Orientation::default()),
            NodeType::LayerStroke => PortValue::LayerStroke(LayerStroke::default()),
            NodeType::None => PortValue::None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NodeType::Number => "Number",
            NodeType::Int => "Int",
            NodeType::String => "String",
            NodeType::Bool => "Bool",
            NodeType::Color => "Color",
            NodeType::Size => "Size",
            NodeType::Position => "Position",
            NodeType::Point3D => "3D Point",
            NodeType::Point4D => "4D Point",
            NodeType::Transform => "Transform",
            NodeType::Pulse => "Pulse",
            NodeType::Json => "JSON",
            NodeType::AsyncMedia => "Media",
            NodeType::AssignedLayer => "Layer",
            NodeType::Comparable => "Comparable",
            NodeType::ShapeCommand => "Shape Command",
            NodeType::Anchoring => "Anchoring",
            NodeType::BlendMode => "Blend Mode",
            NodeType::TextAlignment => "Text Alignment",
            NodeType::TextVerticalAlignment => "Text Vertical Alignment",
            NodeType::DelayStyle => "Delay Style",
            NodeType::LightType => "Light Type",
            NodeType::AnimationCurve => "Animation Curve",
            NodeType::FitStyle => "Fit Style",
            NodeType::ShapeCoordinates => "Shape Coordinates",
            NodeType::NetworkRequestType => "Network Request Type",
            NodeType::Orientation => "Orientation",
            NodeType::LayerStroke => "Layer Stroke",
            NodeType::None => "None",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl PortValue {
    pub fn node_type(&self) -> NodeType {
        match self {
            PortValue::Number(_) => NodeType::Number,
            PortValue::Int(_) => NodeType::Int,
            PortValue::String(_) => NodeType::String,
            PortValue::Bool(_) => NodeType::Bool,
            PortValue::Color(_) => NodeType::Color,
            PortValue::Size(_) => NodeType::Size,
            PortValue::Position(_) => NodeType::Position,
            PortValue::Point3D(_) => NodeType::Point3D,
            PortValue::Point4D(_) => NodeType::Point4D,
            PortValue::Transform(_) => NodeType::Transform,
            PortValue::Pulse(_) => NodeType::Pulse,
            PortValue::Json(_) => NodeType::Json,
            PortValue::AsyncMedia(_) => NodeType::AsyncMedia,
            PortValue::AssignedLayer(_) => NodeType::AssignedLayer,
            PortValue::Comparable(_) => NodeType::Comparable,
            PortValue::ShapeCommand(_) => NodeType::ShapeCommand,
            PortValue::Anchoring(_) => NodeType::Anchoring,
            PortValue::BlendMode(_) => NodeType::BlendMode,
            PortValue::TextAlignment(_) => NodeType::TextAlignment,
            PortValue::TextVerticalAlignment(_) => NodeType::TextVerticalAlignment,
            PortValue::DelayStyle(_) => NodeType::DelayStyle,
            PortValue::LightType(_) => NodeType::LightType,
            PortValue::AnimationCurve(_) => NodeType::AnimationCurve,
            PortValue::FitStyle(_) => NodeType::FitStyle,
            PortValue::ShapeCoordinates(_) => NodeType::ShapeCoordinates,
            PortValue::NetworkRequestType(_) => NodeType::NetworkRequestType,
            PortValue::Orientation(_) => NodeType::Orientation,
            PortValue::LayerStroke(_) => NodeType::LayerStroke,
            PortValue::None => NodeType::None,
        }
    }
}
