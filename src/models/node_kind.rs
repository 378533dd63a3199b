use serde::{Deserialize, Serialize};
use std::fmt;

use super::enums::{Anchoring, BlendMode, FitStyle, LayerStroke, Orientation, TextAlignment, TextVerticalAlignment};
use super::values::{Color, LayerSize, PortValue, Position};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Patch {
    Value,
    Splitter,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Max,
    Min,
    Absolute,
    Round,
    Clip,
    Equals,
    GreaterThan,
    LessThan,
    Not,
    And,
    Or,
    OptionPicker,
    LoopSelect,
    LoopBuilder,
    LoopCount,
    Pack,
    Unpack,
    ColorToHex,
    HexToColor,
    Delay,
    Time,
    RepeatingPulse,
    Counter,
    PulseOnChange,
    ClassicAnimation,
    MediaImport,
}

impl Patch {
    pub const ALL: &'static [Patch] = &[
        Patch::Value,
        Patch::Splitter,
        Patch::Add,
        Patch::Subtract,
        Patch::Multiply,
        Patch::Divide,
        Patch::Modulo,
        Patch::Power,
        Patch::Max,
        Patch::Min,
        Patch::Absolute,
        Patch::Round,
        Patch::Clip,
        Patch::Equals,
        Patch::GreaterThan,
        Patch::LessThan,
        Patch::Not,
        Patch::And,
        Patch::Or,
        Patch::OptionPicker,
        Patch::LoopSelect,
        Patch::LoopBuilder,
        Patch::LoopCount,
        Patch::Pack,
        Patch::Unpack,
        Patch::ColorToHex,
        Patch::HexToColor,
        Patch::Delay,
        Patch::Time,
        Patch::RepeatingPulse,
        Patch::Counter,
        Patch::PulseOnChange,
        Patch::ClassicAnimation,
        Patch::MediaImport,
    ];
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Text,
    Rectangle,
    Oval,
    Image,
    Group,
}

impl Layer {
    pub const ALL: &'static [Layer] = &[
        Layer::Text,
        Layer::Rectangle,
        Layer::Oval,
        Layer::Image,
        Layer::Group,
    ];
}

/// Selects the row definitions and eval of a node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum NodeKind {
    Patch(Patch),
    Layer(Layer),
}

impl NodeKind {
    pub fn is_layer(&self) -> bool {
        matches!(self, NodeKind::Layer(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Patch(patch) => write!(f, "{patch:?}"),
            NodeKind::Layer(layer) => write!(f, "{layer:?} Layer"),
        }
    }
}

impl From<Patch> for NodeKind {
    fn from(patch: Patch) -> Self {
        NodeKind::Patch(patch)
    }
}

impl From<Layer> for NodeKind {
    fn from(layer: Layer) -> Self {
        NodeKind::Layer(layer)
    }
}

/// Named inputs on layer nodes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum LayerInputPort {
    Position,
    Size,
    Opacity,
    Scale,
    Anchoring,
    ZIndex,
    BlendMode,
    Color,
    Text,
    FontSize,
    TextAlignment,
    VerticalAlignment,
    CornerRadius,
    StrokePosition,
    StrokeWidth,
    StrokeColor,
    Image,
    FitStyle,
    Orientation,
    Padding,
}

impl LayerInputPort {
    pub fn label(&self) -> &'static str {
        match self {
            LayerInputPort::Position => "Position",
            LayerInputPort::Size => "Size",
            LayerInputPort::Opacity => "Opacity",
            LayerInputPort::Scale => "Scale",
            LayerInputPort::Anchoring => "Anchoring",
            LayerInputPort::ZIndex => "Z Index",
            LayerInputPort::BlendMode => "Blend Mode",
            LayerInputPort::Color => "Color",
            LayerInputPort::Text => "Text",
            LayerInputPort::FontSize => "Font Size",
            LayerInputPort::TextAlignment => "Alignment",
            LayerInputPort::VerticalAlignment => "Vertical Alignment",
            LayerInputPort::CornerRadius => "Corner Radius",
            LayerInputPort::StrokePosition => "Stroke Position",
            LayerInputPort::StrokeWidth => "Stroke Width",
            LayerInputPort::StrokeColor => "Stroke Color",
            LayerInputPort::Image => "Image",
            LayerInputPort::FitStyle => "Fit Style",
            LayerInputPort::Orientation => "Orientation",
            LayerInputPort::Padding => "Padding",
        }
    }

    pub fn default_value(&self) -> PortValue {
        match self {
            LayerInputPort::Position => PortValue::Position(Position::default()),
            LayerInputPort::Size => PortValue::Size(LayerSize::new(100.0, 100.0)),
            LayerInputPort::Opacity | LayerInputPort::Scale => PortValue::Number(1.0),
            LayerInputPort::Anchoring => PortValue::Anchoring(Anchoring::TopLeft),
            LayerInputPort::ZIndex
            | LayerInputPort::CornerRadius
            | LayerInputPort::Padding => PortValue::Number(0.0),
            LayerInputPort::StrokeWidth => PortValue::Number(4.0),
            LayerInputPort::BlendMode => PortValue::BlendMode(BlendMode::Normal),
            LayerInputPort::Color => PortValue::Color(Color::new(0.0, 0.0, 0.0, 1.0)),
            LayerInputPort::StrokeColor => PortValue::Color(Color::new(0.0, 0.0, 0.0, 1.0)),
            LayerInputPort::Text => PortValue::String("Text".to_string()),
            LayerInputPort::FontSize => PortValue::Number(36.0),
            LayerInputPort::TextAlignment => PortValue::TextAlignment(TextAlignment::Left),
            LayerInputPort::VerticalAlignment => {
                PortValue::TextVerticalAlignment(TextVerticalAlignment::Top)
            }
            LayerInputPort::StrokePosition => PortValue::LayerStroke(LayerStroke::None),
            LayerInputPort::Image => PortValue::AsyncMedia(None),
            LayerInputPort::FitStyle => PortValue::FitStyle(FitStyle::Fit),
            LayerInputPort::Orientation => PortValue::Orientation(Orientation::None),
        }
    }
}
