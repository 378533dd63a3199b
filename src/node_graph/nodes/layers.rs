use super::*;
use crate::models::node_graph::PortId;
use crate::models::node_kind::LayerInputPort;
use crate::models::schema::InputDefinition;

use LayerInputPort as P;

const COMMON: &[LayerInputPort] = &[P::BlendMode, P::Anchoring, P::ZIndex];

fn ports(layer: Layer) -> Vec<LayerInputPort> {
    let specific: &[LayerInputPort] = match layer {
        Layer::Text => &[
            P::Text,
            P::Position,
            P::Size,
            P::Opacity,
            P::Color,
            P::FontSize,
            P::TextAlignment,
            P::VerticalAlignment,
        ],
        Layer::Rectangle => &[
            P::Position,
            P::Size,
            P::Opacity,
            P::Color,
            P::CornerRadius,
            P::StrokePosition,
            P::StrokeWidth,
            P::StrokeColor,
        ],
        Layer::Oval => &[
            P::Position,
            P::Size,
            P::Opacity,
            P::Color,
            P::StrokePosition,
            P::StrokeWidth,
            P::StrokeColor,
        ],
        Layer::Image => &[P::Image, P::Position, P::Size, P::Opacity, P::FitStyle],
        Layer::Group => &[P::Position, P::Size, P::Opacity, P::Orientation, P::Padding],
    };
    specific.iter().chain(COMMON).copied().collect()
}

pub(super) fn describe(layer: Layer) -> (&'static str, &'static str, &'static str) {
    match layer {
        Layer::Text => ("Text", "Draws a string.", "Layer"),
        Layer::Rectangle => ("Rectangle", "Draws a filled rectangle.", "Layer"),
        Layer::Oval => ("Oval", "Draws a filled ellipse.", "Layer"),
        Layer::Image => ("Image", "Draws imported media.", "Layer"),
        Layer::Group => ("Group", "Lays out child layers.", "Layer"),
    }
}

/// Layer rows are keyed by port name and never change type.
pub(super) fn row_definitions(layer: Layer) -> NodeRowDefinitions {
    NodeRowDefinitions {
        inputs: ports(layer)
            .into_iter()
            .map(|port| InputDefinition {
                port: PortId::Layer(port),
                label: port.label().to_string(),
                default_values: vec![port.default_value()],
                is_type_static: true,
                copies_upstream: false,
            })
            .collect(),
        outputs: Vec::new(),
    }
}
